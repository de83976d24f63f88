use super::{FormError, ValidationErrors};
use crate::api::ApiClient;
use crate::models::Category;
use crate::toast::Toasts;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
}

impl CategoryDraft {
    pub fn from_category(category: &Category) -> Self {
        CategoryDraft {
            name: category.name.clone(),
        }
    }

    pub fn validate(&self) -> Result<&str, ValidationErrors> {
        let name = self.name.trim();
        if name.is_empty() {
            let mut errors = ValidationErrors::default();
            errors.push("Category name is required");
            return Err(errors);
        }
        Ok(name)
    }
}

fn invalid(toasts: &mut Toasts, errors: ValidationErrors) -> FormError {
    toasts.error(errors.to_string());
    errors.into()
}

pub async fn create_category(
    api: &ApiClient,
    draft: &CategoryDraft,
    toasts: &mut Toasts,
) -> Result<Category, FormError> {
    let name = draft.validate().map_err(|e| invalid(toasts, e))?;
    match api.create_category(name).await {
        Ok(category) => {
            tracing::info!(category = %category.name, "Category created");
            toasts.success("Category created successfully!");
            Ok(category)
        }
        Err(err) => {
            // duplicate names come back as a 4xx with the reason in the body
            toasts.error(err.message_or("Failed to create category. Please try again."));
            Err(err.into())
        }
    }
}

pub async fn update_category(
    api: &ApiClient,
    id: &str,
    draft: &CategoryDraft,
    toasts: &mut Toasts,
) -> Result<Category, FormError> {
    let name = draft.validate().map_err(|e| invalid(toasts, e))?;
    match api.update_category(id, name).await {
        Ok(category) => {
            toasts.success("Category updated successfully!");
            Ok(category)
        }
        Err(err) => {
            toasts.error(err.message_or("Failed to update category. Please try again."));
            Err(err.into())
        }
    }
}

pub async fn delete_category(api: &ApiClient, id: &str, toasts: &mut Toasts) -> bool {
    match api.delete_category(id).await {
        Ok(()) => {
            tracing::info!(category_id = id, "Category deleted");
            toasts.success("Category deleted successfully!");
            true
        }
        Err(err) => {
            toasts.error(err.message_or("Failed to delete category. Please try again."));
            false
        }
    }
}
