use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::forms::category::{self, CategoryDraft};
use crate::models::Category;
use crate::server::app::AppState;
use crate::toast::Toasts;

use super::{flash_redirect, Chrome, Operator, PageResult};

#[derive(Deserialize)]
struct CategoryForm {
    #[serde(default)]
    name: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/list.html")]
struct CategoriesPage {
    chrome: Chrome,
    categories: Vec<Category>,
    name: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/edit.html")]
struct CategoryEditPage {
    chrome: Chrome,
    id: String,
    name: String,
}

/// Keeps the question list's category lookup in step with what was just changed.
async fn sync_categories(state: &AppState, change: impl FnOnce(&mut Vec<Category>)) {
    let mut list = state.questions.lock().await;
    let mut categories = list.categories().to_vec();
    change(&mut categories);
    list.set_categories(categories);
}

async fn categories_page(state: &AppState, operator: crate::session::Session, name: String) -> CategoriesPage {
    let mut toasts = Toasts::default();
    let categories = match state.api.list_categories().await {
        Ok(categories) => {
            state.questions.lock().await.set_categories(categories.clone());
            categories
        }
        Err(err) => {
            tracing::error!(error = %err, "Cannot load categories");
            toasts.error(err.message_or("Failed to load categories"));
            Vec::new()
        }
    };
    state.flash(toasts).await;
    CategoriesPage {
        chrome: Chrome::new(state, operator, "categories").await,
        categories,
        name,
    }
}

async fn get_categories(State(state): State<AppState>, Operator(operator): Operator) -> CategoriesPage {
    categories_page(&state, operator, String::new()).await
}

async fn create_category(
    State(state): State<AppState>,
    Operator(operator): Operator,
    Form(form): Form<CategoryForm>,
) -> Response {
    let mut toasts = Toasts::default();
    let draft = CategoryDraft { name: form.name };
    match category::create_category(&state.api, &draft, &mut toasts).await {
        Ok(created) => {
            sync_categories(&state, |categories| categories.push(created)).await;
            flash_redirect(&state, toasts, "/categories").await.into_response()
        }
        Err(_) => {
            state.flash(toasts).await;
            categories_page(&state, operator, draft.name).await.into_response()
        }
    }
}

async fn edit_category(
    State(state): State<AppState>,
    Operator(operator): Operator,
    Path(id): Path<String>,
) -> PageResult<CategoryEditPage> {
    let category = state.api.get_category(&id).await?;
    Ok(CategoryEditPage {
        chrome: Chrome::new(&state, operator, "categories").await,
        name: CategoryDraft::from_category(&category).name,
        id,
    })
}

async fn update_category(
    State(state): State<AppState>,
    Operator(operator): Operator,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let mut toasts = Toasts::default();
    let draft = CategoryDraft { name: form.name };
    match category::update_category(&state.api, &id, &draft, &mut toasts).await {
        Ok(updated) => {
            sync_categories(&state, |categories| {
                if let Some(slot) = categories.iter_mut().find(|c| c.id == updated.id) {
                    *slot = updated;
                }
            })
            .await;
            flash_redirect(&state, toasts, "/categories").await.into_response()
        }
        Err(_) => {
            state.flash(toasts).await;
            CategoryEditPage {
                chrome: Chrome::new(&state, operator, "categories").await,
                id,
                name: draft.name,
            }
            .into_response()
        }
    }
}

async fn delete_category(
    State(state): State<AppState>,
    Operator(_): Operator,
    Path(id): Path<String>,
) -> Response {
    let mut toasts = Toasts::default();
    if category::delete_category(&state.api, &id, &mut toasts).await {
        sync_categories(&state, |categories| categories.retain(|c| c.id != id)).await;
    }
    flash_redirect(&state, toasts, "/categories").await.into_response()
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/new", post(create_category))
        .route("/categories/{id}/edit", get(edit_category).post(update_category))
        .route("/categories/{id}/delete", post(delete_category))
        .with_state(state)
}
