use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::{ApiClient, ApiError};
use crate::models::Category;

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryEnvelope {
    Wrapped { category: Category },
    Bare(Category),
}

impl From<CategoryEnvelope> for Category {
    fn from(envelope: CategoryEnvelope) -> Self {
        match envelope {
            CategoryEnvelope::Wrapped { category } => category,
            CategoryEnvelope::Bare(category) => category,
        }
    }
}

impl ApiClient {
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.send_json("categories.list", self.request(Method::GET, "/categories"))
            .await
    }

    pub async fn get_category(&self, id: &str) -> Result<Category, ApiError> {
        let envelope: CategoryEnvelope = self
            .send_json(
                "categories.get",
                self.request(Method::GET, &format!("/categories/{id}")),
            )
            .await?;
        Ok(envelope.into())
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, ApiError> {
        let request = self
            .request(Method::POST, "/categories")
            .json(&json!({ "name": name }));
        let envelope: CategoryEnvelope = self.send_json("categories.create", request).await?;
        Ok(envelope.into())
    }

    pub async fn update_category(&self, id: &str, name: &str) -> Result<Category, ApiError> {
        let request = self
            .request(Method::PUT, &format!("/categories/{id}"))
            .json(&json!({ "name": name }));
        let envelope: CategoryEnvelope = self.send_json("categories.update", request).await?;
        Ok(envelope.into())
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        self.send_discarding(
            "categories.delete",
            self.request(Method::DELETE, &format!("/categories/{id}")),
        )
        .await
    }
}
