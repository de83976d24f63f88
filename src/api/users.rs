use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;

use super::{ApiClient, ApiError, ADMIN_HEADER};
use crate::models::{LoginResponse, Role, User};

/// Body of `POST /users`. The password only ever travels outward.
#[derive(Serialize)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

#[derive(Serialize, Default)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl ApiClient {
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, ApiError> {
        let request = self
            .request(Method::POST, "/users/login")
            .json(&json!({ "email": email, "password": password.expose_secret() }));
        let response: LoginResponse = self.send_json("users.login", request).await?;
        Ok(response.user)
    }

    pub async fn list_users(&self, admin_id: &str) -> Result<Vec<User>, ApiError> {
        let request = self
            .request(Method::GET, "/users")
            .header(ADMIN_HEADER, admin_id);
        self.send_json("users.list", request).await
    }

    pub async fn create_user(&self, user: &NewUser<'_>, admin_id: &str) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "/users")
            .header(ADMIN_HEADER, admin_id)
            .json(user);
        self.send_discarding("users.create", request).await
    }

    pub async fn update_user(
        &self,
        id: &str,
        update: &UserUpdate,
        admin_id: &str,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PUT, &format!("/users/{id}"))
            .header(ADMIN_HEADER, admin_id)
            .json(update);
        self.send_discarding("users.update", request).await
    }

    pub async fn delete_user(&self, id: &str, admin_id: &str) -> Result<(), ApiError> {
        let request = self
            .request(Method::DELETE, &format!("/users/{id}"))
            .header(ADMIN_HEADER, admin_id);
        self.send_discarding("users.delete", request).await
    }
}
