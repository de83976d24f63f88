use secrecy::{ExposeSecret, SecretString};

use super::{FormError, ValidationErrors};
use crate::api::{ApiClient, NewUser};
use crate::models::{Role, User};
use crate::session::Session;
use crate::toast::Toasts;

pub const MIN_PASSWORD_LEN: usize = 6;
const ADMIN_REQUIRED: &str = "Admin authentication required";

#[derive(Debug)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub role: Role,
}

impl UserDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.username.trim().is_empty() {
            errors.push("Username is required");
        }
        if self.email.trim().is_empty() {
            errors.push("Email is required");
        }
        let password = self.password.expose_secret().trim();
        if password.is_empty() {
            errors.push("Password is required");
        } else if password.chars().count() < MIN_PASSWORD_LEN {
            errors.push("Password must be at least 6 characters");
        }
        errors.into_result()
    }
}

fn admin_id<'a>(session: Option<&'a Session>, toasts: &mut Toasts) -> Result<&'a str, FormError> {
    match session {
        Some(session) if session.is_admin() => Ok(&session.id),
        _ => {
            toasts.error(ADMIN_REQUIRED);
            Err(FormError::Unauthorized(ADMIN_REQUIRED))
        }
    }
}

pub async fn list_users(
    api: &ApiClient,
    session: Option<&Session>,
    toasts: &mut Toasts,
) -> Result<Vec<User>, FormError> {
    let admin = admin_id(session, toasts)?;
    api.list_users(admin).await.map_err(|err| {
        toasts.error("Failed to load users. Please try again.");
        err.into()
    })
}

pub async fn create_user(
    api: &ApiClient,
    session: Option<&Session>,
    draft: &UserDraft,
    toasts: &mut Toasts,
) -> Result<(), FormError> {
    if let Err(errors) = draft.validate() {
        for message in errors.messages() {
            toasts.error(message.clone());
        }
        return Err(errors.into());
    }
    let admin = admin_id(session, toasts)?;
    let new_user = NewUser {
        username: draft.username.trim(),
        email: draft.email.trim(),
        password: draft.password.expose_secret().trim(),
        role: draft.role,
    };
    match api.create_user(&new_user, admin).await {
        Ok(()) => {
            tracing::info!(username = new_user.username, role = %new_user.role, "User created");
            toasts.success("User created successfully!");
            Ok(())
        }
        Err(err) => {
            toasts.error(err.message_or("Failed to create user. Please try again."));
            Err(err.into())
        }
    }
}

pub async fn delete_user(
    api: &ApiClient,
    session: Option<&Session>,
    id: &str,
    toasts: &mut Toasts,
) -> Result<(), FormError> {
    let admin = admin_id(session, toasts)?;
    match api.delete_user(id, admin).await {
        Ok(()) => {
            tracing::info!(user_id = id, "User deleted");
            toasts.success("User deleted successfully!");
            Ok(())
        }
        Err(err) => {
            toasts.error(err.message_or("Failed to delete user. Please try again."));
            Err(err.into())
        }
    }
}
