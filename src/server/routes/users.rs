use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use secrecy::SecretString;
use serde::Deserialize;

use crate::forms::user::{self, UserDraft};
use crate::forms::FormError;
use crate::models::{Role, User};
use crate::server::app::AppState;
use crate::session::Session;
use crate::toast::Toasts;

use super::{flash_redirect, Chrome, Operator};

#[derive(Deserialize)]
struct UserForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    password: SecretString,
    #[serde(default)]
    role: Role,
}

#[derive(Template, WebTemplate)]
#[template(path = "users/list.html")]
struct UsersPage {
    chrome: Chrome,
    users: Vec<User>,
    username: String,
    email: String,
    admin_role: bool,
    errors: Vec<String>,
}

async fn users_page(
    state: &AppState,
    operator: Session,
    draft: Option<&UserDraft>,
    errors: Vec<String>,
) -> Response {
    let mut toasts = Toasts::default();
    let users = match user::list_users(&state.api, Some(&operator), &mut toasts).await {
        Ok(users) => users,
        Err(FormError::Unauthorized(_)) => {
            return flash_redirect(state, toasts, "/dashboard").await.into_response();
        }
        Err(err) => {
            tracing::error!(error = %err, "Cannot load users");
            Vec::new()
        }
    };
    state.flash(toasts).await;
    UsersPage {
        chrome: Chrome::new(state, operator, "users").await,
        users,
        username: draft.map(|d| d.username.clone()).unwrap_or_default(),
        email: draft.map(|d| d.email.clone()).unwrap_or_default(),
        admin_role: draft.is_some_and(|d| d.role == Role::Admin),
        errors,
    }
    .into_response()
}

async fn get_users(State(state): State<AppState>, Operator(operator): Operator) -> Response {
    users_page(&state, operator, None, Vec::new()).await
}

async fn create_user(
    State(state): State<AppState>,
    Operator(operator): Operator,
    Form(form): Form<UserForm>,
) -> Response {
    let draft = UserDraft {
        username: form.username,
        email: form.email,
        password: form.password,
        role: form.role,
    };
    let mut toasts = Toasts::default();
    match user::create_user(&state.api, Some(&operator), &draft, &mut toasts).await {
        Ok(()) => flash_redirect(&state, toasts, "/users").await.into_response(),
        Err(FormError::Unauthorized(_)) => flash_redirect(&state, toasts, "/dashboard").await.into_response(),
        Err(FormError::Invalid(errors)) => {
            // shown next to the form instead of as toasts
            users_page(&state, operator, Some(&draft), errors.messages().to_vec()).await
        }
        Err(FormError::Backend(_)) => {
            state.flash(toasts).await;
            users_page(&state, operator, Some(&draft), Vec::new()).await
        }
    }
}

async fn delete_user(
    State(state): State<AppState>,
    Operator(operator): Operator,
    Path(id): Path<String>,
) -> Response {
    let mut toasts = Toasts::default();
    let to = match user::delete_user(&state.api, Some(&operator), &id, &mut toasts).await {
        Err(FormError::Unauthorized(_)) => "/dashboard",
        _ => "/users",
    };
    flash_redirect(&state, toasts, to).await.into_response()
}

pub fn users_router(state: AppState) -> Router {
    Router::new()
        .route("/users", get(get_users))
        .route("/users/new", post(create_user))
        .route("/users/{id}/delete", post(delete_user))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, get};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::super::test_support::{get as get_page, post_form, state};
    use crate::testing::{admin_session, user_session, FakeBackend};

    async fn backend() -> FakeBackend {
        FakeBackend::start(
            Router::new()
                .route(
                    "/api/users",
                    get(|headers: HeaderMap| async move {
                        if headers.get("x-admin-id").is_none() {
                            return Err(StatusCode::FORBIDDEN);
                        }
                        Ok(Json(json!([
                            {"_id": "admin-1", "username": "granny", "email": "admin@quizgranny.com", "role": "admin"},
                            {"_id": "user-7", "username": "ann", "email": "ann@quizgranny.com", "role": "user"}
                        ])))
                    })
                    .post(|Json(body): Json<Value>| async move {
                        if body["email"] == "ann@quizgranny.com" {
                            Err((StatusCode::CONFLICT, Json(json!({"message": "User already exists"}))))
                        } else {
                            Ok(Json(json!({"message": "created"})))
                        }
                    }),
                )
                .route("/api/users/{id}", delete(|| async { StatusCode::NO_CONTENT })),
        )
        .await
    }

    #[tokio::test]
    async fn admin_sees_the_user_table() {
        let backend = backend().await;
        let state = state(&backend.url(), Some(admin_session()), true);
        let (status, _, body) = get_page(&state, "/users").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ann@quizgranny.com"));
    }

    #[tokio::test]
    async fn regular_user_is_sent_back_to_dashboard() {
        let backend = backend().await;
        let state = state(&backend.url(), Some(user_session()), true);
        let (status, location, _) = get_page(&state, "/users").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/dashboard"));
        assert_eq!(state.toasts.lock().await.drain()[0].message, "Admin authentication required");
    }

    #[tokio::test]
    async fn short_password_rerenders_form() {
        let backend = backend().await;
        let state = state(&backend.url(), Some(admin_session()), true);
        let (status, _, body) =
            post_form(&state, "/users/new", "username=bob&email=bob%40x.io&password=123&role=admin").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Password must be at least 6 characters"));
        assert!(body.contains("value=\"bob@x.io\""));
        assert!(!body.contains("value=\"123\""));
    }

    #[tokio::test]
    async fn create_and_delete() {
        let backend = backend().await;
        let state = state(&backend.url(), Some(admin_session()), true);

        let (_, location, _) =
            post_form(&state, "/users/new", "username=bob&email=bob%40x.io&password=secret1&role=user").await;
        assert_eq!(location.as_deref(), Some("/users"));

        let (_, _, body) =
            post_form(&state, "/users/new", "username=ann&email=ann%40quizgranny.com&password=secret1").await;
        assert!(body.contains("User already exists"));

        let (_, location, _) = post_form(&state, "/users/user-7/delete", "").await;
        assert_eq!(location.as_deref(), Some("/users"));
        let toasts = state.toasts.lock().await.drain();
        assert_eq!(toasts.last().unwrap().message, "User deleted successfully!");
    }
}
