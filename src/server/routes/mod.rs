mod auth;
mod categories;
mod demo;
mod questions;
mod users;

pub use auth::auth_router;
pub use categories::category_router;
pub use demo::demo_router;
pub use questions::questions_router;
pub use users::users_router;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_typed_multipart::FieldData;
use tempfile::NamedTempFile;

use crate::api::ApiError;
use crate::forms::ImageUpload;
use crate::session::{Session, StoreError};
use crate::toast::{Toast, Toasts};

use super::app::AppState;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Backend(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("reading upload failed: {0}")]
    Upload(#[from] std::io::Error),
    #[error("metrics encoding failed: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("building response failed: {0}")]
    Http(#[from] axum::http::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        let status = match &self {
            AppError::Backend(ApiError::Backend { status, .. }) if *status == StatusCode::NOT_FOUND => {
                StatusCode::NOT_FOUND
            }
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

pub type PageResult<T> = Result<T, AppError>;

/// The logged-in operator. Requests without a session go back to the login page.
pub struct Operator(pub Session);

impl FromRequestParts<AppState> for Operator {
    type Rejection = Redirect;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.store.session().map(Operator).ok_or_else(|| Redirect::to("/"))
    }
}

/// Navigation and notifications shared by every page behind the login.
pub struct Chrome {
    pub operator: Session,
    pub toasts: Vec<Toast>,
    pub active: &'static str,
}

impl Chrome {
    pub async fn new(state: &AppState, operator: Session, active: &'static str) -> Self {
        Chrome {
            operator,
            toasts: state.toasts.lock().await.drain(),
            active,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.operator.is_admin()
    }
}

pub async fn flash_redirect(state: &AppState, toasts: Toasts, to: &str) -> Redirect {
    state.flash(toasts).await;
    Redirect::to(to)
}

/// Where to send the browser after a row action. Only pages of this console qualify.
pub fn back_to(return_to: Option<&str>, fallback: &'static str) -> String {
    match return_to {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_owned(),
        _ => fallback.to_owned(),
    }
}

/// Browsers submit untouched file inputs as an empty part with an empty name.
pub async fn read_upload(field: FieldData<NamedTempFile>) -> Result<Option<ImageUpload>, std::io::Error> {
    let file_name = field.metadata.file_name.unwrap_or_default();
    if file_name.is_empty() {
        return Ok(None);
    }
    let bytes = tokio::fs::read(field.contents.path()).await?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(ImageUpload {
        file_name,
        content_type: field.metadata.content_type,
        bytes,
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use tokio::sync::watch;
    use tower::ServiceExt;

    use crate::config::{HealthSettings, ImportSettings, Settings};
    use crate::health::{GateState, GateStatus};
    use crate::server::app::{router, AppState};
    use crate::session::{LocalStore, Session};

    pub fn settings(backend_url: &str) -> Settings {
        Settings {
            backend_url: backend_url.to_owned(),
            listen_addr: "127.0.0.1:0".into(),
            static_dir: "static".into(),
            storage_path: "unused.json".into(),
            page_size: 20,
            request_timeout_secs: 5,
            health: HealthSettings::default(),
            import: ImportSettings {
                tick_ms: 5,
                step: 10,
                hold_ms: 0,
            },
        }
    }

    pub fn state(backend_url: &str, session: Option<Session>, ready: bool) -> AppState {
        let store = LocalStore::in_memory();
        if let Some(session) = session {
            store.save_session(&session).unwrap();
        }
        let status = if ready {
            GateStatus {
                state: GateState::Ready,
                message: crate::health::READY,
            }
        } else {
            GateStatus::default()
        };
        let (_tx, gate) = watch::channel(status);
        AppState::new(settings(backend_url), store, gate).unwrap()
    }

    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, location, String::from_utf8_lossy(&body).into_owned())
    }

    pub async fn get(state: &AppState, uri: &str) -> (StatusCode, Option<String>, String) {
        send(
            router(state.clone()),
            Request::get(uri).body(Body::empty()).unwrap(),
        )
        .await
    }

    pub async fn post_form(state: &AppState, uri: &str, form: &str) -> (StatusCode, Option<String>, String) {
        send(
            router(state.clone()),
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_owned()))
                .unwrap(),
        )
        .await
    }

    pub const BOUNDARY: &str = "quizgrannyboundary";

    /// Builds a multipart body from `(name, file name, value)` triples.
    pub fn multipart(fields: &[(&str, Option<&str>, &str)]) -> Body {
        let mut body = String::new();
        for (name, file_name, value) in fields {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )),
                None => body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")),
            }
            body.push_str(value);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Body::from(body)
    }

    pub async fn post_multipart(
        state: &AppState,
        uri: &str,
        fields: &[(&str, Option<&str>, &str)],
    ) -> (StatusCode, Option<String>, String) {
        send(
            router(state.clone()),
            Request::post(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(multipart(fields))
                .unwrap(),
        )
        .await
    }
}
