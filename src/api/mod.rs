//! Thin client for the quiz backend REST API.
//!
//! Every call goes through [`ApiClient::send`], which counts the request in
//! `backend_requests_total` and turns non-2xx answers into [`ApiError::Backend`]
//! carrying the message the backend put in its `{error}` / `{message}` body.

mod categories;
mod health;
mod questions;
mod users;

pub use users::{NewUser, UserUpdate};

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::telemetry::BACKEND_REQUESTS;

pub const ADMIN_HEADER: &str = "x-admin-id";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend answered {status}: {}", message.as_deref().unwrap_or("no details"))]
    Backend {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("cannot build backend URL from {0}")]
    Url(String),
}

impl ApiError {
    /// Message to show the operator: the backend's own text if it sent one.
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            ApiError::Backend {
                message: Some(message),
                ..
            } => message,
            _ => fallback,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Request body: the backend takes either plain JSON or multipart, never a mix.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Multipart(Vec<FormPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormPart {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        FormPart {
            name: name.into(),
            value: PartValue::File {
                file_name: file_name.into(),
                content_type,
                bytes,
            },
        }
    }
}

impl Payload {
    pub fn is_multipart(&self) -> bool {
        matches!(self, Payload::Multipart(_))
    }

    /// Text value of a multipart field, mostly useful for inspecting payloads.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        match self {
            Payload::Multipart(parts) => parts.iter().find_map(|p| match &p.value {
                PartValue::Text(v) if p.name == name => Some(v.as_str()),
                _ => None,
            }),
            Payload::Json(_) => None,
        }
    }

    fn attach(self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        match self {
            Payload::Json(body) => Ok(request.json(&body)),
            Payload::Multipart(parts) => {
                let mut form = Form::new();
                for part in parts {
                    form = match part.value {
                        PartValue::Text(value) => form.text(part.name, value),
                        PartValue::File {
                            file_name,
                            content_type,
                            bytes,
                        } => {
                            let mut file = Part::bytes(bytes).file_name(file_name);
                            if let Some(content_type) = content_type {
                                file = file.mime_str(&content_type)?;
                            }
                            form.part(part.name, file)
                        }
                    };
                }
                Ok(request.multipart(form))
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.api_url(path))
    }

    /// Like [`ApiClient::request`], for paths carrying free text: each segment
    /// is percent-encoded on its own.
    fn request_segments(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let mut url = Url::parse(&self.api_url("")).map_err(|_| ApiError::Url(self.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(self.http.request(method, url))
    }

    async fn send(&self, endpoint: &'static str, request: RequestBuilder) -> Result<Response, ApiError> {
        let result = match request.send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => {
                let status = response.status();
                let message = response
                    .json::<ErrorBody>()
                    .await
                    .ok()
                    .and_then(|body| body.error.or(body.message));
                Err(ApiError::Backend { status, message })
            }
            Err(err) => Err(ApiError::Transport(err)),
        };
        let outcome = if result.is_ok() { "ok" } else { "error" };
        BACKEND_REQUESTS
            .with_label_values(&[endpoint, outcome])
            .inc();
        if let Err(err) = &result {
            tracing::error!(endpoint, error = %err, "Backend request failed");
        }
        result
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        Ok(self.send(endpoint, request).await?.json::<T>().await?)
    }

    async fn send_payload<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
        payload: Payload,
    ) -> Result<T, ApiError> {
        tracing::debug!(endpoint, multipart = payload.is_multipart(), "Sending payload");
        let request = payload.attach(request)?;
        self.send_json(endpoint, request).await
    }

    async fn send_discarding(&self, endpoint: &'static str, request: RequestBuilder) -> Result<(), ApiError> {
        self.send(endpoint, request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    #[tokio::test]
    async fn backend_error_message_is_surfaced() {
        let backend = FakeBackend::start(Router::new().route(
            "/api/categories",
            get(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({"error": "Category already exists"})),
                )
            }),
        ))
        .await;
        let err = backend.client().list_categories().await.unwrap_err();
        assert_eq!(err.message_or("fallback"), "Category already exists");
        assert!(matches!(err, ApiError::Backend { status, .. } if status == StatusCode::CONFLICT));
    }

    #[tokio::test]
    async fn missing_error_body_falls_back() {
        let backend = FakeBackend::start(Router::new().route(
            "/api/categories",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        let err = backend.client().list_categories().await.unwrap_err();
        assert_eq!(err.message_or("Failed to load categories"), "Failed to load categories");
    }

    #[test]
    fn text_field_reads_multipart_parts() {
        let payload = Payload::Multipart(vec![
            FormPart::text("titleText", "Capital of France?"),
            FormPart::file("titleImage", "map.png", None, vec![1, 2]),
        ]);
        assert_eq!(payload.text_field("titleText"), Some("Capital of France?"));
        assert_eq!(payload.text_field("titleImage"), None);
        assert!(payload.is_multipart());
    }
}
