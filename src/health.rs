//! Startup gate: the console keeps showing a loading screen until the backend
//! answers `GET /health` with `{"status": "ok"}`.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::api::ApiClient;
use crate::config::HealthSettings;

pub const LOADING: &str = "Loading Quiz Granny...";
pub const GETTING_READY: &str = "Getting things ready";
pub const PREPARING: &str = "Preparing your dashboard";
pub const READY: &str = "Almost ready!";
pub const GAVE_UP: &str = "Taking longer than expected. Please refresh the page.";

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GateState {
    Waiting,
    Ready,
    Failed,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateStatus {
    pub state: GateState,
    pub message: &'static str,
}

impl Default for GateStatus {
    fn default() -> Self {
        GateStatus {
            state: GateState::Waiting,
            message: LOADING,
        }
    }
}

impl GateStatus {
    pub fn is_ready(&self) -> bool {
        self.state == GateState::Ready
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateError {
    #[error("backend not healthy after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

pub fn waiting_message(elapsed: Duration) -> &'static str {
    if elapsed > Duration::from_secs(30) {
        PREPARING
    } else if elapsed > Duration::from_secs(15) {
        GETTING_READY
    } else {
        LOADING
    }
}

/// Polls until healthy or out of attempts, publishing progress on `status`.
pub async fn wait_for_backend(
    api: &ApiClient,
    settings: &HealthSettings,
    status: &watch::Sender<GateStatus>,
) -> Result<(), GateError> {
    let started = Instant::now();
    let attempts = settings.max_attempts.max(1);
    for attempt in 1..=attempts {
        match tokio::time::timeout(settings.timeout(), api.health()).await {
            Ok(Ok(health)) if health.status == "ok" => {
                tracing::info!(attempt, elapsed = ?started.elapsed(), "Backend is healthy");
                status.send_replace(GateStatus {
                    state: GateState::Ready,
                    message: READY,
                });
                return Ok(());
            }
            Ok(Ok(health)) => {
                tracing::warn!(attempt, status = %health.status, "Backend reports not ready")
            }
            Ok(Err(err)) => tracing::warn!(attempt, error = %err, "Health check failed"),
            Err(_) => tracing::warn!(attempt, "Health check timed out"),
        }
        if attempt < attempts {
            tokio::time::sleep(settings.interval()).await;
            status.send_replace(GateStatus {
                state: GateState::Waiting,
                message: waiting_message(started.elapsed()),
            });
        }
    }
    tracing::error!(attempts, "Giving up on backend health");
    status.send_replace(GateStatus {
        state: GateState::Failed,
        message: GAVE_UP,
    });
    Err(GateError::Exhausted { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick(max_attempts: u32) -> HealthSettings {
        HealthSettings {
            interval_ms: 5,
            timeout_ms: 500,
            max_attempts,
        }
    }

    #[test]
    fn message_follows_elapsed_time() {
        assert_eq!(waiting_message(Duration::from_secs(3)), LOADING);
        assert_eq!(waiting_message(Duration::from_secs(16)), GETTING_READY);
        assert_eq!(waiting_message(Duration::from_secs(31)), PREPARING);
    }

    #[tokio::test]
    async fn ready_after_backend_warms_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let backend = FakeBackend::start(Router::new().route(
            "/health",
            get(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(StatusCode::SERVICE_UNAVAILABLE)
                    } else {
                        Ok(Json(json!({"status": "ok"})))
                    }
                }
            }),
        ))
        .await;
        let (status, rx) = watch::channel(GateStatus::default());
        wait_for_backend(&backend.client(), &quick(10), &status).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(rx.borrow().is_ready());
        assert_eq!(rx.borrow().message, READY);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let (status, rx) = watch::channel(GateStatus::default());
        let api = crate::testing::unreachable_client();
        let err = wait_for_backend(&api, &quick(3), &status).await.unwrap_err();
        assert_eq!(err, GateError::Exhausted { attempts: 3 });
        assert_eq!(rx.borrow().state, GateState::Failed);
        assert_eq!(rx.borrow().message, GAVE_UP);
    }
}
