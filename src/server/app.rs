use std::sync::Arc;

use anyhow::Context;
use axum::body::Body;
use axum::extract::FromRef;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, TextEncoder};
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::routes::{
    auth_router, category_router, demo_router, questions_router, users_router, AppError,
};
use crate::api::ApiClient;
use crate::config::Settings;
use crate::health::GateStatus;
use crate::import::ImportProgress;
use crate::listing::QuestionList;
use crate::session::LocalStore;
use crate::toast::Toasts;

/// Everything the console's handlers share. One operator per console, so the
/// question list and the pending toasts are process-wide.
#[derive(FromRef, Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub api: ApiClient,
    pub store: Arc<LocalStore>,
    pub questions: Arc<Mutex<QuestionList>>,
    pub toasts: Arc<Mutex<Toasts>>,
    pub import_progress: Arc<watch::Sender<ImportProgress>>,
    pub gate: watch::Receiver<GateStatus>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        store: LocalStore,
        gate: watch::Receiver<GateStatus>,
    ) -> anyhow::Result<Self> {
        let api = ApiClient::new(&settings.backend_url, settings.request_timeout())
            .context("Cannot build backend client")?;
        let (import_progress, _) = watch::channel(ImportProgress::default());
        Ok(AppState {
            questions: Arc::new(Mutex::new(QuestionList::new(settings.page_size))),
            settings: Arc::new(settings),
            api,
            store: Arc::new(store),
            toasts: Arc::new(Mutex::new(Toasts::default())),
            import_progress: Arc::new(import_progress),
            gate,
        })
    }

    /// Queues toasts for the next rendered page.
    pub async fn flash(&self, toasts: Toasts) {
        self.toasts.lock().await.extend(toasts);
    }
}

pub fn router(state: AppState) -> Router {
    let static_dir = state.settings.static_dir.clone();
    Router::new()
        .route("/metrics", get(metrics))
        .nest_service("/static", ServeDir::new(static_dir))
        .merge(auth_router(state.clone()))
        .merge(questions_router(state.clone()))
        .merge(category_router(state.clone()))
        .merge(users_router(state.clone()))
        .merge(demo_router(state))
        .fallback(|| async {
            tracing::info!("Fallback");
            StatusCode::NOT_FOUND
        })
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.settings.listen_addr.clone();
    let app = router(state);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot listen on {addr}"))?;

    tracing::info!("Serving on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics() -> Result<Response, AppError> {
    let encoder = TextEncoder::new();
    let metrics = prometheus::gather();
    let mut buf = vec![];
    encoder.encode(&metrics, &mut buf)?;
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, encoder.format_type())
        .body(Body::from(buf))?)
}
