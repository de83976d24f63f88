use anyhow::Context;
use tokio::sync::watch;

use quiz_granny_admin::api::ApiClient;
use quiz_granny_admin::config::Settings;
use quiz_granny_admin::health::{wait_for_backend, GateStatus};
use quiz_granny_admin::server::{run_server, AppState};
use quiz_granny_admin::session::LocalStore;
use quiz_granny_admin::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = Settings::load().context("Cannot load settings")?;
    let store = LocalStore::open(&settings.storage_path)
        .with_context(|| format!("Cannot open {}", settings.storage_path.display()))?;

    let (gate_tx, gate_rx) = watch::channel(GateStatus::default());
    let api = ApiClient::new(&settings.backend_url, settings.request_timeout())
        .context("Cannot build backend client")?;
    let health = settings.health.clone();
    tokio::spawn(async move {
        if let Err(err) = wait_for_backend(&api, &health, &gate_tx).await {
            tracing::error!(error = %err, "Backend never became healthy");
        }
    });

    let state = AppState::new(settings, store, gate_rx)?;
    run_server(state).await
}
