use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Console settings: defaults, then optional `dashboard.toml`, then `QUIZ_ADMIN_*`
/// environment variables (a `.env` file is loaded first).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub backend_url: String,
    pub listen_addr: String,
    pub static_dir: PathBuf,
    pub storage_path: PathBuf,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub health: HealthSettings,
    pub import: ImportSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthSettings {
    pub interval_ms: u64,
    pub timeout_ms: u64,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportSettings {
    pub tick_ms: u64,
    pub step: u8,
    pub hold_ms: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let config_file =
            dotenv::var("QUIZ_ADMIN_CONFIG").unwrap_or_else(|_| "dashboard".to_owned());
        Config::builder()
            .set_default("backend_url", "http://localhost:5000")?
            .set_default("listen_addr", "0.0.0.0:8080")?
            .set_default("static_dir", "static")?
            .set_default("storage_path", ".quiz-admin/storage.json")?
            .set_default("page_size", 20)?
            .set_default("request_timeout_secs", 30)?
            .set_default("health.interval_ms", 2000)?
            .set_default("health.timeout_ms", 10000)?
            .set_default("health.max_attempts", 30)?
            .set_default("import.tick_ms", 200)?
            .set_default("import.step", 10)?
            .set_default("import.hold_ms", 500)?
            .add_source(File::with_name(&config_file).required(false))
            .add_source(
                Environment::with_prefix("QUIZ_ADMIN")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl HealthSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ImportSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        ImportSettings {
            tick_ms: 200,
            step: 10,
            hold_ms: 500,
        }
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        HealthSettings {
            interval_ms: 2000,
            timeout_ms: 10000,
            max_attempts: 30,
        }
    }
}
