pub mod api;
pub mod approval;
pub mod config;
pub mod demo;
pub mod export;
pub mod forms;
pub mod health;
pub mod import;
pub mod listing;
pub mod models;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod toast;

#[cfg(test)]
pub(crate) mod testing;
