use prometheus::{register_counter_vec, register_int_counter_vec};
use prometheus::{CounterVec, IntCounterVec};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lazy_static::lazy_static;

lazy_static! {
    pub static ref BACKEND_REQUESTS: CounterVec = register_counter_vec!(
        "backend_requests_total",
        "Number of requests sent to the quiz backend",
        &["endpoint", "outcome"]
    )
    .expect("backend_requests_total is registered once");
    pub static ref IMPORTED_ROWS: IntCounterVec = register_int_counter_vec!(
        "imported_rows_total",
        "Rows reported by bulk question imports",
        &["outcome"]
    )
    .expect("imported_rows_total is registered once");
}

pub fn init_tracing() {
    let mut fmt_layer = fmt::layer();
    if std::env::var("INCLUDE_SPAN_EVENTS").is_ok_and(|value| value.eq_ignore_ascii_case("true")) {
        fmt_layer = fmt_layer.with_span_events(FmtSpan::ENTER | FmtSpan::EXIT);
    }
    let filter_layer = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
