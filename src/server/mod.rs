pub mod app;
pub(crate) mod deserializers;
mod routes;

pub use app::{router, run_server, AppState};
pub use routes::AppError;
