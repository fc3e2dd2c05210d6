//! HTTP surface: pipeline routes, media serving, metrics.

pub mod metrics;
mod requests_logging;
mod routes;
mod server;
mod state;

pub use routes::{pipeline_routes, ProcessBody, ProcessErrorResponse, ProcessSuccessResponse};
pub use server::run_server;
pub use state::ServerState;
