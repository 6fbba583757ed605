//! HTTP API server for Feedgate.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::Settings;
pub use routes::create_router;
pub use state::AppState;

use axum::Router;
use std::sync::Arc;

/// Assemble the application with middleware applied.
pub fn build_app(state: Arc<AppState>) -> Router {
    create_router(state)
        .layer(axum::middleware::from_fn(middleware::request_id))
        .layer(middleware::cors_layer())
}
