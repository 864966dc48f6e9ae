//! HTTP surface of the chunking service.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

pub use handlers::AppState;

/// Build the service routes.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Chunking
        .route("/chunk", post(handlers::chunk_document))
        .route("/chunk/config", get(handlers::get_config))
        .with_state(state)
}
