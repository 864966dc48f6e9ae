//! Legal Chunker Service - Main Entry Point
//!
//! Serves the legal chunking engine over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use legal_chunker::api::{self, AppState};
use legal_chunker::pipeline::ChunkingPipeline;
use legal_chunker::types::ChunkingConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "legal_chunker=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = ChunkingConfig::from_env();

    info!("Starting Legal Chunker Service v{}", env!("CARGO_PKG_VERSION"));
    info!(
        chunk_size = config.chunk_size,
        overlap = config.overlap,
        encoding = %config.encoding,
        dialect = %config.dialect,
        "Chunking configuration"
    );

    // The vocabulary is loaded once and shared read-only by every request.
    let pipeline = ChunkingPipeline::new(config).context("failed to initialize chunking pipeline")?;
    let state = Arc::new(AppState { pipeline });

    let app = api::routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3017);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
