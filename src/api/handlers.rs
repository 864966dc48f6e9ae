//! HTTP request handlers for the chunking service.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ChunkError;
use crate::pipeline::{ChunkingPipeline, PipelineOutput};
use crate::types::{ChunkingConfig, UnifiedDocument};

/// Application state shared across handlers.
pub struct AppState {
    pub pipeline: ChunkingPipeline,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get the active chunking configuration.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ChunkingConfig> {
    Json(state.pipeline.config().clone())
}

/// Request to chunk a unified document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRequest {
    /// Blocks in global order, as produced by the document merger
    pub text_blocks: Vec<Value>,

    /// Per-request chunk size override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,

    /// Per-request overlap override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap: Option<usize>,
}

/// Error body returned to clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A chunking error mapped onto an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<ChunkError> for ApiError {
    fn from(error: ChunkError) -> Self {
        let status = match &error {
            ChunkError::InvalidConfig(_) | ChunkError::Json(_) => StatusCode::BAD_REQUEST,
            ChunkError::MalformedInput { .. } | ChunkError::Tokenization(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ChunkError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// Chunk a unified document and return the chunks with a run report.
pub async fn chunk_document(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChunkRequest>,
) -> Result<Json<PipelineOutput>, ApiError> {
    info!(
        blocks = request.text_blocks.len(),
        chunk_size = ?request.chunk_size,
        overlap = ?request.overlap,
        "Received chunk request"
    );

    let document = UnifiedDocument {
        text_blocks: request.text_blocks,
    };
    let (chunk_size, overlap) = (request.chunk_size, request.overlap);

    let output = tokio::task::spawn_blocking(move || {
        let pipeline = state.pipeline.with_overrides(chunk_size, overlap)?;
        pipeline.run_document(&document)
    })
    .await
    .map_err(|e| {
        warn!(error = %e, "Chunking task failed");
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    })??;

    Ok(Json(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes;
    use crate::chunkers::testing;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state(config: ChunkingConfig) -> Arc<AppState> {
        Arc::new(AppState {
            pipeline: ChunkingPipeline::with_counter(config, testing::tiktoken()).unwrap(),
        })
    }

    async fn post_json(state: Arc<AppState>, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/chunk")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = routes(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = routes(state(ChunkingConfig::default())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_config() {
        let request = Request::builder().uri("/chunk/config").body(Body::empty()).unwrap();
        let app = routes(state(ChunkingConfig::with_size(321)));
        let response = app.oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let config: ChunkingConfig = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(config.chunk_size, 321);
    }

    #[tokio::test]
    async fn test_chunk_document() {
        let body = serde_json::json!({
            "text_blocks": [
                {
                    "doc_id": "doc_001",
                    "doc_name": "법.pdf",
                    "page": 1,
                    "text": "제36조 본문내용... 제37조 다른내용..."
                },
                {"doc_id": "doc_002", "doc_name": "령.pdf", "page": 1, "text": "제1조 목적"}
            ],
            "overlap": 0
        });
        let (status, value) = post_json(state(ChunkingConfig::default()), body).await;

        assert_eq!(status, StatusCode::OK);
        let chunks = value["chunks"].as_array().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0]["content"], "제36조 본문내용... 제37조 다른내용...");
        assert_eq!(chunks[1]["chunk_id"], "chunk_00002");
        assert_eq!(value["report"]["total_chunks"], 2);
    }

    #[tokio::test]
    async fn test_invalid_override() {
        let body = serde_json::json!({"text_blocks": [], "chunk_size": 0});
        let (status, value) = post_json(state(ChunkingConfig::default()), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].as_str().unwrap().contains("chunk_size"));
    }

    #[tokio::test]
    async fn test_malformed_block_strict_mode() {
        let body = serde_json::json!({"text_blocks": [{"doc_id": "a", "text": "제1조"}]});
        let (status, _) = post_json(state(ChunkingConfig::default().strict()), body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
