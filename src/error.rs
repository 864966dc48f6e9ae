//! Error types for the legal chunking engine.

use thiserror::Error;

/// Errors produced while loading, splitting, or persisting chunks.
///
/// Empty or whitespace-only blocks are not errors; they are skipped.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// A text block is missing a required field or has the wrong type.
    #[error("malformed text block #{index}: field `{field}` {reason}")]
    MalformedInput {
        index: usize,
        field: String,
        reason: String,
    },

    /// The configured tokenizer could not encode or decode a piece of text.
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// Construction-time configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChunkError {
    /// Build a `MalformedInput` error for block `index`.
    pub fn malformed(index: usize, field: &str, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            index,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ChunkError>;
