//! Configuration types for chunking.

use serde::{Deserialize, Serialize};

use crate::error::{ChunkError, Result};
use crate::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_ENCODING};

/// Numbering convention used to recognize articles and clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalDialect {
    /// Korean statutes: `제36조`, `제36조의2`, clauses `①`..`⑳` or `1.`
    #[default]
    Korean,
    /// English-style statutes: `Article 36`, `Article 36-2`, clauses `(1)` or `1.`
    English,
}

impl LegalDialect {
    /// Parse a dialect name as used in environment variables.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "korean" | "ko" => Some(Self::Korean),
            "english" | "en" => Some(Self::English),
            _ => None,
        }
    }
}

impl std::fmt::Display for LegalDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LegalDialect::Korean => write!(f, "korean"),
            LegalDialect::English => write!(f, "english"),
        }
    }
}

/// Chunking engine configuration.
///
/// Supplied at construction time; none of it changes mid-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum tokens per chunk
    pub chunk_size: usize,

    /// Lookahead tokens appended from the next chunk of the same document
    pub overlap: usize,

    /// Tokenizer encoding or model name (e.g. `cl100k_base`, `gpt-4`)
    pub encoding: String,

    /// Article/clause numbering convention
    pub dialect: LegalDialect,

    /// Skip malformed or failing blocks instead of aborting the run
    pub continue_on_error: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
            encoding: DEFAULT_ENCODING.to_string(),
            dialect: LegalDialect::default(),
            continue_on_error: true,
        }
    }
}

impl ChunkingConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            chunk_size: std::env::var("CHUNK_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            overlap: std::env::var("CHUNK_OVERLAP")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CHUNK_OVERLAP),
            encoding: std::env::var("TOKENIZER_ENCODING")
                .unwrap_or_else(|_| DEFAULT_ENCODING.to_string()),
            dialect: std::env::var("LEGAL_DIALECT")
                .ok()
                .and_then(|s| LegalDialect::parse(&s))
                .unwrap_or_default(),
            continue_on_error: std::env::var("CONTINUE_ON_ERROR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
        }
    }

    /// Create a config with the given chunk size.
    pub fn with_size(size: usize) -> Self {
        Self {
            chunk_size: size,
            ..Default::default()
        }
    }

    /// Set the overlap.
    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    /// Set the dialect.
    pub fn with_dialect(mut self, dialect: LegalDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Abort on the first failing block.
    pub fn strict(mut self) -> Self {
        self.continue_on_error = false;
        self
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkError::InvalidConfig(
                "chunk_size must be at least 1 token".to_string(),
            ));
        }
        if self.encoding.trim().is_empty() {
            return Err(ChunkError::InvalidConfig(
                "tokenizer encoding must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
