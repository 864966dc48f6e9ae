//! Core types for the legal chunking engine.

mod block;
mod chunk;
mod config;

pub use block::{TextBlock, UnifiedDocument};
pub use chunk::{Chunk, ChunkMetadata};
pub use config::{ChunkingConfig, LegalDialect};
