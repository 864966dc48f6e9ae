//! Legal Chunker Library
//!
//! Hierarchical, token-budgeted chunking of structured legal documents for
//! RAG pipelines. Text is split by article, then by clause, then by raw
//! token windows, and each chunk gets a preview of the next chunk of the
//! same document.

pub mod api;
pub mod assembler;
pub mod chunkers;
pub mod error;
pub mod overlap;
pub mod pipeline;
pub mod types;

pub use assembler::ChunkAssembler;
pub use chunkers::{
    ForcedWindowSplitter, PatternDetector, StructuralSplitter, StructureDetector,
    SubUnitSplitter, TextSplitter, TiktokenCounter, TokenCounter,
};
pub use error::{ChunkError, Result};
pub use overlap::OverlapInjector;
pub use pipeline::{load_chunks, save_chunks, ChunkingPipeline, PipelineOutput, PipelineReport};
pub use types::{Chunk, ChunkMetadata, ChunkingConfig, LegalDialect, TextBlock, UnifiedDocument};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::chunkers::*;
    pub use crate::pipeline::*;
    pub use crate::types::*;
    pub use crate::{ChunkAssembler, ChunkError, OverlapInjector};
}

/// Default chunk size in tokens
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Default lookahead overlap in tokens
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Default tokenizer vocabulary (GPT-4)
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// Separator placed between a chunk and the preview of the next chunk
pub const PREVIEW_MARKER: &str = "\n\n[다음 내용 미리보기]\n";

/// Appended after the preview text
pub const PREVIEW_SUFFIX: &str = "...";
