//! Chunk type definitions.

use serde::{Deserialize, Serialize};

use super::TextBlock;

/// A chunk of legal text ready for embedding and indexing.
///
/// Chunks are created once by the assembler, extended once by the overlap
/// injector, and then persisted unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Sequential, zero-padded identifier (e.g. `chunk_00042`)
    pub chunk_id: String,

    /// The text content of the chunk
    pub content: String,

    /// Provenance and accounting metadata
    pub metadata: ChunkMetadata,
}

/// Metadata attached to every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Document the chunk was cut from
    pub doc_id: String,

    /// Document name, for display and citation
    pub doc_name: String,

    /// Page of the source block
    pub page: u32,

    /// Token count of `content` under the configured tokenizer
    pub chunk_tokens: usize,

    /// Whether a preview of the next chunk was appended
    #[serde(default)]
    pub has_overlap: bool,
}

impl ChunkMetadata {
    /// Metadata carrying the provenance of `block`.
    pub fn for_block(block: &TextBlock, chunk_tokens: usize) -> Self {
        Self {
            doc_id: block.doc_id.clone(),
            doc_name: block.doc_name.clone(),
            page: block.page,
            chunk_tokens,
            has_overlap: false,
        }
    }
}

impl Chunk {
    /// Create a chunk for content cut from `block`.
    pub fn new(chunk_id: String, content: String, block: &TextBlock, chunk_tokens: usize) -> Self {
        Self {
            chunk_id,
            content,
            metadata: ChunkMetadata::for_block(block, chunk_tokens),
        }
    }

    /// Format the identifier for the `n`th chunk of a run (1-based).
    pub fn format_id(n: usize) -> String {
        format!("chunk_{:05}", n)
    }

    /// Document this chunk belongs to.
    pub fn doc_id(&self) -> &str {
        &self.metadata.doc_id
    }
}
