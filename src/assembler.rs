//! Turns ordered text blocks into identified, provenance-tagged chunks.

use tracing::{debug, info, warn};

use crate::chunkers::{SharedCounter, StructuralSplitter, TextSplitter};
use crate::error::{ChunkError, Result};
use crate::types::{Chunk, TextBlock};

/// Blocks between progress log lines.
const PROGRESS_INTERVAL: usize = 50;

/// A block that could not be split.
#[derive(Debug)]
pub struct BlockFailure {
    /// Position of the block in the input sequence
    pub index: usize,
    /// Document of the failing block
    pub doc_id: String,
    pub error: ChunkError,
}

/// Sequential chunk identifiers for a single assembly run.
#[derive(Debug, Default)]
struct ChunkIdSequence {
    issued: usize,
}

impl ChunkIdSequence {
    fn next_id(&mut self) -> String {
        self.issued += 1;
        Chunk::format_id(self.issued)
    }
}

/// Runs the article splitter over every block and emits chunks.
///
/// Each block is split completely before any identifier is issued for it,
/// so a failing block never leaves a gap in the id sequence.
pub struct ChunkAssembler {
    counter: SharedCounter,
    splitter: StructuralSplitter,
}

impl ChunkAssembler {
    /// Create a new assembler.
    pub fn new(counter: SharedCounter, splitter: StructuralSplitter) -> Self {
        Self { counter, splitter }
    }

    /// Assemble chunks, aborting on the first block that fails to split.
    pub fn assemble(&self, blocks: &[TextBlock], max_tokens: usize) -> Result<Vec<Chunk>> {
        let mut ids = ChunkIdSequence::default();
        let mut chunks = Vec::new();

        for (index, block) in blocks.iter().enumerate() {
            self.assemble_block(index, block, max_tokens, &mut ids, &mut chunks)?;
        }

        Ok(chunks)
    }

    /// Assemble chunks, recording failing blocks and continuing past them.
    pub fn assemble_lenient(
        &self,
        blocks: &[TextBlock],
        max_tokens: usize,
    ) -> (Vec<Chunk>, Vec<BlockFailure>) {
        let mut ids = ChunkIdSequence::default();
        let mut chunks = Vec::new();
        let mut failures = Vec::new();

        for (index, block) in blocks.iter().enumerate() {
            let assembled = self.assemble_block(index, block, max_tokens, &mut ids, &mut chunks);
            if let Err(error) = assembled {
                warn!(
                    block = index,
                    doc_id = %block.doc_id,
                    error = %error,
                    "Failed to chunk block, skipping"
                );
                failures.push(BlockFailure {
                    index,
                    doc_id: block.doc_id.clone(),
                    error,
                });
            }
        }

        (chunks, failures)
    }

    fn assemble_block(
        &self,
        index: usize,
        block: &TextBlock,
        max_tokens: usize,
        ids: &mut ChunkIdSequence,
        chunks: &mut Vec<Chunk>,
    ) -> Result<()> {
        if index > 0 && index % PROGRESS_INTERVAL == 0 {
            info!(blocks = index, chunks = ids.issued, "Chunking progress");
        }

        if block.is_blank() {
            debug!(
                block = index,
                doc_id = %block.doc_id,
                page = block.page,
                "Skipping blank block"
            );
            return Ok(());
        }

        let pieces = self.splitter.split(&block.text, max_tokens)?;
        debug!(
            block = index,
            doc_id = %block.doc_id,
            page = block.page,
            splitter = self.splitter.name(),
            detector = self.splitter.detector_name(),
            chunks = pieces.len(),
            "Block split"
        );

        chunks.extend(pieces.into_iter().map(|content| {
            let tokens = self.counter.count_tokens(&content);
            Chunk::new(ids.next_id(), content, block, tokens)
        }));

        Ok(())
    }
}
