//! End-to-end chunking runs: load blocks, assemble, overlap, persist.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assembler::{BlockFailure, ChunkAssembler};
use crate::chunkers::{
    PatternDetector, SharedCounter, StructuralSplitter, StructureDetector, TiktokenCounter,
};
use crate::error::Result;
use crate::overlap::OverlapInjector;
use crate::types::{Chunk, ChunkingConfig, TextBlock, UnifiedDocument};

/// A block that was dropped from a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockError {
    /// Position of the block in the input
    pub index: usize,
    /// Document of the block, when it could be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    pub error: String,
}

/// Summary of a chunking run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub total_blocks: usize,
    pub skipped_blocks: usize,
    pub failed_blocks: usize,
    pub total_chunks: usize,
    pub overlapped_chunks: usize,
    pub errors: Vec<BlockError>,
}

/// Chunks produced by a run together with its report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub chunks: Vec<Chunk>,
    pub report: PipelineReport,
}

/// The complete chunking engine for one configuration.
pub struct ChunkingPipeline {
    config: ChunkingConfig,
    counter: SharedCounter,
    detector: Arc<dyn StructureDetector>,
    assembler: ChunkAssembler,
    injector: OverlapInjector,
}

impl ChunkingPipeline {
    /// Create a pipeline, loading the configured tokenizer vocabulary.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        let counter = TiktokenCounter::with_encoding(&config.encoding)?.shared();
        Self::with_counter(config, counter)
    }

    /// Create a pipeline over an existing vocabulary.
    pub fn with_counter(config: ChunkingConfig, counter: SharedCounter) -> Result<Self> {
        let detector = Arc::new(PatternDetector::for_dialect(config.dialect));
        Self::with_detector(config, counter, detector)
    }

    /// Create a pipeline with a custom structure detector.
    pub fn with_detector(
        config: ChunkingConfig,
        counter: SharedCounter,
        detector: Arc<dyn StructureDetector>,
    ) -> Result<Self> {
        config.validate()?;

        let splitter = StructuralSplitter::new(counter.clone(), detector.clone());
        Ok(Self {
            assembler: ChunkAssembler::new(counter.clone(), splitter),
            injector: OverlapInjector::new(counter.clone()),
            config,
            counter,
            detector,
        })
    }

    /// A pipeline sharing this one's vocabulary and detector with a
    /// different chunk size and/or overlap.
    pub fn with_overrides(
        &self,
        chunk_size: Option<usize>,
        overlap: Option<usize>,
    ) -> Result<Self> {
        let mut config = self.config.clone();
        if let Some(size) = chunk_size {
            config.chunk_size = size;
        }
        if let Some(overlap) = overlap {
            config.overlap = overlap;
        }
        Self::with_detector(config, self.counter.clone(), self.detector.clone())
    }

    /// Get the active configuration.
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Get the shared token counter.
    pub fn counter(&self) -> &SharedCounter {
        &self.counter
    }

    /// Chunk validated blocks and apply overlap.
    pub fn run(&self, blocks: &[TextBlock]) -> Result<PipelineOutput> {
        self.run_indexed(blocks, None, Vec::new(), blocks.len())
    }

    /// Chunk a unified document, validating each block first.
    ///
    /// Malformed blocks are reported and skipped when `continue_on_error` is
    /// set; otherwise the first one aborts the run.
    pub fn run_document(&self, document: &UnifiedDocument) -> Result<PipelineOutput> {
        if document.is_empty() {
            warn!("Document has no text blocks");
        }

        let mut blocks = Vec::with_capacity(document.len());
        let mut positions = Vec::with_capacity(document.len());
        let mut errors = Vec::new();

        for (index, block) in document.blocks().into_iter().enumerate() {
            match block {
                Ok(block) => {
                    blocks.push(block);
                    positions.push(index);
                }
                Err(e) if self.config.continue_on_error => {
                    warn!(block = index, error = %e, "Malformed block, skipping");
                    errors.push(BlockError {
                        index,
                        doc_id: None,
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        self.run_indexed(&blocks, Some(&positions), errors, document.len())
    }

    /// Parse a unified JSON document and chunk it.
    pub fn process_json_str(&self, json: &str) -> Result<PipelineOutput> {
        let document = UnifiedDocument::from_json_str(json)?;
        self.run_document(&document)
    }

    /// Load a unified JSON document from disk and chunk it.
    pub fn process_unified_json(&self, path: impl AsRef<Path>) -> Result<PipelineOutput> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading unified document");
        let json = std::fs::read_to_string(path)?;
        self.process_json_str(&json)
    }

    fn run_indexed(
        &self,
        blocks: &[TextBlock],
        positions: Option<&[usize]>,
        mut errors: Vec<BlockError>,
        total_blocks: usize,
    ) -> Result<PipelineOutput> {
        info!(
            blocks = blocks.len(),
            chunk_size = self.config.chunk_size,
            overlap = self.config.overlap,
            encoding = %self.config.encoding,
            "Starting chunking run"
        );

        let chunks = if self.config.continue_on_error {
            let (chunks, failures) = self
                .assembler
                .assemble_lenient(blocks, self.config.chunk_size);
            errors.extend(failures.into_iter().map(
                |BlockFailure { index, doc_id, error }| BlockError {
                    index: positions.map_or(index, |p| p[index]),
                    doc_id: Some(doc_id),
                    error: error.to_string(),
                },
            ));
            chunks
        } else {
            self.assembler.assemble(blocks, self.config.chunk_size)?
        };

        let chunks = self.injector.inject(&chunks, self.config.overlap);
        errors.sort_by_key(|e| e.index);

        let report = PipelineReport {
            total_blocks,
            skipped_blocks: blocks.iter().filter(|b| b.is_blank()).count(),
            failed_blocks: errors.len(),
            total_chunks: chunks.len(),
            overlapped_chunks: chunks.iter().filter(|c| c.metadata.has_overlap).count(),
            errors,
        };

        info!(
            chunks = report.total_chunks,
            overlapped = report.overlapped_chunks,
            skipped = report.skipped_blocks,
            failed = report.failed_blocks,
            "Chunking run complete"
        );

        Ok(PipelineOutput { chunks, report })
    }
}

/// Write chunks as a pretty-printed JSON array, creating parent directories.
pub fn save_chunks(chunks: &[Chunk], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(chunks)?;
    std::fs::write(path, json)?;

    info!(path = %path.display(), chunks = chunks.len(), "Saved chunks");
    Ok(())
}

/// Read a chunk array written by [`save_chunks`].
pub fn load_chunks(path: impl AsRef<Path>) -> Result<Vec<Chunk>> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
