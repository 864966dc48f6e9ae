//! Article-aware splitting, the entry point of the fallback chain.

use std::sync::Arc;

use tracing::debug;

use super::base::{SharedCounter, TextSplitter};
use super::boundary::{PatternDetector, Segment, StructureDetector};
use super::clause_splitter::SubUnitSplitter;
use super::window_splitter::ForcedWindowSplitter;
use crate::error::{ChunkError, Result};

/// Splits legal text on article markers and packs whole articles greedily.
///
/// Fallback order:
/// 1. Whole articles (and leading prose), packed left to right
/// 2. Clauses of an article that does not fit on its own
/// 3. Token windows for prose or clauses that still do not fit
///
/// An article is never split across chunks unless it alone exceeds the
/// budget. Packing does not look ahead or rebalance, so the last chunk of a
/// block may be small.
pub struct StructuralSplitter {
    counter: SharedCounter,
    detector: Arc<dyn StructureDetector>,
    clauses: SubUnitSplitter,
    windows: ForcedWindowSplitter,
}

impl StructuralSplitter {
    /// Create an article splitter with the given detector.
    pub fn new(counter: SharedCounter, detector: Arc<dyn StructureDetector>) -> Self {
        Self {
            clauses: SubUnitSplitter::new(counter.clone(), detector.clone()),
            windows: ForcedWindowSplitter::new(counter.clone()),
            counter,
            detector,
        }
    }

    /// Create an article splitter for Korean statutes.
    pub fn korean(counter: SharedCounter) -> Self {
        Self::new(counter, Arc::new(PatternDetector::korean_statute()))
    }

    /// Name of the active structure detector.
    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }
}

impl TextSplitter for StructuralSplitter {
    fn name(&self) -> &'static str {
        "article"
    }

    fn split(&self, text: &str, max_tokens: usize) -> Result<Vec<String>> {
        if max_tokens == 0 {
            return Err(ChunkError::InvalidConfig(
                "max_tokens must be at least 1".to_string(),
            ));
        }

        let mut chunks = Vec::new();
        let mut buffer = String::new();

        for segment in self.detector.split_units(text) {
            let piece = match segment {
                Segment::Prose(prose) => prose.to_string(),
                Segment::Unit { header, body } if body.is_empty() => header.to_string(),
                Segment::Unit { header, body } => format!("{header} {body}"),
            };
            let piece_tokens = self.counter.count_tokens(&piece);

            if piece_tokens > max_tokens {
                flush(&mut buffer, &mut chunks);
                match segment {
                    Segment::Unit { header, body } => {
                        debug!(
                            header,
                            piece_tokens,
                            max_tokens,
                            "Article exceeds budget, splitting by clause"
                        );
                        chunks.extend(self.clauses.split_unit(header, body, max_tokens)?);
                    }
                    Segment::Prose(prose) => {
                        debug!(
                            piece_tokens,
                            max_tokens,
                            "Prose exceeds budget, forcing token windows"
                        );
                        chunks.extend(self.windows.split(prose, max_tokens)?);
                    }
                }
                continue;
            }

            if buffer.is_empty() {
                buffer = piece;
                continue;
            }

            let packed = format!("{buffer} {piece}");
            if self.counter.count_tokens(&packed) <= max_tokens {
                buffer = packed;
            } else {
                flush(&mut buffer, &mut chunks);
                buffer = piece;
            }
        }

        flush(&mut buffer, &mut chunks);
        Ok(chunks)
    }
}

fn flush(buffer: &mut String, chunks: &mut Vec<String>) {
    if !buffer.is_empty() {
        chunks.push(std::mem::take(buffer));
    }
}
