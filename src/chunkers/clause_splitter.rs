//! Clause-level splitting of a single oversized article.

use std::sync::Arc;

use tracing::debug;

use super::base::{SharedCounter, TextSplitter};
use super::boundary::{Segment, StructureDetector};
use super::window_splitter::ForcedWindowSplitter;
use crate::error::Result;

/// Splits one article body into clause-aligned chunks.
///
/// Every emitted chunk starts with the article header, so a chunk can always
/// be traced back to its article. Clauses are packed greedily; a clause that
/// cannot fit even on its own is handed to the window splitter with the
/// header as prefix.
pub struct SubUnitSplitter {
    counter: SharedCounter,
    detector: Arc<dyn StructureDetector>,
    windows: ForcedWindowSplitter,
}

impl SubUnitSplitter {
    /// Create a new clause splitter.
    pub fn new(counter: SharedCounter, detector: Arc<dyn StructureDetector>) -> Self {
        Self {
            windows: ForcedWindowSplitter::new(counter.clone()),
            counter,
            detector,
        }
    }

    /// Split the article `header` + `body` into chunks of at most
    /// `max_tokens` tokens, each prefixed with `header`.
    pub fn split_unit(&self, header: &str, body: &str, max_tokens: usize) -> Result<Vec<String>> {
        let clauses = self.detector.split_clauses(body);
        let prefix = format!("{header} ");

        if clauses.is_empty() {
            return self.windows.split(header, max_tokens);
        }

        let mut chunks = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();

        for clause in clauses {
            let alone = self.counter.count_tokens(&render(header, &[clause]));

            if alone > max_tokens {
                flush(header, &mut buffer, &mut chunks);
                debug!(
                    header,
                    clause_tokens = alone,
                    max_tokens,
                    "Clause exceeds budget, forcing token windows"
                );
                chunks.extend(self.windows.split_with_prefix(&prefix, clause, max_tokens)?);
                continue;
            }

            if !buffer.is_empty() {
                buffer.push(clause);
                let packed = self.counter.count_tokens(&render(header, &buffer));
                buffer.pop();

                if packed > max_tokens {
                    flush(header, &mut buffer, &mut chunks);
                }
            }
            buffer.push(clause);
        }

        flush(header, &mut buffer, &mut chunks);
        Ok(chunks)
    }
}

impl TextSplitter for SubUnitSplitter {
    fn name(&self) -> &'static str {
        "clause"
    }

    /// Split a single article. The header is the article marker at the start
    /// of `text`; text that does not open with one is windowed as plain text.
    fn split(&self, text: &str, max_tokens: usize) -> Result<Vec<String>> {
        let text = text.trim();
        match self.detector.split_units(text).first() {
            Some(Segment::Unit { header, .. }) if text.starts_with(header) => {
                let body = text[header.len()..].trim();
                self.split_unit(header, body, max_tokens)
            }
            _ => self.windows.split(text, max_tokens),
        }
    }
}

/// `header clause1 clause2 ...`
fn render(header: &str, clauses: &[&str]) -> String {
    format!("{} {}", header, clauses.join(" "))
}

fn flush(header: &str, buffer: &mut Vec<&str>, chunks: &mut Vec<String>) {
    if !buffer.is_empty() {
        chunks.push(render(header, buffer));
        buffer.clear();
    }
}
