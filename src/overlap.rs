//! Lookahead previews between adjacent chunks of the same document.

use tracing::debug;

use crate::chunkers::{decode_prefix, decode_smallest_prefix, SharedCounter};
use crate::types::Chunk;
use crate::{PREVIEW_MARKER, PREVIEW_SUFFIX};

/// Appends the leading tokens of the next same-document chunk to each chunk.
///
/// The preview is a deliberate over-budget allowance: a chunk may exceed the
/// chunk size by the preview length plus its marker.
pub struct OverlapInjector {
    counter: SharedCounter,
}

impl OverlapInjector {
    /// Create a new overlap injector.
    pub fn new(counter: SharedCounter) -> Self {
        Self { counter }
    }

    /// Return a copy of `chunks` with previews applied.
    ///
    /// A chunk gets a preview when the next chunk belongs to the same
    /// document and has at least `overlap_tokens` tokens. `has_overlap` is
    /// set exactly for those chunks and `chunk_tokens` is recounted.
    pub fn inject(&self, chunks: &[Chunk], overlap_tokens: usize) -> Vec<Chunk> {
        if chunks.is_empty() || overlap_tokens == 0 {
            return chunks.to_vec();
        }

        let mut result = Vec::with_capacity(chunks.len());
        for (i, current) in chunks.iter().enumerate() {
            let preview = chunks
                .get(i + 1)
                .filter(|next| next.doc_id() == current.doc_id())
                .and_then(|next| self.preview(&next.content, overlap_tokens));

            let mut chunk = current.clone();
            if let Some(preview) = preview {
                chunk.content =
                    format!("{}{PREVIEW_MARKER}{preview}{PREVIEW_SUFFIX}", chunk.content);
                chunk.metadata.chunk_tokens = self.counter.count_tokens(&chunk.content);
                chunk.metadata.has_overlap = true;
            }

            result.push(chunk);
        }

        debug!(
            chunks = result.len(),
            overlapped = result.iter().filter(|c| c.metadata.has_overlap).count(),
            overlap_tokens,
            "Overlap applied"
        );

        result
    }

    /// First `overlap_tokens` tokens of `next`, or `None` if it is shorter.
    ///
    /// The preview ends on a character boundary. When the first character
    /// alone spans more than `overlap_tokens` tokens, it is taken whole.
    fn preview(&self, next: &str, overlap_tokens: usize) -> Option<String> {
        let tokens = self.counter.encode(next);
        if tokens.len() < overlap_tokens {
            return None;
        }

        let counter = self.counter.as_ref();
        match decode_prefix(counter, &tokens, overlap_tokens) {
            (0, _) => decode_smallest_prefix(counter, &tokens).map(|(_, text)| text),
            (_, text) => Some(text),
        }
    }
}
