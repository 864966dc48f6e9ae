//! Splitting strategies for legal text, from coarse to fine.

mod article_splitter;
mod base;
mod boundary;
mod clause_splitter;
mod window_splitter;

pub use article_splitter::StructuralSplitter;
pub use base::{
    decode_prefix, decode_smallest_prefix, SharedCounter, TextSplitter, TiktokenCounter,
    TokenCounter,
};
pub use boundary::{PatternDetector, Segment, StructureDetector};
pub use clause_splitter::SubUnitSplitter;
pub use window_splitter::ForcedWindowSplitter;

#[cfg(test)]
pub(crate) use base::testing;
