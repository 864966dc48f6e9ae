//! Lexical detection of article and clause boundaries in legal text.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ChunkError, Result};
use crate::types::LegalDialect;

lazy_static! {
    /// `제36조`, `제36조의2`
    static ref KOREAN_ARTICLE: Regex = Regex::new(r"제\d+조(?:의\d+)?").unwrap();
    /// `①`..`⑳` or `1.`
    static ref KOREAN_CLAUSE: Regex = Regex::new(r"[①-⑳]|\d+\.").unwrap();
    /// `Article 36`, `Article 36-2`
    static ref ENGLISH_ARTICLE: Regex = Regex::new(r"Article\s+\d+(?:-\d+)?").unwrap();
    /// `(1)` or `1.`
    static ref ENGLISH_CLAUSE: Regex = Regex::new(r"\(\d+\)|\d+\.").unwrap();
}

/// A span of block text, as seen by the article splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any recognized article
    Prose(&'a str),
    /// An article marker and the text up to the next marker
    Unit { header: &'a str, body: &'a str },
}

/// Finds structural units and their clauses.
///
/// Recognition is purely syntactic. A detector never validates numbering;
/// it only tells the splitters where the boundaries are.
pub trait StructureDetector: Send + Sync {
    /// Get the name of this detector.
    fn name(&self) -> &str;

    /// Partition `text` into prose and units, in order. Segments are trimmed
    /// and empty prose is dropped.
    fn split_units<'a>(&self, text: &'a str) -> Vec<Segment<'a>>;

    /// Partition a unit body into clauses, in order. Each clause starts at
    /// its enumeration marker; text before the first marker is its own clause.
    fn split_clauses<'a>(&self, body: &'a str) -> Vec<&'a str>;
}

/// A structure detector driven by two regular expressions.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    name: String,
    unit: Regex,
    clause: Regex,
}

impl PatternDetector {
    /// Build a detector from custom unit and clause patterns.
    pub fn new(name: &str, unit_pattern: &str, clause_pattern: &str) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| ChunkError::InvalidConfig(format!("bad pattern `{pattern}`: {e}")))
        };

        Ok(Self {
            name: name.to_string(),
            unit: compile(unit_pattern)?,
            clause: compile(clause_pattern)?,
        })
    }

    /// Detector for Korean statutes (조 / 항).
    pub fn korean_statute() -> Self {
        Self {
            name: "korean_statute".to_string(),
            unit: KOREAN_ARTICLE.clone(),
            clause: KOREAN_CLAUSE.clone(),
        }
    }

    /// Detector for English-style `Article N` statutes.
    pub fn english_articles() -> Self {
        Self {
            name: "english_articles".to_string(),
            unit: ENGLISH_ARTICLE.clone(),
            clause: ENGLISH_CLAUSE.clone(),
        }
    }

    /// Built-in detector for a dialect.
    pub fn for_dialect(dialect: LegalDialect) -> Self {
        match dialect {
            LegalDialect::Korean => Self::korean_statute(),
            LegalDialect::English => Self::english_articles(),
        }
    }
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::korean_statute()
    }
}

impl StructureDetector for PatternDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn split_units<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let markers: Vec<_> = self.unit.find_iter(text).collect();
        let mut segments = Vec::with_capacity(markers.len() + 1);

        let lead_end = markers.first().map_or(text.len(), |m| m.start());
        let lead = text[..lead_end].trim();
        if !lead.is_empty() {
            segments.push(Segment::Prose(lead));
        }

        for (i, marker) in markers.iter().enumerate() {
            let body_end = markers.get(i + 1).map_or(text.len(), |next| next.start());
            segments.push(Segment::Unit {
                header: marker.as_str(),
                body: text[marker.end()..body_end].trim(),
            });
        }

        segments
    }

    fn split_clauses<'a>(&self, body: &'a str) -> Vec<&'a str> {
        let mut starts: Vec<usize> = self.clause.find_iter(body).map(|m| m.start()).collect();
        if starts.first() != Some(&0) {
            starts.insert(0, 0);
        }

        starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(body.len());
                body[start..end].trim()
            })
            .filter(|clause| !clause.is_empty())
            .collect()
    }
}
