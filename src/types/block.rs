//! Input text blocks and the unified document that carries them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChunkError, Result};

/// One page-level block of text from a source document.
///
/// Blocks are produced upstream by the document merger. Their order is
/// significant: it drives chunk ordering and overlap adjacency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Identifier of the document this block belongs to (e.g. `doc_001`)
    pub doc_id: String,

    /// Human-readable document name (usually the source file name)
    pub doc_name: String,

    /// Page number within the document
    #[serde(default)]
    pub page: u32,

    /// Raw text of the block
    pub text: String,
}

impl TextBlock {
    /// Create a new text block.
    pub fn new(doc_id: &str, doc_name: &str, page: u32, text: &str) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            doc_name: doc_name.to_string(),
            page,
            text: text.to_string(),
        }
    }

    /// Whether the block has nothing worth chunking.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Build a block from an untyped JSON value, reporting the first missing
    /// or mistyped field.
    ///
    /// `doc_id`, `doc_name` and `text` are required strings. `page` may be
    /// absent (defaults to 0) but must be a non-negative integer if present.
    pub fn from_value(index: usize, value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| ChunkError::malformed(index, "<block>", "is not a JSON object"))?;

        let required = |field: &str| -> Result<String> {
            match obj.get(field) {
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(ChunkError::malformed(index, field, "is not a string")),
                None => Err(ChunkError::malformed(index, field, "is missing")),
            }
        };

        let doc_id = required("doc_id")?;
        let doc_name = required("doc_name")?;
        let text = required("text")?;

        let page = match obj.get("page") {
            None | Some(Value::Null) => 0,
            Some(v) => v
                .as_u64()
                .and_then(|p| u32::try_from(p).ok())
                .ok_or_else(|| {
                    ChunkError::malformed(index, "page", "is not a non-negative integer")
                })?,
        };

        Ok(Self {
            doc_id,
            doc_name,
            page,
            text,
        })
    }
}

/// The unified document emitted by the document merger.
///
/// Blocks are kept as raw JSON so that one malformed block fails on its own
/// instead of rejecting the whole payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnifiedDocument {
    #[serde(default)]
    pub text_blocks: Vec<Value>,
}

impl UnifiedDocument {
    /// Parse a unified document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate every block, in order.
    pub fn blocks(&self) -> Vec<Result<TextBlock>> {
        self.text_blocks
            .iter()
            .enumerate()
            .map(|(index, value)| TextBlock::from_value(index, value))
            .collect()
    }

    /// Number of raw blocks in the payload.
    pub fn len(&self) -> usize {
        self.text_blocks.len()
    }

    /// Whether the payload carries no blocks at all.
    pub fn is_empty(&self) -> bool {
        self.text_blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_from_value() {
        let value = json!({
            "doc_id": "doc_001",
            "doc_name": "건설산업기본법.pdf",
            "page": 3,
            "text": "제1조 목적"
        });
        let block = TextBlock::from_value(0, &value).unwrap();
        assert_eq!(block, TextBlock::new("doc_001", "건설산업기본법.pdf", 3, "제1조 목적"));
    }

    #[test]
    fn test_missing_page_defaults_to_zero() {
        let value = json!({"doc_id": "d", "doc_name": "n", "text": "t"});
        let block = TextBlock::from_value(0, &value).unwrap();
        assert_eq!(block.page, 0);
    }

    #[test]
    fn test_missing_required_field() {
        let value = json!({"doc_id": "d", "page": 1, "text": "t"});
        let err = TextBlock::from_value(4, &value).unwrap_err();
        match err {
            ChunkError::MalformedInput { index, field, .. } => {
                assert_eq!(index, 4);
                assert_eq!(field, "doc_name");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mistyped_fields() {
        let bad_text = json!({"doc_id": "d", "doc_name": "n", "text": 42});
        assert!(TextBlock::from_value(0, &bad_text).is_err());

        let bad_page = json!({"doc_id": "d", "doc_name": "n", "page": -1, "text": "t"});
        assert!(TextBlock::from_value(0, &bad_page).is_err());

        assert!(TextBlock::from_value(0, &json!("just a string")).is_err());
    }

    #[test]
    fn test_unified_document_isolates_bad_blocks() {
        let doc = UnifiedDocument::from_json_str(
            r#"{"text_blocks": [
                {"doc_id": "a", "doc_name": "A", "page": 1, "text": "one"},
                {"doc_name": "B", "page": 1, "text": "two"},
                {"doc_id": "c", "doc_name": "C", "page": 2, "text": "three"}
            ]}"#,
        )
        .unwrap();

        let blocks = doc.blocks();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].is_ok());
        assert!(blocks[1].is_err());
        assert!(blocks[2].is_ok());
    }

    #[test]
    fn test_blank_block() {
        assert!(TextBlock::new("d", "n", 0, "  \n\t ").is_blank());
        assert!(!TextBlock::new("d", "n", 0, "제1조").is_blank());
    }
}
