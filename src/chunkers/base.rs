//! Token counting and the shared splitter trait.

use std::sync::Arc;

use crate::error::{ChunkError, Result};

/// A text splitter that turns one piece of text into budget-sized pieces.
///
/// Splitters are composed from coarse to fine: the article splitter defers
/// to the clause splitter, which defers to the forced window splitter. The
/// last one always succeeds, so the chain always terminates.
pub trait TextSplitter: Send + Sync {
    /// Get the name of this splitter.
    fn name(&self) -> &'static str;

    /// Split `text` into ordered pieces of at most `max_tokens` tokens each.
    fn split(&self, text: &str, max_tokens: usize) -> Result<Vec<String>>;
}

/// Token counter trait for counting tokens in text.
///
/// Implementations are pure functions of a fixed vocabulary and must satisfy
/// `count_tokens(t) == encode(t).len()`.
pub trait TokenCounter: Send + Sync {
    /// Count the number of tokens in the given text.
    fn count_tokens(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Encode text into token IDs.
    fn encode(&self, text: &str) -> Vec<usize>;

    /// Decode token IDs back to text.
    ///
    /// Fails when the ids do not form valid UTF-8, which happens when a
    /// sequence is cut in the middle of a multi-byte character.
    fn decode(&self, tokens: &[usize]) -> Result<String>;
}

/// Shared handle to a token counter.
pub type SharedCounter = Arc<dyn TokenCounter>;

/// Token counter backed by a tiktoken BPE vocabulary.
pub struct TiktokenCounter {
    bpe: tiktoken_rs::CoreBPE,
    encoding: String,
}

impl TiktokenCounter {
    /// Create a new token counter with the cl100k_base encoding (GPT-4/ChatGPT).
    pub fn new() -> Result<Self> {
        Self::with_encoding(crate::DEFAULT_ENCODING)
    }

    /// Create a token counter from an encoding name or a model name.
    ///
    /// Unknown identifiers are rejected rather than silently mapped to a
    /// default vocabulary, since token budgets depend on the exact table.
    pub fn with_encoding(name: &str) -> Result<Self> {
        let bpe = match name {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "p50k_edit" => tiktoken_rs::p50k_edit(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            model => tiktoken_rs::get_bpe_from_model(model),
        }
        .map_err(|e| ChunkError::InvalidConfig(format!("unknown tokenizer `{name}`: {e}")))?;

        Ok(Self {
            bpe,
            encoding: name.to_string(),
        })
    }

    /// Name this counter was created with.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Wrap into a shared handle.
    pub fn shared(self) -> SharedCounter {
        Arc::new(self)
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn encode(&self, text: &str) -> Vec<usize> {
        self.bpe.encode_ordinary(text)
    }

    fn decode(&self, tokens: &[usize]) -> Result<String> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| ChunkError::Tokenization(e.to_string()))
    }
}

/// Decode the longest prefix of `tokens` that is at most `limit` tokens long
/// and forms valid text.
///
/// Returns the number of tokens consumed together with the decoded text.
/// Returns `(0, "")` when no non-empty prefix within the limit decodes.
pub fn decode_prefix(
    counter: &dyn TokenCounter,
    tokens: &[usize],
    limit: usize,
) -> (usize, String) {
    let mut end = limit.min(tokens.len());
    while end > 0 {
        if let Ok(text) = counter.decode(&tokens[..end]) {
            return (end, text);
        }
        end -= 1;
    }
    (0, String::new())
}

/// Decode the shortest non-empty prefix of `tokens` that forms valid text.
///
/// Used when no prefix within a limit decodes, e.g. when a single character
/// spans more tokens than the limit allows. Returns `None` if no prefix of
/// `tokens` decodes at all.
pub fn decode_smallest_prefix(
    counter: &dyn TokenCounter,
    tokens: &[usize],
) -> Option<(usize, String)> {
    (1..=tokens.len()).find_map(|end| {
        counter
            .decode(&tokens[..end])
            .ok()
            .map(|text| (end, text))
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic vocabularies for exact budget assertions.

    use super::*;

    /// One token per Unicode scalar value; ids are code points.
    pub struct CharCounter;

    impl TokenCounter for CharCounter {
        fn encode(&self, text: &str) -> Vec<usize> {
            text.chars().map(|c| c as usize).collect()
        }

        fn decode(&self, tokens: &[usize]) -> Result<String> {
            tokens
                .iter()
                .map(|&t| {
                    u32::try_from(t)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| ChunkError::Tokenization(format!("bad id {t}")))
                })
                .collect()
        }
    }

    /// One token per UTF-8 byte, like a byte-level BPE with no merges.
    pub struct ByteCounter;

    impl TokenCounter for ByteCounter {
        fn encode(&self, text: &str) -> Vec<usize> {
            text.bytes().map(usize::from).collect()
        }

        fn decode(&self, tokens: &[usize]) -> Result<String> {
            let bytes = tokens
                .iter()
                .map(|&t| u8::try_from(t))
                .collect::<std::result::Result<Vec<u8>, _>>()
                .map_err(|e| ChunkError::Tokenization(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| ChunkError::Tokenization(e.to_string()))
        }
    }

    pub fn chars() -> SharedCounter {
        Arc::new(CharCounter)
    }

    pub fn bytes() -> SharedCounter {
        Arc::new(ByteCounter)
    }

    pub fn tiktoken() -> SharedCounter {
        TiktokenCounter::new().unwrap().shared()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_tiktoken_round_trip() {
        let counter = TiktokenCounter::new().unwrap();
        for text in [
            "",
            "Hello, world!",
            "제36조(건설업의 등록) ① 건설업을 하려는 자는 국토교통부장관에게 등록하여야 한다.",
            "Article 3-2 (1) Mixed 한글 and English ②",
        ] {
            let ids = counter.encode(text);
            assert_eq!(counter.count_tokens(text), ids.len());
            assert_eq!(counter.decode(&ids).unwrap(), text);
        }
    }

    #[test]
    fn test_model_name_resolves() {
        let counter = TiktokenCounter::with_encoding("gpt-4").unwrap();
        assert_eq!(counter.encoding(), "gpt-4");
        assert!(counter.count_tokens("hello") > 0);
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let err = TiktokenCounter::with_encoding("no-such-vocabulary").err().unwrap();
        assert!(matches!(err, ChunkError::InvalidConfig(_)));
    }

    #[test]
    fn test_decode_prefix_backs_off_partial_characters() {
        let counter = ByteCounter;
        // "가" is three bytes; a 4-token limit must stop after the first char.
        let ids = counter.encode("가나");
        let (used, text) = decode_prefix(&counter, &ids, 4);
        assert_eq!(used, 3);
        assert_eq!(text, "가");

        let (used, text) = decode_prefix(&counter, &ids, 2);
        assert_eq!(used, 0);
        assert_eq!(text, "");
    }

    #[test]
    fn test_decode_smallest_prefix_extends_to_whole_character() {
        let counter = ByteCounter;
        let ids = counter.encode("뷁a");
        assert_eq!(decode_smallest_prefix(&counter, &ids), Some((3, "뷁".to_string())));
        assert_eq!(decode_smallest_prefix(&counter, &ids[..2]), None);
        assert_eq!(decode_smallest_prefix(&counter, &[]), None);
    }

    #[test]
    fn test_decode_prefix_char_counter() {
        let counter = CharCounter;
        let ids = counter.encode("abcdef");
        assert_eq!(decode_prefix(&counter, &ids, 3), (3, "abc".to_string()));
        assert_eq!(decode_prefix(&counter, &ids, 100), (6, "abcdef".to_string()));
    }
}
