//! Forced token-window splitting, the last-resort splitter.

use tracing::debug;

use super::base::{decode_smallest_prefix, SharedCounter, TextSplitter};
use crate::error::{ChunkError, Result};

/// Splits text into consecutive windows of at most `max_tokens` tokens.
///
/// This splitter does not look at structure at all. It is deterministic and
/// accepts arbitrarily long input, which makes it the backstop for every
/// other splitter.
///
/// Window edges are moved back to the nearest token boundary that decodes to
/// valid text, so multi-byte characters are never cut in half and the
/// windows concatenate back to the original text.
pub struct ForcedWindowSplitter {
    counter: SharedCounter,
}

impl ForcedWindowSplitter {
    /// Create a new window splitter over the given vocabulary.
    pub fn new(counter: SharedCounter) -> Self {
        Self { counter }
    }

    /// Split `text` into windows, emitting each one as `prefix + window`.
    ///
    /// The prefix counts against the budget. If the prefix leaves no room
    /// for some whole character of the text, the prefix and the text are
    /// windowed together instead, so no window is pushed over budget by the
    /// prefix.
    pub fn split_with_prefix(
        &self,
        prefix: &str,
        text: &str,
        max_tokens: usize,
    ) -> Result<Vec<String>> {
        if max_tokens == 0 {
            return Err(ChunkError::InvalidConfig(
                "max_tokens must be at least 1".to_string(),
            ));
        }

        let tokens = self.counter.encode(text);
        if tokens.is_empty() {
            return Ok(vec![]);
        }

        let prefix_tokens = self.counter.count_tokens(prefix);
        if !prefix.is_empty() && prefix_tokens >= max_tokens {
            debug!(
                prefix_tokens,
                max_tokens,
                "Prefix fills the budget, windowing it with the text"
            );
            return self.split_with_prefix("", &format!("{prefix}{text}"), max_tokens);
        }
        let window_budget = max_tokens - prefix_tokens;

        let mut windows = Vec::new();
        let mut start = 0;

        while start < tokens.len() {
            let fitted = self.fit_window(prefix, &tokens, start, window_budget, max_tokens);
            let (end, piece) = match fitted {
                Some(found) => found,
                None if !prefix.is_empty() => {
                    debug!(
                        start,
                        max_tokens,
                        "Prefix leaves no room for a whole character, dropping it"
                    );
                    return self.split_with_prefix("", &format!("{prefix}{text}"), max_tokens);
                }
                None => self.smallest_window(&tokens, start)?,
            };

            windows.push(format!("{prefix}{piece}"));
            start = end;
        }

        Ok(windows)
    }

    /// Find the largest window starting at `start` that decodes and, with the
    /// prefix, stays within `max_tokens`.
    fn fit_window(
        &self,
        prefix: &str,
        tokens: &[usize],
        start: usize,
        window_budget: usize,
        max_tokens: usize,
    ) -> Option<(usize, String)> {
        let mut end = (start + window_budget).min(tokens.len());

        while end > start {
            if let Ok(piece) = self.counter.decode(&tokens[start..end]) {
                // Re-tokenizing a window can merge differently at its edges.
                if self.counter.count_tokens(&format!("{prefix}{piece}")) <= max_tokens {
                    return Some((end, piece));
                }
            }
            end -= 1;
        }

        None
    }

    /// Smallest decodable window starting at `start`.
    ///
    /// Only reached when a single character does not fit the budget; the
    /// window then exceeds `max_tokens` rather than cutting the character.
    fn smallest_window(&self, tokens: &[usize], start: usize) -> Result<(usize, String)> {
        let (used, piece) = decode_smallest_prefix(self.counter.as_ref(), &tokens[start..])
            .ok_or_else(|| {
                ChunkError::Tokenization(format!(
                    "token sequence starting at {start} does not decode to text"
                ))
            })?;

        debug!(start, tokens = used, "Window exceeds budget to keep a character whole");
        Ok((start + used, piece))
    }
}

impl TextSplitter for ForcedWindowSplitter {
    fn name(&self) -> &'static str {
        "window"
    }

    fn split(&self, text: &str, max_tokens: usize) -> Result<Vec<String>> {
        self.split_with_prefix("", text, max_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunkers::base::testing;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_content() {
        let splitter = ForcedWindowSplitter::new(testing::chars());
        assert!(splitter.split("", 10).unwrap().is_empty());
    }

    #[test]
    fn test_exact_windows() {
        let splitter = ForcedWindowSplitter::new(testing::chars());
        let windows = splitter.split("abcdefghij", 4).unwrap();
        assert_eq!(windows, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let splitter = ForcedWindowSplitter::new(testing::chars());
        assert!(splitter.split("abc", 0).is_err());
    }

    #[test]
    fn test_prefix_counts_against_budget() {
        let splitter = ForcedWindowSplitter::new(testing::chars());
        let windows = splitter.split_with_prefix("H ", "abcdef", 5).unwrap();
        assert_eq!(windows, vec!["H abc", "H def"]);
    }

    #[test]
    fn test_oversized_prefix_falls_back_to_plain_windows() {
        let splitter = ForcedWindowSplitter::new(testing::chars());
        let windows = splitter.split_with_prefix("HEADER ", "ab", 3).unwrap();
        assert_eq!(windows.concat(), "HEADER ab");
        assert!(windows.iter().all(|w| w.chars().count() <= 3));
    }

    #[test]
    fn test_prefix_dropped_when_no_character_fits_beside_it() {
        let counter = testing::bytes();
        let splitter = ForcedWindowSplitter::new(counter.clone());
        // "H " leaves two bytes, and every syllable needs three.
        let windows = splitter.split_with_prefix("H ", "가나", 4).unwrap();
        assert_eq!(windows, vec!["H ", "가", "나"]);
        for window in &windows {
            assert!(counter.count_tokens(window) <= 4, "over budget: {window:?}");
        }
        assert_eq!(windows.concat(), "H 가나");
    }

    #[test]
    fn test_prefix_kept_when_characters_fit() {
        let splitter = ForcedWindowSplitter::new(testing::bytes());
        let windows = splitter.split_with_prefix("H ", "가나", 5).unwrap();
        assert_eq!(windows, vec!["H 가", "H 나"]);
    }

    #[test]
    fn test_never_cuts_multibyte_characters() {
        let splitter = ForcedWindowSplitter::new(testing::bytes());
        let text = "가나다라마바사";
        let windows = splitter.split(text, 7).unwrap();
        // Each Hangul syllable is 3 bytes, so a 7-byte window holds two.
        assert_eq!(windows, vec!["가나", "다라", "마바", "사"]);
        assert_eq!(windows.concat(), text);
    }

    #[test]
    fn test_budget_smaller_than_a_character() {
        let splitter = ForcedWindowSplitter::new(testing::bytes());
        let windows = splitter.split("가a", 2).unwrap();
        assert_eq!(windows, vec!["가", "a"]);
    }

    #[test]
    fn test_tiktoken_windows_within_budget() {
        let counter = testing::tiktoken();
        let splitter = ForcedWindowSplitter::new(counter.clone());
        let text = "건설업자는 건설공사를 성실하게 수행하여야 한다. ".repeat(200);
        let windows = splitter.split(&text, 50).unwrap();

        assert!(windows.len() > 1);
        for window in &windows {
            assert!(counter.count_tokens(window) <= 50);
        }
        assert_eq!(windows.concat(), text);
    }

    #[test]
    fn test_deterministic() {
        let splitter = ForcedWindowSplitter::new(testing::tiktoken());
        let text = "The contractor shall perform the works. ".repeat(100);
        assert_eq!(
            splitter.split(&text, 37).unwrap(),
            splitter.split(&text, 37).unwrap()
        );
    }
}
