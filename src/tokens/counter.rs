//! Token counting using tiktoken with a provider fudge factor

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Serialize;
use tiktoken_rs::{cl100k_base, CoreBPE};
use tracing::warn;

use super::cache::TokenCountCache;

/// Multiplier correcting cl100k_base lengths to the target model family's
/// actual token accounting
pub const DEFAULT_FUDGE_FACTOR: f64 = 1.35;

/// Characters per token assumed when the tokenizer is unavailable
const FALLBACK_CHARS_PER_TOKEN: usize = 3;

/// Token counter with a bounded LRU cache
///
/// Counts are `floor(tokenizer_len * fudge)`; if tokenizer initialization
/// failed, a length-based heuristic is used instead. Never panics or errors.
pub struct TokenCounter {
    bpe: Option<Arc<CoreBPE>>,
    fudge: f64,
    cache: TokenCountCache,
}

impl TokenCounter {
    /// Create a counter with an explicit fudge factor and cache
    pub fn new(fudge: f64, cache: TokenCountCache) -> Self {
        let bpe = match cl100k_base() {
            Ok(bpe) => Some(Arc::new(bpe)),
            Err(e) => {
                warn!("Tokenizer initialization failed, using length heuristic: {e}");
                None
            }
        };
        Self { bpe, fudge, cache }
    }

    /// Count the tokens in a text
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        if let Some(cached) = self.cache.get(text) {
            return cached;
        }

        let count = match &self.bpe {
            Some(bpe) => {
                let len = bpe.encode_with_special_tokens(text).len();
                (len as f64 * self.fudge).floor() as usize
            }
            None => fallback_count(text),
        };

        // Best-effort write; a concurrent writer stores the same value
        self.cache.store(text, count);
        count
    }

    /// Count the tokens of a value's JSON serialization
    pub fn count_json<T: Serialize>(&self, value: &T) -> usize {
        serde_json::to_string(value)
            .map(|json| self.count(&json))
            .unwrap_or(0)
    }

    /// Count tokens per file content; absent content counts as zero
    pub fn count_files(
        &self,
        contents: &HashMap<String, Option<String>>,
    ) -> HashMap<String, usize> {
        contents
            .iter()
            .map(|(path, content)| {
                let count = content.as_deref().map_or(0, |text| self.count(text));
                (path.clone(), count)
            })
            .collect()
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(DEFAULT_FUDGE_FACTOR, TokenCountCache::default())
    }
}

/// Length-based estimate used when the tokenizer is unavailable
pub(crate) fn fallback_count(text: &str) -> usize {
    text.len().div_ceil(FALLBACK_CHARS_PER_TOKEN)
}

static DEFAULT_COUNTER: Lazy<TokenCounter> = Lazy::new(TokenCounter::default);

/// Process-wide counter backing [`count_tokens`] and [`count_tokens_json`]
pub fn default_counter() -> &'static TokenCounter {
    &DEFAULT_COUNTER
}

/// Count tokens with the process-wide counter
pub fn count_tokens(text: &str) -> usize {
    DEFAULT_COUNTER.count(text)
}

/// Count the JSON serialization of a value with the process-wide counter
pub fn count_tokens_json<T: Serialize>(value: &T) -> usize {
    DEFAULT_COUNTER.count_json(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_is_positive_for_text() {
        let counter = TokenCounter::default();
        let tokens = counter.count("Hello, world! This is a test.");
        assert!(tokens > 0);
        assert!(tokens < 20);
    }

    #[test]
    fn test_empty_text_counts_zero() {
        let counter = TokenCounter::default();
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn test_count_is_deterministic() {
        let counter = TokenCounter::default();
        let text = "fn main() { println!(\"hello\"); }".repeat(10);
        assert_eq!(counter.count(&text), counter.count(&text));
    }

    #[test]
    fn test_fudge_factor_scales_counts() {
        let plain = TokenCounter::new(1.0, TokenCountCache::default());
        let fudged = TokenCounter::new(2.0, TokenCountCache::default());
        let text = "a reasonably long sentence about token accounting";
        assert_eq!(fudged.count(text), plain.count(text) * 2);
    }

    #[test]
    fn test_count_json_includes_quoting() {
        let counter = TokenCounter::default();
        let text = "hello world";
        assert!(counter.count_json(&text) >= counter.count(text));
    }

    #[test]
    fn test_fallback_count_is_ceil_of_thirds() {
        assert_eq!(fallback_count(""), 0);
        assert_eq!(fallback_count("ab"), 1);
        assert_eq!(fallback_count("abc"), 1);
        assert_eq!(fallback_count("abcd"), 2);
    }

    #[test]
    fn test_count_files_maps_missing_to_zero() {
        let counter = TokenCounter::default();
        let mut contents = HashMap::new();
        contents.insert("a.rs".to_string(), Some("fn main() {}".to_string()));
        contents.insert("b.rs".to_string(), None);

        let counts = counter.count_files(&contents);
        assert!(counts["a.rs"] > 0);
        assert_eq!(counts["b.rs"], 0);
    }

    #[test]
    fn test_long_inputs_hit_the_cache() {
        let counter = TokenCounter::new(DEFAULT_FUDGE_FACTOR, TokenCountCache::default());
        let text = "let x = 1; ".repeat(30);
        let first = counter.count(&text);
        let second = counter.count(&text);
        assert_eq!(first, second);
    }
}
