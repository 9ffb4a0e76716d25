//! Token counting for a target tokenizer with a bounded LRU cache

pub mod cache;
pub mod counter;

pub use cache::{TokenCountCache, TOKEN_CACHE_CAPACITY, TOKEN_CACHE_MIN_TEXT_LEN};
pub use counter::{
    count_tokens, count_tokens_json, default_counter, TokenCounter, DEFAULT_FUDGE_FACTOR,
};
