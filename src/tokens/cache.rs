//! Bounded LRU cache for token counts
//!
//! Cached counts are a pure function of the input text, so concurrent
//! writes for the same key are harmless: a race produces either a hit or a
//! recomputation of the same value, never an incorrect result.

use std::collections::HashMap;
use std::sync::Mutex;

/// Maximum number of cached entries
pub const TOKEN_CACHE_CAPACITY: usize = 1000;

/// Inputs at or below this length are cheaper to recount than to hash and store
pub const TOKEN_CACHE_MIN_TEXT_LEN: usize = 100;

#[derive(Debug, Clone)]
struct CacheEntry {
    count: usize,
    last_used: u64,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    clock: u64,
}

/// LRU cache keyed by the exact input string
pub struct TokenCountCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl TokenCountCache {
    /// Create a new cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                clock: 0,
            }),
            capacity,
        }
    }

    /// Get a cached count if available, refreshing its recency
    pub fn get(&self, text: &str) -> Option<usize> {
        if text.len() <= TOKEN_CACHE_MIN_TEXT_LEN {
            return None;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.clock += 1;
        let clock = inner.clock;

        inner.entries.get_mut(text).map(|entry| {
            entry.last_used = clock;
            entry.count
        })
    }

    /// Store a count, evicting the least recently used entry at capacity
    pub fn store(&self, text: &str, count: usize) {
        if text.len() <= TOKEN_CACHE_MIN_TEXT_LEN {
            return;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.clock += 1;
        let clock = inner.clock;

        if inner.entries.len() >= self.capacity && !inner.entries.contains_key(text) {
            Self::evict_lru(&mut inner.entries);
        }

        inner.entries.insert(
            text.to_string(),
            CacheEntry {
                count,
                last_used: clock,
            },
        );
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict the least recently used entry
    fn evict_lru(entries: &mut HashMap<String, CacheEntry>) {
        if let Some(lru_key) = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone())
        {
            entries.remove(&lru_key);
        }
    }
}

impl Default for TokenCountCache {
    fn default() -> Self {
        Self::new(TOKEN_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(fill: char) -> String {
        std::iter::repeat(fill).take(150).collect()
    }

    #[test]
    fn test_short_strings_are_not_cached() {
        let cache = TokenCountCache::default();
        cache.store("short", 3);
        assert!(cache.is_empty());
        assert_eq!(cache.get("short"), None);
    }

    #[test]
    fn test_long_strings_are_cached() {
        let cache = TokenCountCache::default();
        let text = long_text('a');
        cache.store(&text, 42);
        assert_eq!(cache.get(&text), Some(42));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = TokenCountCache::new(2);
        cache.store(&long_text('a'), 1);
        cache.store(&long_text('b'), 2);
        cache.store(&long_text('c'), 3);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_eviction_is_least_recently_used() {
        let cache = TokenCountCache::new(2);
        let a = long_text('a');
        let b = long_text('b');
        let c = long_text('c');

        cache.store(&a, 1);
        cache.store(&b, 2);
        // Touch `a` so `b` becomes the LRU entry
        assert_eq!(cache.get(&a), Some(1));
        cache.store(&c, 3);

        assert_eq!(cache.get(&a), Some(1));
        assert_eq!(cache.get(&b), None);
        assert_eq!(cache.get(&c), Some(3));
    }
}
