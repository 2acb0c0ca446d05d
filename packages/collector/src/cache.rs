//! Bounded LRU cache with time-based expiry.
//!
//! Used to avoid redundant network calls for identical search queries and
//! fetched pages. Caches are process-memory only: a miss is never an error,
//! it just degrades to recomputation.

use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Derive a cache key by hashing the call's identifying arguments.
///
/// Arguments are length-prefixed before hashing so `["ab", "c"]` and
/// `["a", "bc"]` produce distinct keys.
pub fn cache_key(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

struct Entry<T> {
    value: T,
    inserted_at: Instant,
}

/// A bounded least-recently-used cache with per-entry TTL.
///
/// Insertion order of the inner `IndexMap` doubles as recency order:
/// the front is always the least recently used entry. All operations
/// take the lock for their full duration, so a concurrent reader never
/// observes a half-updated entry.
pub struct ResponseCache<T> {
    entries: Mutex<IndexMap<String, Entry<T>>>,
    capacity: usize,
    ttl: Duration,
}

impl<T: Clone> ResponseCache<T> {
    /// Create a cache with the given capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Look up a key, refreshing its recency on a hit.
    ///
    /// Expired entries are removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = entries.shift_remove(key)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        let value = entry.value.clone();
        entries.insert(key.to_string(), entry);
        Some(value)
    }

    /// Insert a value, evicting the least-recently-used entry at capacity.
    ///
    /// Inserting over an existing key refreshes both its recency position
    /// and its timestamp.
    pub fn insert(&self, key: impl Into<String>, value: T) {
        let key = key.into();
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.shift_remove(&key);
        if entries.len() >= self.capacity {
            entries.shift_remove_index(0);
        }
        entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop all entries.
    pub fn clear(&self) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.clear();
    }

    /// Number of entries currently stored (including expired-but-unswept).
    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_deterministic() {
        let a = cache_key(&["search", "iit bombay"]);
        let b = cache_key(&["search", "iit bombay"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_boundary_sensitive() {
        assert_ne!(cache_key(&["ab", "c"]), cache_key(&["a", "bc"]));
    }

    #[test]
    fn test_get_after_set_returns_value() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        cache.insert("k", 42);
        assert_eq!(cache.get("k"), Some(42));
    }

    #[test]
    fn test_expired_entry_is_absent() {
        let cache = ResponseCache::new(10, Duration::from_millis(20));
        cache.insert("k", 1);
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);
        // Touch "a" so "b" becomes the LRU entry.
        assert_eq!(cache.get("a"), Some(1));
        cache.insert("c", 3);

        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reinsert_refreshes_recency() {
        let cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 10);
        cache.insert("c", 3);

        // "b" was least recently used once "a" was rewritten.
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::new(4, Duration::from_secs(60));
        cache.insert("a", 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
