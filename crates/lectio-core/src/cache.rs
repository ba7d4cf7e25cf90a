//! Generic cache-aside helper
//!
//! Every read path above the store computes a deterministic key from its
//! semantic parameters, checks here first, and populates on miss. Entries
//! expire after a TTL; expired entries are evicted lazily on access.
//! Callers tolerate staleness up to the TTL unless they invalidate
//! explicitly.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

/// Default entry time-to-live (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// In-memory TTL cache keyed by deterministic string keys
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache with the default TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a cache with a specific TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a fresh entry; evicts and misses when expired
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                debug!(key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(key, "cache entry expired");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value under a key, resetting its TTL
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.into(),
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop a single entry
    pub fn invalidate(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    /// Drop every entry whose key satisfies the predicate
    pub fn invalidate_where(&self, pred: impl Fn(&str) -> bool) {
        self.entries.lock().unwrap().retain(|key, _| !pred(key));
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Number of unexpired entries
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap();
        entries
            .values()
            .filter(|e| e.inserted_at.elapsed() < self.ttl)
            .count()
    }

    /// True when no unexpired entries remain
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.insert("a", 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_expiry() {
        let cache: TtlCache<i32> = TtlCache::with_ttl(Duration::from_millis(10));
        cache.insert("a", 1);
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_resets_ttl() {
        let cache: TtlCache<i32> = TtlCache::with_ttl(Duration::from_millis(50));
        cache.insert("a", 1);
        std::thread::sleep(Duration::from_millis(30));
        cache.insert("a", 2);
        std::thread::sleep(Duration::from_millis(30));
        // Still fresh: the second insert restarted the clock
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_invalidate() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.insert("a", 1);
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_invalidate_where() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.insert("fav=1|x", 1);
        cache.insert("fav=0|y", 2);
        cache.invalidate_where(|key| key.contains("fav=1"));
        assert_eq!(cache.get("fav=1|x"), None);
        assert_eq!(cache.get("fav=0|y"), Some(2));
    }

    #[test]
    fn test_clear() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
