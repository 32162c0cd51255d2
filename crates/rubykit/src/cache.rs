//! In-memory cache with per-entry expiry
//!
//! The cache is constructed once by whoever assembles the client and shared
//! through an [`Arc`]. Entries are evicted lazily: a read that finds an
//! expired entry removes it and reports a miss.

use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Type-erased cached value, used by the client to store any record list
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Cache shared between clients
pub type SharedCache = Arc<TtlCache<AnyValue>>;

/// Cached value with its absolute expiry; `None` never expires
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Thread-safe key/value store with TTL-based invalidation
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TtlCache<V> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store a value that expires after `ttl`
    ///
    /// A `ttl` too large to represent as an instant keeps the entry until it
    /// is cleared.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, including ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> TtlCache<V> {
    /// Get a value if present and not expired
    ///
    /// An expired entry is removed under the same lock acquisition.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => entry.is_expired(Instant::now()),
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }
}

impl TtlCache<AnyValue> {
    /// Get a value and downcast it to the type it was stored with
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get(key)?.downcast_ref::<T>().cloned()
    }

    /// Store a typed value
    pub fn set_as<T>(&self, key: impl Into<String>, value: T, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        self.set(key, Arc::new(value) as AnyValue, ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_get_returns_fresh_value() {
        let cache = TtlCache::new();
        cache.set("k", 42, Duration::from_millis(100));
        assert_eq!(cache.get("k"), Some(42));
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let cache = TtlCache::new();
        cache.set("k", "v".to_string(), Duration::from_millis(100));
        thread::sleep(Duration::from_millis(150));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_is_immediately_stale() {
        let cache = TtlCache::new();
        cache.set("k", 1, Duration::ZERO);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let cache = TtlCache::new();
        cache.set("k", 1, Duration::MAX);
        cache.set("s", 2, Duration::from_secs(u64::MAX));
        assert_eq!(cache.get("k"), Some(1));
        assert_eq!(cache.get("s"), Some(2));
    }

    #[test]
    fn test_clear() {
        let cache = TtlCache::new();
        cache.set("a", 1, Duration::from_secs(60));
        cache.set("b", 2, Duration::from_secs(60));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_typed_access() {
        let cache: TtlCache<AnyValue> = TtlCache::new();
        cache.set_as("versions", vec!["1.0.0".to_string()], Duration::from_secs(60));

        assert_eq!(
            cache.get_as::<Vec<String>>("versions"),
            Some(vec!["1.0.0".to_string()])
        );
        // Wrong type reads as a miss
        assert_eq!(cache.get_as::<u32>("versions"), None);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(TtlCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..100 {
                        let key = format!("{}-{}", i, j);
                        cache.set(key.clone(), j, Duration::from_secs(60));
                        assert_eq!(cache.get(&key), Some(j));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }
}
