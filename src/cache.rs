//! Positive/negative TTL cache for item summaries.
//!
//! Every entry carries its own absolute expiry. Expired entries are evicted
//! lazily when read; there is no background sweep. Expiry follows the tokio
//! clock, which is the system clock outside a paused runtime.

use crate::amazon::models::ItemSummary;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// A resolved item.
    Hit(ItemSummary),
    /// The key was recently looked up and had no value.
    Absent,
    /// Nothing usable cached.
    Miss,
}

/// Value stored for a key.
#[derive(Debug, Clone, PartialEq)]
pub enum Cached {
    Found(ItemSummary),
    Absent,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Cached,
    expires_at: Instant,
}

/// Storage for item lookups, shared across calls.
pub trait SummaryCache: Send + Sync {
    fn get(&self, key: &str) -> Lookup;

    /// Stores `value` until `now + ttl`, replacing any previous entry.
    fn set(&self, key: &str, value: Cached, ttl: Duration);
}

/// In-memory [`SummaryCache`] guarded by a mutex.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance used when no cache is injected.
    pub fn shared() -> Arc<MemoryCache> {
        static SHARED: OnceLock<Arc<MemoryCache>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(MemoryCache::new())).clone()
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl SummaryCache for MemoryCache {
    fn get(&self, key: &str) -> Lookup {
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            None => return Lookup::Miss,
            Some(entry) => entry.expires_at <= Instant::now(),
        };

        if expired {
            trace!("Evicting expired entry: {}", key);
            entries.remove(key);
            return Lookup::Miss;
        }

        match entries.get(key).map(|e| &e.value) {
            Some(Cached::Found(summary)) => Lookup::Hit(summary.clone()),
            Some(Cached::Absent) => Lookup::Absent,
            None => Lookup::Miss,
        }
    }

    fn set(&self, key: &str, value: Cached, ttl: Duration) {
        let entry = CacheEntry { value, expires_at: Instant::now() + ttl };
        self.entries.lock().insert(key.to_string(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: Duration = Duration::from_secs(60);

    #[test]
    fn test_miss_on_empty() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("B08N5WRWNW"), Lookup::Miss);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_round_trip_positive() {
        let cache = MemoryCache::new();
        let summary = ItemSummary::new("B08N5WRWNW");

        cache.set("B08N5WRWNW", Cached::Found(summary.clone()), LONG);
        assert_eq!(cache.get("B08N5WRWNW"), Lookup::Hit(summary));
    }

    #[test]
    fn test_round_trip_absent() {
        let cache = MemoryCache::new();
        cache.set("B08N5WRWNW", Cached::Absent, LONG);
        assert_eq!(cache.get("B08N5WRWNW"), Lookup::Absent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_replaces_whole_entry() {
        let cache = MemoryCache::new();
        cache.set("B08N5WRWNW", Cached::Absent, Duration::from_secs(1));
        cache.set("B08N5WRWNW", Cached::Found(ItemSummary::new("B08N5WRWNW")), LONG);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(matches!(cache.get("B08N5WRWNW"), Lookup::Hit(_)));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_miss_and_evicted() {
        let cache = MemoryCache::new();
        let summary = ItemSummary::new("B08N5WRWNW");
        cache.set("B08N5WRWNW", Cached::Found(summary), Duration::from_secs(30 * 60));

        tokio::time::advance(Duration::from_secs(30 * 60 - 1)).await;
        assert!(matches!(cache.get("B08N5WRWNW"), Lookup::Hit(_)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("B08N5WRWNW"), Lookup::Miss);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_entry_expires_on_its_own_ttl() {
        let cache = MemoryCache::new();
        cache.set("B000MISSNG", Cached::Absent, Duration::from_secs(5 * 60));

        tokio::time::advance(Duration::from_secs(4 * 60)).await;
        assert_eq!(cache.get("B000MISSNG"), Lookup::Absent);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cache.get("B000MISSNG"), Lookup::Miss);
    }

    #[test]
    fn test_zero_ttl_is_never_served() {
        let cache = MemoryCache::new();
        cache.set("B08N5WRWNW", Cached::Absent, Duration::ZERO);
        assert_eq!(cache.get("B08N5WRWNW"), Lookup::Miss);
    }

    #[test]
    fn test_clear() {
        let cache = MemoryCache::new();
        cache.set("A", Cached::Absent, LONG);
        cache.set("B", Cached::Absent, LONG);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shared_instance_is_reused() {
        let a = MemoryCache::shared();
        let b = MemoryCache::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
