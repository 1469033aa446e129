//! Fast in-process tier
//!
//! LRU-bounded map with TTL checked on every read. An expired read evicts the
//! entry and counts as a miss.

use crate::clock::{system_clock, SharedClock};
use crate::entry::CacheEntry;
use crate::tier::CacheTier;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Default number of entries kept in memory
pub const DEFAULT_CAPACITY: usize = 32;

/// Hit/miss counters for the memory tier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    /// Entries pushed out by the capacity bound
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the tier, 0.0 when there were none
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner<T> {
    entries: LruCache<String, CacheEntry<T>>,
    stats: CacheStats,
}

/// In-memory cache tier
pub struct MemoryCache<T> {
    inner: Mutex<Inner<T>>,
    clock: SharedClock,
}

impl<T: Clone + Send> MemoryCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, system_clock())
    }

    pub fn with_clock(capacity: usize, clock: SharedClock) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            clock,
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry whose key starts with `prefix`, returning how many
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.inner.lock();
        let doomed: Vec<String> = inner
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            inner.entries.pop(key);
        }
        if !doomed.is_empty() {
            tracing::debug!("MemoryCache: invalidated {} entries under {:?}", doomed.len(), prefix);
        }
        doomed.len()
    }
}

impl<T: Clone + Send> CacheTier<T> for MemoryCache<T> {
    fn get_entry(&self, key: &str) -> Option<CacheEntry<T>> {
        let now = self.clock.now_millis();
        let mut inner = self.inner.lock();

        let expired = inner.entries.peek(key).map(|entry| entry.is_expired(now));
        let Some(expired) = expired else {
            inner.stats.misses += 1;
            return None;
        };

        if expired {
            inner.entries.pop(key);
            inner.stats.expirations += 1;
            inner.stats.misses += 1;
            tracing::trace!("MemoryCache: {:?} expired", key);
            return None;
        }

        inner.stats.hits += 1;
        inner.entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: T, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now_millis(), ttl);
        let mut inner = self.inner.lock();
        if let Some((evicted, _)) = inner.entries.push(key.to_string(), entry) {
            if evicted != key {
                inner.stats.evictions += 1;
                tracing::trace!("MemoryCache: evicted {:?} at capacity", evicted);
            }
        }
    }

    fn delete(&self, key: &str) {
        self.inner.lock().entries.pop(key);
    }

    fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn cache(capacity: usize) -> (MemoryCache<String>, ManualClock) {
        let clock = ManualClock::new(10_000);
        (MemoryCache::with_clock(capacity, Arc::new(clock.clone())), clock)
    }

    #[test]
    fn hit_before_ttl_miss_after() {
        let (cache, clock) = cache(4);
        cache.set("warm-comfort", "v".into(), Duration::from_secs(60));

        clock.advance(Duration::from_millis(59_999));
        assert_eq!(cache.get("warm-comfort").as_deref(), Some("v"));

        clock.advance(Duration::from_millis(2));
        assert_eq!(cache.get("warm-comfort"), None);
        assert!(cache.is_empty(), "expired read must evict");

        // No resurrection even if the clock were rewound
        clock.set(10_000);
        assert_eq!(cache.get("warm-comfort"), None);
    }

    #[test]
    fn lru_bound_evicts_least_recent() {
        let (cache, _) = cache(2);
        let ttl = Duration::from_secs(60);
        cache.set("a", "1".into(), ttl);
        cache.set("b", "2".into(), ttl);
        assert!(cache.get("a").is_some());
        cache.set("c", "3".into(), ttl);

        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn overwrite_is_not_an_eviction() {
        let (cache, _) = cache(2);
        cache.set("a", "1".into(), Duration::from_secs(1));
        cache.set("a", "2".into(), Duration::from_secs(1));
        assert_eq!(cache.get("a").as_deref(), Some("2"));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let (cache, clock) = cache(4);
        cache.set("a", "1".into(), Duration::from_secs(1));
        cache.get("a");
        cache.get("missing");
        clock.advance(Duration::from_secs(2));
        cache.get("a");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expirations, 1);
        assert!((stats.hit_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn prefix_invalidation() {
        let (cache, _) = cache(8);
        let ttl = Duration::from_secs(60);
        cache.set("theme:a", "1".into(), ttl);
        cache.set("theme:b", "2".into(), ttl);
        cache.set("other", "3".into(), ttl);

        assert_eq!(cache.invalidate_prefix("theme:"), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn delete_and_clear() {
        let (cache, _) = cache(8);
        let ttl = Duration::from_secs(60);
        cache.set("a", "1".into(), ttl);
        cache.set("b", "2".into(), ttl);
        cache.delete("a");
        assert!(cache.get("a").is_none());
        cache.clear();
        assert!(cache.is_empty());
    }
}
