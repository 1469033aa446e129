//! Fast tier in front of a slow tier, behind the same contract

use crate::clock::SharedClock;
use crate::durable::DurableCache;
use crate::entry::CacheEntry;
use crate::memory::{CacheStats, MemoryCache};
use crate::tier::{CacheTier, DEFAULT_TTL};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Which tier answered a lookup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TierHit {
    Memory,
    Durable,
}

/// Memory tier over a durable tier
///
/// Reads check memory first, then the durable tier; a durable hit is copied
/// back into memory for the entry's remaining lifetime.
pub struct TieredCache<T> {
    fast: MemoryCache<T>,
    slow: DurableCache<T>,
    fast_ttl: Duration,
    slow_ttl: Duration,
    clock: SharedClock,
}

impl<T> TieredCache<T>
where
    T: Clone + Send + Serialize + DeserializeOwned,
{
    pub fn new(fast: MemoryCache<T>, slow: DurableCache<T>, clock: SharedClock) -> Self {
        Self {
            fast,
            slow,
            fast_ttl: DEFAULT_TTL,
            slow_ttl: DEFAULT_TTL,
            clock,
        }
    }

    /// Override the per-tier TTLs used by [`TieredCache::put`]
    pub fn with_ttls(mut self, fast_ttl: Duration, slow_ttl: Duration) -> Self {
        self.fast_ttl = fast_ttl;
        self.slow_ttl = slow_ttl;
        self
    }

    pub fn fast(&self) -> &MemoryCache<T> {
        &self.fast
    }

    pub fn slow(&self) -> &DurableCache<T> {
        &self.slow
    }

    pub fn memory_stats(&self) -> CacheStats {
        self.fast.stats()
    }

    /// Look up `key` and report which tier served it
    pub fn lookup(&self, key: &str) -> Option<(T, TierHit)> {
        self.lookup_entry(key)
            .map(|(entry, tier)| (entry.value, tier))
    }

    /// Memory first; a durable hit is copied into memory for what is left
    /// of its lifetime, capped at the memory TTL
    fn lookup_entry(&self, key: &str) -> Option<(CacheEntry<T>, TierHit)> {
        if let Some(entry) = self.fast.get_entry(key) {
            return Some((entry, TierHit::Memory));
        }

        let entry = self.slow.get_entry(key)?;
        let remaining = entry.remaining(self.clock.now_millis()).min(self.fast_ttl);
        if !remaining.is_zero() {
            self.fast.set(key, entry.value.clone(), remaining);
        }
        Some((entry, TierHit::Durable))
    }

    /// Write both tiers with their own default TTLs
    pub fn put(&self, key: &str, value: T) {
        self.fast.set(key, value.clone(), self.fast_ttl);
        self.slow.set(key, value, self.slow_ttl);
    }
}

impl<T> CacheTier<T> for TieredCache<T>
where
    T: Clone + Send + Serialize + DeserializeOwned,
{
    fn get_entry(&self, key: &str) -> Option<CacheEntry<T>> {
        self.lookup_entry(key).map(|(entry, _)| entry)
    }

    fn set(&self, key: &str, value: T, ttl: Duration) {
        self.fast.set(key, value.clone(), ttl);
        self.slow.set(key, value, ttl);
    }

    fn delete(&self, key: &str) {
        self.fast.delete(key);
        self.slow.delete(key);
    }

    fn clear(&self) {
        self.fast.clear();
        self.slow.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    struct Fixture {
        cache: TieredCache<String>,
        store: Arc<MemoryStore>,
        clock: ManualClock,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new(0);
        let shared: SharedClock = Arc::new(clock.clone());
        let store = Arc::new(MemoryStore::new());
        let fast = MemoryCache::with_clock(8, shared.clone());
        let slow = DurableCache::with_clock(store.clone(), "t", shared.clone());
        Fixture {
            cache: TieredCache::new(fast, slow, shared),
            store,
            clock,
        }
    }

    #[test]
    fn memory_answers_first() {
        let f = fixture();
        f.cache.put("a", "1".into());
        assert_eq!(f.cache.lookup("a"), Some(("1".into(), TierHit::Memory)));
    }

    #[test]
    fn durable_hit_repopulates_memory() {
        let f = fixture();
        f.cache.put("a", "1".into());
        f.cache.fast().clear();

        assert_eq!(f.cache.lookup("a"), Some(("1".into(), TierHit::Durable)));
        assert_eq!(f.cache.lookup("a"), Some(("1".into(), TierHit::Memory)));
    }

    #[test]
    fn repopulated_entry_keeps_remaining_ttl() {
        let f = fixture();
        f.cache.set("a", "1".into(), Duration::from_secs(10));
        f.cache.fast().clear();
        f.clock.advance(Duration::from_secs(8));

        assert!(f.cache.get("a").is_some());
        f.clock.advance(Duration::from_secs(3));
        assert!(f.cache.fast().get("a").is_none());
        assert!(f.cache.get("a").is_none());
    }

    #[test]
    fn get_and_lookup_repopulate_alike() {
        let f = fixture();
        f.cache.set("a", "1".into(), Duration::from_secs(10));
        f.cache.set("b", "2".into(), Duration::from_secs(10));
        f.cache.fast().clear();
        f.clock.advance(Duration::from_secs(4));

        assert_eq!(f.cache.lookup("a"), Some(("1".into(), TierHit::Durable)));
        assert!(f.cache.get("b").is_some());

        f.clock.advance(Duration::from_secs(5));
        assert_eq!(f.cache.lookup("a"), Some(("1".into(), TierHit::Memory)));
        assert_eq!(f.cache.lookup("b"), Some(("2".into(), TierHit::Memory)));
    }

    #[test]
    fn durable_survives_new_memory_tier() {
        let f = fixture();
        f.cache.put("a", "1".into());

        // A fresh process: new memory tier, same durable backend
        let shared: SharedClock = Arc::new(f.clock.clone());
        let reopened: TieredCache<String> = TieredCache::new(
            MemoryCache::with_clock(8, shared.clone()),
            DurableCache::with_clock(f.store.clone(), "t", shared.clone()),
            shared,
        );
        assert_eq!(reopened.lookup("a"), Some(("1".into(), TierHit::Durable)));
    }

    #[test]
    fn delete_and_clear_hit_both_tiers() {
        let f = fixture();
        f.cache.put("a", "1".into());
        f.cache.put("b", "2".into());

        f.cache.delete("a");
        assert!(f.cache.get("a").is_none());

        f.cache.clear();
        assert!(f.cache.get("b").is_none());
        assert!(f.store.is_empty());
    }
}
