//! The contract every cache tier implements

use crate::entry::CacheEntry;
use std::time::Duration;

/// Default time-to-live for both tiers
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Shared get/set/delete/clear contract
///
/// Implementations are infallible from the caller's point of view: a backend
/// failure is a miss on read and a no-op on write.
pub trait CacheTier<T>: Send + Sync {
    /// Look up a live entry; an expired entry is evicted and reported as a miss
    fn get_entry(&self, key: &str) -> Option<CacheEntry<T>>;

    fn get(&self, key: &str) -> Option<T> {
        self.get_entry(key).map(|entry| entry.value)
    }

    fn set(&self, key: &str, value: T, ttl: Duration);

    fn delete(&self, key: &str);

    fn clear(&self);
}
