//! Slow tier over a durable key-value store
//!
//! Entries are JSON `{ "value": ..., "expires_at_ms": ... }` records keyed
//! `{namespace}:{key}`. Any backend or decode failure is logged and degraded:
//! reads become misses, writes become no-ops.

use crate::clock::{system_clock, SharedClock};
use crate::entry::CacheEntry;
use crate::error::StorageError;
use crate::store::KeyValueStore;
use crate::tier::CacheTier;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Durable cache tier
pub struct DurableCache<T> {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
    clock: SharedClock,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DurableCache<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self::with_clock(store, namespace, system_clock())
    }

    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        namespace: impl Into<String>,
        clock: SharedClock,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            clock,
            _marker: PhantomData,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn record_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn try_get(&self, record_key: &str) -> Result<Option<CacheEntry<T>>, StorageError> {
        let Some(raw) = self.store.read(record_key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(err) => {
                tracing::warn!("DurableCache: dropping corrupt record {:?}: {}", record_key, err);
                if let Err(err) = self.store.remove(record_key) {
                    tracing::warn!("DurableCache: failed to remove {:?}: {}", record_key, err);
                }
                Err(StorageError::Corrupt(record_key.to_string()))
            }
        }
    }

    fn try_set(&self, record_key: &str, entry: &CacheEntry<T>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entry)?;
        self.store.write(record_key, &raw)
    }

    fn try_clear(&self) -> Result<usize, StorageError> {
        let prefix = format!("{}:", self.namespace);
        let mut removed = 0;
        for key in self.store.keys()? {
            if key.starts_with(&prefix) {
                self.store.remove(&key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl<T> CacheTier<T> for DurableCache<T>
where
    T: Serialize + DeserializeOwned,
{
    fn get_entry(&self, key: &str) -> Option<CacheEntry<T>> {
        let record_key = self.record_key(key);
        let entry = match self.try_get(&record_key) {
            Ok(entry) => entry?,
            Err(err) => {
                tracing::warn!("DurableCache: read of {:?} failed, treating as miss: {}", record_key, err);
                return None;
            }
        };

        if entry.is_expired(self.clock.now_millis()) {
            tracing::trace!("DurableCache: {:?} expired", record_key);
            if let Err(err) = self.store.remove(&record_key) {
                tracing::warn!("DurableCache: failed to evict {:?}: {}", record_key, err);
            }
            return None;
        }

        Some(entry)
    }

    fn set(&self, key: &str, value: T, ttl: Duration) {
        let record_key = self.record_key(key);
        let entry = CacheEntry::new(value, self.clock.now_millis(), ttl);
        if let Err(err) = self.try_set(&record_key, &entry) {
            tracing::warn!("DurableCache: write of {:?} skipped: {}", record_key, err);
        }
    }

    fn delete(&self, key: &str) {
        let record_key = self.record_key(key);
        if let Err(err) = self.store.remove(&record_key) {
            tracing::warn!("DurableCache: delete of {:?} failed: {}", record_key, err);
        }
    }

    fn clear(&self) {
        match self.try_clear() {
            Ok(removed) => tracing::debug!("DurableCache: cleared {} records", removed),
            Err(err) => tracing::warn!("DurableCache: clear of {:?} failed: {}", self.namespace, err),
        }
    }
}
