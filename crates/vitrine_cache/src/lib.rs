//! Vitrine Cache
//!
//! Two cache tiers sharing one contract ([`CacheTier`]):
//!
//! - [`MemoryCache`]: LRU-bounded, TTL checked on read, hit/miss counters
//! - [`DurableCache`]: JSON records in a [`KeyValueStore`] ([`FileStore`] or
//!   [`MemoryStore`]), shared across processes using the same directory
//!
//! [`TieredCache`] composes them: memory first, durable second, durable hits
//! repopulating memory. Storage failures never escape a tier.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vitrine_cache::{
//!     system_clock, CacheTier, DurableCache, MemoryCache, MemoryStore, TieredCache,
//! };
//!
//! let clock = system_clock();
//! let cache: TieredCache<String> = TieredCache::new(
//!     MemoryCache::with_clock(16, clock.clone()),
//!     DurableCache::with_clock(Arc::new(MemoryStore::new()), "demo", clock.clone()),
//!     clock,
//! );
//!
//! cache.set("greeting", "hello".to_string(), Duration::from_secs(60));
//! assert_eq!(cache.get("greeting").as_deref(), Some("hello"));
//! ```

mod clock;
mod durable;
mod entry;
mod error;
mod memory;
mod store;
mod tier;
mod tiered;

pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use durable::DurableCache;
pub use entry::CacheEntry;
pub use error::StorageError;
pub use memory::{CacheStats, MemoryCache, DEFAULT_CAPACITY};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use tier::{CacheTier, DEFAULT_TTL};
pub use tiered::{TierHit, TieredCache};
