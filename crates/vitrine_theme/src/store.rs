//! Theme store
//!
//! Owns the active theme, exposes it as a subscribable snapshot, and resolves
//! loads through the tiered cache before touching the network. Every load
//! settles to a usable theme: on failure the store falls back to the
//! persisted last-good theme, then the theme already applied, then the
//! built-in default.
//!
//! Overlapping loads are last-writer-wins unless
//! [`ThemeStoreBuilder::discard_stale_responses`] is set, in which case only
//! the most recently started load (or `set_theme`/`clear`) may change the
//! active theme.
//!
//! Mutations are serialized: a state change, its persisted record and its
//! notification happen as one step, so the stored record and the last
//! snapshot a subscriber saw always match `current_theme`. A listener may
//! call back into the store; the nested change is applied and notified
//! before the outer notification continues.

use crate::client::ThemeClient;
use crate::config::EngineConfig;
use crate::descriptor::{Palette, ThemeDescriptor, Typography};
use crate::error::{DescriptorError, FetchError};
use parking_lot::{ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use vitrine_cache::{
    system_clock, CacheStats, CacheTier, DurableCache, KeyValueStore, MemoryCache, MemoryStore,
    SharedClock, TierHit, TieredCache, DEFAULT_CAPACITY, DEFAULT_TTL,
};
use vitrine_core::{Subscribers, Subscription};

/// Durable key holding the persisted active theme
pub const DEFAULT_PERSIST_KEY: &str = "vitrine.theme.current";

/// Namespace of per-slug records in the durable cache tier
pub const CACHE_NAMESPACE: &str = "theme";

/// Coarse lifecycle of the store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThemePhase {
    /// No theme yet (cold start without a persisted theme, or after `clear`)
    Idle,
    /// At least one load is in flight; the previous theme stays applied
    Loading,
    Ready,
}

/// Snapshot handed to readers and subscribers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThemeStoreState {
    pub current_theme: Option<Arc<ThemeDescriptor>>,
    pub is_loading: bool,
    pub last_error: Option<FetchError>,
}

impl ThemeStoreState {
    pub fn phase(&self) -> ThemePhase {
        if self.is_loading {
            ThemePhase::Loading
        } else if self.current_theme.is_some() {
            ThemePhase::Ready
        } else {
            ThemePhase::Idle
        }
    }

    pub fn current_slug(&self) -> Option<&str> {
        self.current_theme.as_deref().map(ThemeDescriptor::slug)
    }
}

/// The single durable record owned by the store
#[derive(Clone, Debug, Serialize, Deserialize)]
struct PersistedTheme {
    slug: String,
    descriptor: ThemeDescriptor,
    saved_at_ms: u64,
    expires_at_ms: u64,
}

struct StoreInner {
    state: ThemeStoreState,
    in_flight: usize,
    /// Bumped by every load start, `set_theme` and `clear`
    generation: u64,
}

/// Active-theme store
pub struct ThemeStore {
    client: ThemeClient,
    cache: TieredCache<ThemeDescriptor>,
    backend: Arc<dyn KeyValueStore>,
    clock: SharedClock,
    persist_key: String,
    memory_ttl: Duration,
    durable_ttl: Duration,
    discard_stale: bool,
    default_theme: Arc<ThemeDescriptor>,
    inner: RwLock<StoreInner>,
    /// Held across mutate, persist and notify
    serial: ReentrantMutex<()>,
    subscribers: Subscribers<ThemeStoreState>,
}

/// Builder for [`ThemeStore`]
pub struct ThemeStoreBuilder {
    client: ThemeClient,
    backend: Option<Arc<dyn KeyValueStore>>,
    clock: Option<SharedClock>,
    memory_capacity: usize,
    memory_ttl: Duration,
    durable_ttl: Duration,
    persist_key: String,
    discard_stale: bool,
    default_theme: Option<ThemeDescriptor>,
}

impl ThemeStoreBuilder {
    fn new(client: ThemeClient) -> Self {
        Self {
            client,
            backend: None,
            clock: None,
            memory_capacity: DEFAULT_CAPACITY,
            memory_ttl: DEFAULT_TTL,
            durable_ttl: DEFAULT_TTL,
            persist_key: DEFAULT_PERSIST_KEY.to_string(),
            discard_stale: false,
            default_theme: None,
        }
    }

    /// Durable backend; in-memory when unset
    pub fn backend(mut self, backend: Arc<dyn KeyValueStore>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn memory_capacity(mut self, capacity: usize) -> Self {
        self.memory_capacity = capacity;
        self
    }

    pub fn ttls(mut self, memory: Duration, durable: Duration) -> Self {
        self.memory_ttl = memory;
        self.durable_ttl = durable;
        self
    }

    pub fn persist_key(mut self, key: impl Into<String>) -> Self {
        self.persist_key = key.into();
        self
    }

    pub fn discard_stale_responses(mut self, discard: bool) -> Self {
        self.discard_stale = discard;
        self
    }

    /// Theme used when neither the network nor storage can supply one
    pub fn default_theme(mut self, theme: ThemeDescriptor) -> Self {
        self.default_theme = Some(theme);
        self
    }

    /// Apply cache and store settings from `config`
    pub fn configure(self, config: &EngineConfig) -> Self {
        self.memory_capacity(config.cache.memory_capacity)
            .ttls(config.memory_ttl(), config.durable_ttl())
            .persist_key(config.store.persist_key.clone())
            .discard_stale_responses(config.store.discard_stale_responses)
    }

    /// Build the store and rehydrate the persisted theme
    pub fn build(self) -> ThemeStore {
        let clock = self.clock.unwrap_or_else(system_clock);
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);

        let cache = TieredCache::new(
            MemoryCache::with_clock(self.memory_capacity, clock.clone()),
            DurableCache::with_clock(backend.clone(), CACHE_NAMESPACE, clock.clone()),
            clock.clone(),
        )
        .with_ttls(self.memory_ttl, self.durable_ttl);

        let default_theme = match self.default_theme {
            Some(theme) if theme.validate().is_ok() => theme,
            Some(theme) => {
                tracing::warn!(
                    "ThemeStore: default theme {:?} is invalid, using built-in",
                    theme.slug()
                );
                ThemeDescriptor::fallback()
            }
            None => ThemeDescriptor::fallback(),
        };

        let store = ThemeStore {
            client: self.client,
            cache,
            backend,
            clock,
            persist_key: self.persist_key,
            memory_ttl: self.memory_ttl,
            durable_ttl: self.durable_ttl,
            discard_stale: self.discard_stale,
            default_theme: Arc::new(default_theme),
            inner: RwLock::new(StoreInner {
                state: ThemeStoreState::default(),
                in_flight: 0,
                generation: 0,
            }),
            serial: ReentrantMutex::new(()),
            subscribers: Subscribers::new(),
        };
        store.rehydrate();
        store
    }
}

impl ThemeStore {
    pub fn builder(client: ThemeClient) -> ThemeStoreBuilder {
        ThemeStoreBuilder::new(client)
    }

    // ========== Reads ==========

    pub fn snapshot(&self) -> ThemeStoreState {
        self.inner.read().state.clone()
    }

    pub fn current_theme(&self) -> Option<Arc<ThemeDescriptor>> {
        self.inner.read().state.current_theme.clone()
    }

    pub fn phase(&self) -> ThemePhase {
        self.inner.read().state.phase()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().state.is_loading
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.inner.read().state.last_error.clone()
    }

    /// Palette of the active theme
    pub fn colors(&self) -> Option<Palette> {
        self.inner
            .read()
            .state
            .current_theme
            .as_ref()
            .map(|theme| theme.palette)
    }

    /// Typography of the active theme
    pub fn typography(&self) -> Option<Typography> {
        self.inner
            .read()
            .state
            .current_theme
            .as_ref()
            .map(|theme| theme.typography.clone())
    }

    pub fn default_theme(&self) -> Arc<ThemeDescriptor> {
        self.default_theme.clone()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.memory_stats()
    }

    /// Register a listener called with the new snapshot after every change
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ThemeStoreState) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(listener)
    }

    // ========== Mutations ==========

    /// Resolve `slug` through memory, durable storage and finally the network
    ///
    /// Always settles with a theme applied. On failure `last_error` is set and
    /// the fallback chain picks the theme.
    pub async fn load_theme(&self, slug: &str) -> ThemeStoreState {
        let generation = {
            let _serial = self.serial.lock();
            self.commit(|inner| {
                inner.in_flight += 1;
                inner.generation += 1;
                inner.generation
            })
        };
        tracing::debug!("ThemeStore::load_theme - {:?} (generation {})", slug, generation);

        let outcome = match self.cache.lookup(slug) {
            Some((theme, tier)) => {
                tracing::debug!(
                    "ThemeStore::load_theme - {:?} served from {} cache",
                    slug,
                    match tier {
                        TierHit::Memory => "memory",
                        TierHit::Durable => "durable",
                    }
                );
                Ok(theme)
            }
            None => {
                let fetched = self.client.fetch_theme(slug).await;
                if let Ok(theme) = &fetched {
                    self.cache.put(slug, theme.clone());
                }
                fetched
            }
        };

        self.settle(slug, generation, outcome);
        self.snapshot()
    }

    /// Apply `theme` directly, bypassing cache and network
    pub fn set_theme(&self, theme: impl Into<Arc<ThemeDescriptor>>) -> Result<(), DescriptorError> {
        let theme = theme.into();
        theme.validate()?;
        tracing::info!("ThemeStore::set_theme - {:?}", theme.slug());

        let _serial = self.serial.lock();
        self.commit(|inner| {
            inner.generation += 1;
            inner.state.current_theme = Some(theme.clone());
            inner.state.last_error = None;
        });
        self.cache.put(theme.slug(), (*theme).clone());
        self.persist(&theme);
        Ok(())
    }

    /// Forget the active theme, its persisted record and the memory tier
    ///
    /// Per-slug durable records stay; other processes may be relying on them.
    pub fn clear(&self) {
        tracing::info!("ThemeStore::clear");
        let _serial = self.serial.lock();
        self.commit(|inner| {
            inner.generation += 1;
            inner.state.current_theme = None;
            inner.state.last_error = None;
        });
        self.cache.fast().clear();
        if let Err(err) = self.backend.remove(&self.persist_key) {
            tracing::warn!("ThemeStore: failed to remove persisted theme: {}", err);
        }
    }

    /// Drop `slug` from both cache tiers so the next load hits the network
    pub fn invalidate(&self, slug: &str) {
        tracing::debug!("ThemeStore::invalidate - {:?}", slug);
        self.cache.delete(slug);
    }

    // ========== Internals ==========

    /// Mutate under the lock, then notify outside it if the snapshot changed
    ///
    /// Callers hold `serial` so concurrent commits cannot interleave their
    /// notifications.
    fn commit<R>(&self, mutate: impl FnOnce(&mut StoreInner) -> R) -> R {
        let (result, changed) = {
            let mut inner = self.inner.write();
            let before = inner.state.clone();
            let result = mutate(&mut inner);
            inner.state.is_loading = inner.in_flight > 0;
            let changed = (inner.state != before).then(|| inner.state.clone());
            (result, changed)
        };
        if let Some(snapshot) = changed {
            self.subscribers.notify(&snapshot);
        }
        result
    }

    fn settle(&self, slug: &str, generation: u64, outcome: Result<ThemeDescriptor, FetchError>) {
        let _serial = self.serial.lock();

        // Read storage before taking the state lock
        let persisted = match &outcome {
            Ok(_) => None,
            Err(_) => self.read_persisted().map(|record| Arc::new(record.descriptor)),
        };

        let applied = self.commit(|inner| {
            inner.in_flight = inner.in_flight.saturating_sub(1);

            if self.discard_stale && generation != inner.generation {
                tracing::debug!(
                    "ThemeStore::load_theme - discarding superseded response for {:?}",
                    slug
                );
                return None;
            }

            // The persisted record already holds a theme restored from it,
            // with its original expiry; only other themes get written back
            let (theme, write_back) = match outcome {
                Ok(theme) => {
                    inner.state.last_error = None;
                    (Arc::new(theme), true)
                }
                Err(err) => {
                    let (theme, write_back) = match persisted {
                        Some(theme) => (theme, false),
                        None => (
                            inner
                                .state
                                .current_theme
                                .clone()
                                .unwrap_or_else(|| self.default_theme.clone()),
                            true,
                        ),
                    };
                    tracing::warn!(
                        "ThemeStore::load_theme - {:?} failed ({}), falling back to {:?}",
                        slug,
                        err,
                        theme.slug()
                    );
                    inner.state.last_error = Some(err);
                    (theme, write_back)
                }
            };
            inner.state.current_theme = Some(theme.clone());
            write_back.then_some(theme)
        });

        if let Some(theme) = applied {
            self.persist(&theme);
        }
    }

    fn persist(&self, theme: &ThemeDescriptor) {
        let now = self.clock.now_millis();
        let record = PersistedTheme {
            slug: theme.slug().to_string(),
            descriptor: theme.clone(),
            saved_at_ms: now,
            expires_at_ms: now.saturating_add(self.durable_ttl.as_millis() as u64),
        };
        let result = serde_json::to_string(&record)
            .map_err(vitrine_cache::StorageError::from)
            .and_then(|raw| self.backend.write(&self.persist_key, &raw));
        if let Err(err) = result {
            tracing::warn!("ThemeStore: failed to persist {:?}: {}", record.slug, err);
        }
    }

    fn read_persisted(&self) -> Option<PersistedTheme> {
        let raw = match self.backend.read(&self.persist_key) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!("ThemeStore: persisted theme unreadable: {}", err);
                return None;
            }
        };

        let record = serde_json::from_str::<PersistedTheme>(&raw)
            .map_err(|e| e.to_string())
            .and_then(|record| {
                record
                    .descriptor
                    .validate()
                    .map(|_| record)
                    .map_err(|e| e.to_string())
            });
        match record {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!("ThemeStore: dropping corrupt persisted theme: {}", err);
                if let Err(err) = self.backend.remove(&self.persist_key) {
                    tracing::warn!("ThemeStore: failed to remove persisted theme: {}", err);
                }
                None
            }
        }
    }

    /// Restore the persisted theme; expired records still count as last-good
    /// but are not treated as cache hits
    fn rehydrate(&self) {
        let Some(record) = self.read_persisted() else {
            tracing::debug!("ThemeStore: nothing to rehydrate");
            return;
        };

        let now = self.clock.now_millis();
        if record.expires_at_ms > now {
            let remaining = Duration::from_millis(record.expires_at_ms - now).min(self.memory_ttl);
            self.cache
                .fast()
                .set(&record.slug, record.descriptor.clone(), remaining);
        }

        tracing::info!("ThemeStore: rehydrated {:?}", record.slug);
        self.inner.write().state.current_theme = Some(Arc::new(record.descriptor));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{PresetTransport, ThemeTransport, TransportResponse};
    use crate::injector::{RootStyle, VariableInjector};
    use crate::presets::ThemePreset;
    use crate::variables::StyleVariableSet;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use vitrine_cache::ManualClock;

    struct Unreachable;

    #[async_trait]
    impl ThemeTransport for Unreachable {
        async fn get_theme(&self, _slug: &str) -> Result<TransportResponse, FetchError> {
            Err(FetchError::Network("connection refused".into()))
        }
    }

    fn offline_store(backend: Arc<MemoryStore>) -> ThemeStore {
        ThemeStore::builder(ThemeClient::offline())
            .backend(backend)
            .build()
    }

    fn unreachable_store(backend: Arc<MemoryStore>) -> ThemeStore {
        ThemeStore::builder(ThemeClient::new(Arc::new(Unreachable)))
            .backend(backend)
            .build()
    }

    #[test]
    fn cold_start_is_idle() {
        let store = offline_store(Arc::new(MemoryStore::new()));
        assert_eq!(store.phase(), ThemePhase::Idle);
        assert!(store.current_theme().is_none());
        assert!(store.colors().is_none());
    }

    #[tokio::test]
    async fn load_applies_and_persists() {
        let backend = Arc::new(MemoryStore::new());
        let store = offline_store(backend.clone());

        let state = store.load_theme("warm-comfort").await;
        assert_eq!(state.phase(), ThemePhase::Ready);
        assert_eq!(state.current_slug(), Some("warm-comfort"));
        assert!(state.last_error.is_none());
        assert!(backend.read(DEFAULT_PERSIST_KEY).unwrap().is_some());
        assert!(backend.read("theme:warm-comfort").unwrap().is_some());

        // A new process over the same storage starts Ready before any network call
        let restarted = unreachable_store(backend);
        assert_eq!(restarted.phase(), ThemePhase::Ready);
        assert_eq!(
            restarted.current_theme().as_deref(),
            Some(&ThemePreset::WarmComfort.descriptor())
        );
    }

    #[tokio::test]
    async fn failure_falls_back_to_persisted_theme() {
        let backend = Arc::new(MemoryStore::new());
        offline_store(backend.clone()).load_theme("coastal-breeze").await;

        let store = unreachable_store(backend);
        let state = store.load_theme("premium-dark").await;
        assert_eq!(state.current_slug(), Some("coastal-breeze"));
        assert_eq!(state.last_error, Some(FetchError::Network("connection refused".into())));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn failure_without_storage_uses_default() {
        let store = unreachable_store(Arc::new(MemoryStore::new()));
        let state = store.load_theme("premium-dark").await;
        assert_eq!(state.current_slug(), Some("default"));
        assert!(state.last_error.is_some());
    }

    #[tokio::test]
    async fn failure_keeps_applied_theme_when_storage_is_down() {
        let backend = Arc::new(MemoryStore::new());
        let store = unreachable_store(backend.clone());
        store.set_theme(ThemePreset::WarmComfort.descriptor()).unwrap();

        backend.set_unavailable(true);
        let state = store.load_theme("premium-dark").await;
        assert_eq!(state.current_slug(), Some("warm-comfort"));
    }

    #[tokio::test]
    async fn second_load_is_a_cache_hit() {
        let store = offline_store(Arc::new(MemoryStore::new()));
        store.load_theme("warm-comfort").await;
        store.load_theme("warm-comfort").await;
        let stats = store.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        store.invalidate("warm-comfort");
        store.load_theme("warm-comfort").await;
        assert_eq!(store.cache_stats().misses, 2);
    }

    #[tokio::test]
    async fn set_theme_validates() {
        let store = offline_store(Arc::new(MemoryStore::new()));
        let mut bad = ThemePreset::Default.descriptor();
        bad.meta.slug = "Not A Slug".into();

        let err = store.set_theme(bad).unwrap_err();
        assert_eq!(err.field, "meta.slug");
        assert_eq!(store.phase(), ThemePhase::Idle);
    }

    #[tokio::test]
    async fn clear_forgets_theme_and_record() {
        let backend = Arc::new(MemoryStore::new());
        let store = offline_store(backend.clone());
        store.load_theme("warm-comfort").await;

        store.clear();
        assert_eq!(store.phase(), ThemePhase::Idle);
        assert!(backend.read(DEFAULT_PERSIST_KEY).unwrap().is_none());
        assert_eq!(offline_store(backend).phase(), ThemePhase::Idle);
    }

    #[tokio::test]
    async fn subscribers_see_each_change_once() {
        let store = offline_store(Arc::new(MemoryStore::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = store.subscribe(move |state| sink.lock().push(state.phase()));

        store.load_theme("warm-comfort").await;
        // Same theme again: Loading then back to an identical Ready
        store.load_theme("warm-comfort").await;
        store.invalidate("nothing");

        assert_eq!(
            *seen.lock(),
            [
                ThemePhase::Loading,
                ThemePhase::Ready,
                ThemePhase::Loading,
                ThemePhase::Ready
            ]
        );
    }

    #[test]
    fn corrupt_persisted_record_is_dropped() {
        let backend = Arc::new(MemoryStore::new());
        backend.write(DEFAULT_PERSIST_KEY, "{\"slug\":").unwrap();

        let store = offline_store(backend.clone());
        assert_eq!(store.phase(), ThemePhase::Idle);
        assert!(backend.read(DEFAULT_PERSIST_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_record_still_rehydrates_but_misses_cache() {
        let backend = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(0);
        let build = |clock: &ManualClock| {
            ThemeStore::builder(ThemeClient::offline())
                .backend(backend.clone())
                .clock(Arc::new(clock.clone()))
                .ttls(Duration::from_secs(60), Duration::from_secs(60))
                .build()
        };

        build(&clock).load_theme("warm-comfort").await;
        clock.advance(Duration::from_secs(120));

        let store = build(&clock);
        assert_eq!(store.snapshot().current_slug(), Some("warm-comfort"));
        store.load_theme("warm-comfort").await;
        assert_eq!(store.cache_stats().hits, 0);
    }

    #[tokio::test]
    async fn fallback_to_persisted_keeps_its_expiry() {
        let backend = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(0);
        let ttl = Duration::from_secs(60);

        ThemeStore::builder(ThemeClient::offline())
            .backend(backend.clone())
            .clock(Arc::new(clock.clone()))
            .ttls(ttl, ttl)
            .build()
            .load_theme("warm-comfort")
            .await;
        clock.advance(Duration::from_secs(120));

        let store = ThemeStore::builder(ThemeClient::new(Arc::new(Unreachable)))
            .backend(backend)
            .clock(Arc::new(clock.clone()))
            .ttls(ttl, ttl)
            .build();
        let state = store.load_theme("premium-dark").await;
        assert_eq!(state.current_slug(), Some("warm-comfort"));

        let record = store.read_persisted().unwrap();
        assert_eq!(record.saved_at_ms, 0);
        assert_eq!(record.expires_at_ms, 60_000);

        // Still expired, so a restart does not treat it as a cache hit
        let restarted = ThemeStore::builder(ThemeClient::offline())
            .backend(store.backend.clone())
            .clock(Arc::new(clock.clone()))
            .build();
        assert!(restarted.cache.fast().is_empty());
    }

    #[test]
    fn concurrent_mutations_persist_and_notify_the_final_state() {
        let backend = Arc::new(MemoryStore::new());
        let store = Arc::new(offline_store(backend));
        let injector = VariableInjector::immediate(RootStyle::new());
        let _sync = injector.attach(&store);

        for _ in 0..200 {
            std::thread::scope(|scope| {
                for preset in [ThemePreset::WarmComfort, ThemePreset::PremiumDark] {
                    let store = &store;
                    scope.spawn(move || store.set_theme(preset.descriptor()).unwrap());
                }
            });

            let current = store.current_theme().unwrap();
            assert_eq!(store.read_persisted().unwrap().slug, current.slug());
            assert_eq!(injector.applied(), StyleVariableSet::from_descriptor(&current));
        }
    }

    #[test]
    fn invalid_default_theme_is_replaced() {
        let mut custom = ThemePreset::CoastalBreeze.descriptor();
        custom.typography.line_height = 9.0;
        let store = ThemeStore::builder(ThemeClient::new(Arc::new(PresetTransport::new())))
            .default_theme(custom)
            .build();
        assert_eq!(store.default_theme().slug(), "default");
    }
}
