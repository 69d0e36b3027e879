//! Keyed cache of bookmark lists shared by every mounted view.
//!
//! A view calls [`QueryCache::subscribe`] with the [`QueryKey`] it renders.
//! The cache immediately hands it the current [`CacheEntry`], starts a fetch
//! if the entry is missing or stale, and calls back again on every status or
//! data change. Mutations reach the cache through the
//! [`InvalidationBus`](crate::invalidation::InvalidationBus): matching entries
//! are marked stale and the watched ones refetch right away.
//!
//! # Ordering
//!
//! Every fetch is stamped with a generation drawn from one cache-wide counter.
//! A completed fetch is applied only if its generation is still the entry's
//! current one, so a slow response can never overwrite a newer one.
//!
//! # Eviction
//!
//! Entries are reference counted by their subscribers. An entry nobody
//! watches is evicted after [`CacheConfig::gc_time`] (immediately when that is
//! zero). Entries that are still loading are never evicted.
//!
//! All operations that may start a fetch must run inside a Tokio runtime.

mod config;
mod entry;
mod subscription;

pub use config::CacheConfig;
pub use entry::{CacheEntry, QueryStatus};
pub use subscription::{Callback, Subscription};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::time::Instant;

use crate::domain::{InvalidationTag, QueryKey};
use crate::fetcher::{FetchOutput, Fetcher, SharedFetch};
use crate::invalidation::{InvalidationBus, InvalidationListener};

use self::entry::Slot;
use self::subscription::{deliver, Pending, Subscriber};

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer fetch was started for the key meanwhile; the result was dropped.
    StaleDiscard,
    /// Another waiter already applied this generation.
    AlreadyApplied,
    /// The entry was evicted while the fetch was outstanding.
    Evicted,
}

/// Process-wide list cache. Cloning shares the same cache.
///
/// Construct one per running client (see [`AppContext`](crate::app::AppContext))
/// and call [`QueryCache::clear`] at teardown.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    slots: Mutex<HashMap<QueryKey, Slot>>,
    fetcher: Arc<Fetcher>,
    config: CacheConfig,
    next_generation: AtomicU64,
    next_subscriber: AtomicU64,
    self_ref: Weak<CacheInner>,
}

impl QueryCache {
    /// Create a cache that refetches whenever `bus` publishes a matching tag.
    pub fn new(fetcher: Arc<Fetcher>, bus: &InvalidationBus, config: CacheConfig) -> Self {
        let inner = Arc::new_cyclic(|self_ref| CacheInner {
            slots: Mutex::new(HashMap::new()),
            fetcher,
            config,
            next_generation: AtomicU64::new(0),
            next_subscriber: AtomicU64::new(0),
            self_ref: self_ref.clone(),
        });

        let listener: Weak<CacheInner> = Arc::downgrade(&inner);
        bus.register(listener);

        Self { inner }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Current entry for `key`, creating an idle one if absent.
    pub fn get(&self, key: &QueryKey) -> CacheEntry {
        let mut slots = self.inner.slots();
        slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(key.clone()))
            .entry
            .clone()
    }

    /// Watch `key`. The callback runs once right away with the current entry
    /// and again on every later change, never twice for the same change.
    pub fn subscribe<F>(&self, key: QueryKey, callback: F) -> Subscription
    where
        F: Fn(&CacheEntry) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::SeqCst) + 1;
        let subscriber = Arc::new(Subscriber::new(id, Box::new(callback)));

        let (entry, revision) = {
            let mut slots = self.inner.slots();
            let slot = slots
                .entry(key.clone())
                .or_insert_with(|| Slot::new(key.clone()));
            slot.subscribers.push(subscriber.clone());
            slot.orphaned_at = None;
            (slot.entry.clone(), slot.revision)
        };

        tracing::debug!("Subscribed #{} to {}", id, key);
        subscriber.deliver(&entry, revision);
        self.inner.ensure_fresh(&key);

        Subscription::new(key, id, Arc::downgrade(&self.inner))
    }

    /// Start a fetch if the entry is idle, failed, stale or past its stale
    /// time. Does nothing while a current fetch is outstanding.
    pub fn ensure_fresh(&self, key: &QueryKey) {
        self.inner.ensure_fresh(key);
    }

    /// Start a new fetch even if the entry is fresh.
    pub fn refetch(&self, key: &QueryKey) {
        let pending = {
            let mut slots = self.inner.slots();
            let slot = slots
                .entry(key.clone())
                .or_insert_with(|| Slot::new(key.clone()));
            self.inner.start_fetch(key, slot)
        };
        deliver(pending);
    }

    /// Mark every matching entry stale; watched ones refetch immediately.
    /// Returns the number of entries matched.
    pub fn invalidate<P>(&self, predicate: P) -> usize
    where
        P: Fn(&QueryKey) -> bool,
    {
        self.inner.invalidate(predicate)
    }

    /// Make sure `key` is fresh, wait for the outstanding fetch (following any
    /// fetch that supersedes it) and return the settled entry.
    pub async fn fetch_query(&self, key: &QueryKey) -> CacheEntry {
        self.inner.ensure_fresh(key);

        while let Some((generation, future)) = self.inner.fetcher.in_flight(key) {
            let output = future.await;
            self.inner.apply(key, generation, output);
        }

        self.get(key)
    }

    /// Evict every unwatched entry past its grace period. Returns how many were removed.
    pub fn collect_garbage(&self) -> usize {
        self.inner.collect_garbage()
    }

    /// Drop every entry. Outstanding subscriptions become inert.
    pub fn clear(&self) {
        let mut slots = self.inner.slots();
        tracing::debug!("Clearing {} cache entries", slots.len());
        slots.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.inner.slots().contains_key(key)
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.inner
            .slots()
            .get(key)
            .map_or(0, |slot| slot.subscribers.len())
    }
}

impl CacheInner {
    fn slots(&self) -> MutexGuard<'_, HashMap<QueryKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_fresh(&self, key: &QueryKey) {
        let pending = {
            let mut slots = self.slots();
            let slot = slots
                .entry(key.clone())
                .or_insert_with(|| Slot::new(key.clone()));
            if !slot.needs_fetch(self.config.stale_time()) {
                return;
            }
            self.start_fetch(key, slot)
        };
        deliver(pending);
    }

    fn start_fetch(&self, key: &QueryKey, slot: &mut Slot) -> Pending {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        slot.entry.generation = generation;
        slot.entry.status = QueryStatus::Loading;
        slot.stale = false;

        let future = self.fetcher.fetch(key, generation);
        self.spawn_apply(key.clone(), generation, future);

        slot.changed()
    }

    fn spawn_apply(&self, key: QueryKey, generation: u64, future: SharedFetch) {
        let cache = self.self_ref.clone();
        tokio::spawn(async move {
            let output = future.await;
            if let Some(cache) = cache.upgrade() {
                cache.apply(&key, generation, output);
            }
        });
    }

    fn apply(&self, key: &QueryKey, generation: u64, output: FetchOutput) -> ApplyOutcome {
        self.fetcher.finish(key, generation);

        let pending = {
            let mut slots = self.slots();
            let Some(slot) = slots.get_mut(key) else {
                tracing::debug!("Dropping response for evicted {}", key);
                return ApplyOutcome::Evicted;
            };

            if slot.entry.generation != generation {
                tracing::debug!(
                    "Discarding stale response for {} (generation {}, current {})",
                    key,
                    generation,
                    slot.entry.generation
                );
                return ApplyOutcome::StaleDiscard;
            }

            if slot.entry.status != QueryStatus::Loading {
                return ApplyOutcome::AlreadyApplied;
            }

            match output {
                Ok(data) => {
                    tracing::debug!("Fetched {} rows for {}", data.len(), key);
                    slot.entry.status = QueryStatus::Success;
                    slot.entry.data = Some(data);
                    slot.entry.error = None;
                    slot.fetched_at = Some(Instant::now());
                }
                Err(e) => {
                    // Rows from the last good fetch stay visible.
                    tracing::warn!("Fetching {} failed: {}", key, e);
                    slot.entry.status = QueryStatus::Error;
                    slot.entry.error = Some(e.to_string());
                }
            }

            slot.changed()
        };

        deliver(pending);
        ApplyOutcome::Applied
    }

    fn invalidate<P>(&self, predicate: P) -> usize
    where
        P: Fn(&QueryKey) -> bool,
    {
        let mut matched = 0;
        let pending = {
            let mut slots = self.slots();
            let mut pending = Vec::new();
            for (key, slot) in slots.iter_mut() {
                if !predicate(key) {
                    continue;
                }
                matched += 1;
                slot.stale = true;
                if !slot.subscribers.is_empty() {
                    pending.extend(self.start_fetch(key, slot));
                }
            }
            pending
        };

        deliver(pending);
        matched
    }

    fn unsubscribe(&self, key: &QueryKey, id: u64) {
        let gc_time = self.config.gc_time();
        {
            let mut slots = self.slots();
            let Some(slot) = slots.get_mut(key) else {
                return;
            };
            slot.subscribers.retain(|s| s.id != id);
            tracing::debug!("Unsubscribed #{} from {}", id, key);

            if !slot.subscribers.is_empty() {
                return;
            }
            slot.orphaned_at = Some(Instant::now());

            if gc_time.is_zero() {
                if slot.should_gc(gc_time) {
                    slots.remove(key);
                    tracing::debug!("Evicted {}", key);
                }
                return;
            }
        }

        self.schedule_gc(gc_time);
    }

    fn schedule_gc(&self, after: std::time::Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let cache = self.self_ref.clone();
        handle.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(cache) = cache.upgrade() {
                cache.collect_garbage();
            }
        });
    }

    fn collect_garbage(&self) -> usize {
        let gc_time = self.config.gc_time();
        let mut slots = self.slots();
        let before = slots.len();
        slots.retain(|key, slot| {
            let evict = slot.should_gc(gc_time);
            if evict {
                tracing::debug!("Evicted {}", key);
            }
            !evict
        });
        before - slots.len()
    }
}

impl InvalidationListener for CacheInner {
    fn on_invalidate(&self, tag: &InvalidationTag) {
        let matched = self.invalidate(|key| tag.matches(key));
        tracing::debug!("{} invalidated {} entries", tag, matched);
    }
}
