use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::domain::QueryKey;

use super::entry::CacheEntry;
use super::CacheInner;

pub type Callback = Box<dyn Fn(&CacheEntry) + Send + Sync>;

/// Notifications collected under the cache lock and delivered after it is released.
pub(super) type Pending = Vec<(Arc<Subscriber>, CacheEntry, u64)>;

pub(super) fn deliver(pending: Pending) {
    for (subscriber, entry, revision) in pending {
        subscriber.deliver(&entry, revision);
    }
}

pub(super) struct Subscriber {
    pub id: u64,
    callback: Callback,
    delivered: AtomicU64,
}

impl Subscriber {
    pub fn new(id: u64, callback: Callback) -> Self {
        Self {
            id,
            callback,
            delivered: AtomicU64::new(0),
        }
    }

    /// Invoke the callback unless this or a newer revision was already delivered.
    pub fn deliver(&self, entry: &CacheEntry, revision: u64) {
        if self.delivered.fetch_max(revision, Ordering::SeqCst) < revision {
            (self.callback)(entry);
        }
    }
}

/// Interest in one cached list. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    key: QueryKey,
    id: u64,
    cache: Weak<CacheInner>,
}

impl Subscription {
    pub(super) fn new(key: QueryKey, id: u64, cache: Weak<CacheInner>) -> Self {
        Self { key, id, cache }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cache) = self.cache.upgrade() {
            cache.unsubscribe(&self.key, self.id);
        }
    }
}
