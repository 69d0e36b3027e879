//! Announcing that cached lists are stale.
//!
//! Listeners registered on the bus (the query cache) are called synchronously
//! from [`InvalidationBus::publish`], so by the time a mutation returns every
//! matching entry has already started refetching. Observers that only want to
//! know *that* something was invalidated can take a broadcast receiver.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::broadcast;

use crate::domain::InvalidationTag;

pub trait InvalidationListener: Send + Sync {
    fn on_invalidate(&self, tag: &InvalidationTag);
}

#[derive(Clone)]
pub struct InvalidationBus {
    listeners: Arc<Mutex<Vec<Weak<dyn InvalidationListener>>>>,
    tx: broadcast::Sender<InvalidationTag>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            tx,
        }
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<Weak<dyn InvalidationListener>>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Held weakly; a dropped listener is pruned on the next publish.
    pub fn register(&self, listener: Weak<dyn InvalidationListener>) {
        self.listeners().push(listener);
    }

    /// Receive every published tag, after listeners have handled it.
    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationTag> {
        self.tx.subscribe()
    }

    /// Returns how many listeners handled the tag.
    pub fn publish(&self, tag: InvalidationTag) -> usize {
        let live: Vec<Arc<dyn InvalidationListener>> = {
            let mut listeners = self.listeners();
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };

        tracing::debug!("Invalidating {} ({} listeners)", tag, live.len());
        for listener in &live {
            listener.on_invalidate(&tag);
        }

        // No receivers is fine.
        let _ = self.tx.send(tag);
        live.len()
    }
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new()
    }
}
