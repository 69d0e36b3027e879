use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::{BookmarkEntry, QueryKey};

use super::subscription::{Pending, Subscriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing requested yet.
    Idle,
    /// A fetch is outstanding. Rows from an earlier fetch may still be present.
    Loading,
    Success,
    /// The last fetch failed. Rows from an earlier fetch may still be present.
    Error,
}

/// Snapshot of one cached list as seen by subscribers.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: QueryKey,
    pub status: QueryStatus,
    pub data: Option<Arc<Vec<BookmarkEntry>>>,
    pub error: Option<String>,
    /// Generation of the most recently started fetch.
    pub generation: u64,
}

impl CacheEntry {
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            generation: 0,
        }
    }

    /// The cached rows, empty when nothing has been fetched successfully.
    pub fn rows(&self) -> &[BookmarkEntry] {
        self.data.as_deref().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

/// Cache-side bookkeeping around an entry.
pub(super) struct Slot {
    pub entry: CacheEntry,
    pub stale: bool,
    pub fetched_at: Option<Instant>,
    pub orphaned_at: Option<Instant>,
    /// Bumped on every change subscribers should see.
    pub revision: u64,
    pub subscribers: Vec<Arc<Subscriber>>,
}

impl Slot {
    pub fn new(key: QueryKey) -> Self {
        Self {
            entry: CacheEntry::new(key),
            stale: false,
            fetched_at: None,
            orphaned_at: Some(Instant::now()),
            revision: 1,
            subscribers: Vec::new(),
        }
    }

    pub fn needs_fetch(&self, stale_time: Duration) -> bool {
        match self.entry.status {
            QueryStatus::Idle | QueryStatus::Error => true,
            // Invalidated while in flight: that response predates the change.
            QueryStatus::Loading => self.stale,
            QueryStatus::Success => {
                self.stale
                    || self
                        .fetched_at
                        .map_or(true, |t| t.elapsed() >= stale_time)
            }
        }
    }

    /// Unwatched for at least `gc_time` and not waiting on a fetch.
    pub fn should_gc(&self, gc_time: Duration) -> bool {
        self.subscribers.is_empty()
            && self.entry.status != QueryStatus::Loading
            && self.orphaned_at.is_some_and(|t| t.elapsed() >= gc_time)
    }

    pub fn changed(&mut self) -> Pending {
        self.revision += 1;
        self.pending()
    }

    pub fn pending(&self) -> Pending {
        self.subscribers
            .iter()
            .map(|s| (s.clone(), self.entry.clone(), self.revision))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(status: QueryStatus) -> Slot {
        let mut slot = Slot::new(QueryKey::favorites(10));
        slot.entry.status = status;
        slot
    }

    #[test]
    fn test_new_entry_is_idle_and_empty() {
        let entry = CacheEntry::new(QueryKey::recents(5));
        assert_eq!(entry.status, QueryStatus::Idle);
        assert!(entry.rows().is_empty());
        assert!(entry.error.is_none());
        assert_eq!(entry.generation, 0);
    }

    #[test]
    fn test_predicates() {
        let mut entry = CacheEntry::new(QueryKey::recents(5));
        entry.status = QueryStatus::Loading;
        assert!(entry.is_loading());
        assert!(!entry.is_success());

        entry.status = QueryStatus::Error;
        assert!(entry.is_error());
        assert!(!entry.is_loading());
    }

    #[test]
    fn test_needs_fetch_by_status() {
        let hour = Duration::from_secs(3600);
        assert!(entry_with(QueryStatus::Idle).needs_fetch(hour));
        assert!(entry_with(QueryStatus::Error).needs_fetch(hour));
        assert!(!entry_with(QueryStatus::Loading).needs_fetch(hour));

        let mut loading = entry_with(QueryStatus::Loading);
        loading.stale = true;
        assert!(loading.needs_fetch(hour));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_goes_stale_after_stale_time() {
        let mut slot = entry_with(QueryStatus::Success);
        slot.fetched_at = Some(Instant::now());
        assert!(!slot.needs_fetch(Duration::from_secs(30)));
        assert!(slot.needs_fetch(Duration::ZERO));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(slot.needs_fetch(Duration::from_secs(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_gc() {
        let mut slot = entry_with(QueryStatus::Success);
        assert!(!slot.should_gc(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(slot.should_gc(Duration::from_secs(10)));

        slot.entry.status = QueryStatus::Loading;
        assert!(!slot.should_gc(Duration::from_secs(10)));
    }
}
