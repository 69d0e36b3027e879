//! Single-flight list reads.
//!
//! The [`Fetcher`] turns a [`QueryKey`] into one GET request and hands every
//! caller asking for the same key and generation the same shared future.
//! Deciding whether a completed result is still wanted is the cache's job;
//! the fetcher only guarantees there is never a second request for a
//! generation that already has one outstanding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::api::BookmarkApi;
use crate::app::SatchelError;
use crate::domain::{BookmarkEntry, QueryKey};

pub type FetchOutput = std::result::Result<Arc<Vec<BookmarkEntry>>, Arc<SatchelError>>;
pub type SharedFetch = Shared<BoxFuture<'static, FetchOutput>>;

struct InFlight {
    generation: u64,
    future: SharedFetch,
}

pub struct Fetcher {
    api: Arc<dyn BookmarkApi + Send + Sync>,
    in_flight: Mutex<HashMap<QueryKey, InFlight>>,
    request_timeout: Option<Duration>,
}

impl Fetcher {
    pub fn new(api: Arc<dyn BookmarkApi + Send + Sync>) -> Self {
        Self {
            api,
            in_flight: Mutex::new(HashMap::new()),
            request_timeout: None,
        }
    }

    /// Expired requests surface as ordinary network errors.
    pub fn with_timeout(api: Arc<dyn BookmarkApi + Send + Sync>, timeout: Duration) -> Self {
        Self {
            request_timeout: Some(timeout),
            ..Self::new(api)
        }
    }

    fn requests(&self) -> MutexGuard<'_, HashMap<QueryKey, InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch `key` for `generation`, joining an outstanding request for the
    /// same generation instead of issuing another one.
    ///
    /// A newer generation replaces the tracked request; the older one keeps
    /// running and its result is left for the caller to discard.
    pub fn fetch(&self, key: &QueryKey, generation: u64) -> SharedFetch {
        let mut requests = self.requests();

        if let Some(existing) = requests.get(key) {
            if existing.generation == generation {
                return existing.future.clone();
            }
        }

        tracing::debug!("Fetching {} (generation {})", key, generation);
        let future = request(self.api.clone(), key.clone(), self.request_timeout)
            .boxed()
            .shared();

        requests.insert(
            key.clone(),
            InFlight {
                generation,
                future: future.clone(),
            },
        );

        future
    }

    /// The newest outstanding request for `key`, if any.
    pub fn in_flight(&self, key: &QueryKey) -> Option<(u64, SharedFetch)> {
        self.requests()
            .get(key)
            .map(|f| (f.generation, f.future.clone()))
    }

    /// Stop tracking the request for `generation` once its result has been handled.
    pub fn finish(&self, key: &QueryKey, generation: u64) {
        let mut requests = self.requests();
        if requests.get(key).map(|f| f.generation) == Some(generation) {
            requests.remove(key);
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.requests().len()
    }
}

async fn request(
    api: Arc<dyn BookmarkApi + Send + Sync>,
    key: QueryKey,
    timeout: Option<Duration>,
) -> FetchOutput {
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, api.list(&key)).await {
            Ok(result) => result,
            Err(_) => Err(SatchelError::Network(format!(
                "{} timed out after {:?}",
                key, limit
            ))),
        },
        None => api.list(&key).await,
    };

    match result {
        Ok(list) => Ok(Arc::new(list)),
        Err(e) => {
            tracing::debug!("Fetch of {} failed: {}", key, e);
            Err(Arc::new(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;

    fn fetcher(api: &Arc<MockApi>) -> Fetcher {
        Fetcher::new(api.clone())
    }

    #[tokio::test]
    async fn test_same_generation_shares_one_request() {
        let api = Arc::new(MockApi::with_bookmarks(&[(
            "Rust",
            "https://www.rust-lang.org/",
            true,
        )]));
        let fetcher = fetcher(&api);
        let key = QueryKey::favorites(10);

        let a = fetcher.fetch(&key, 1);
        let b = fetcher.fetch(&key, 1);
        let (a, b) = futures::join!(a, b);

        assert_eq!(api.calls_to("/api/favorites"), 1);
        assert_eq!(a.unwrap().len(), 1);
        assert_eq!(b.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_new_generation_issues_new_request() {
        let api = Arc::new(MockApi::new());
        let fetcher = fetcher(&api);
        let key = QueryKey::recents(10);

        let first = fetcher.fetch(&key, 1);
        let second = fetcher.fetch(&key, 2);
        let _ = futures::join!(first, second);

        assert_eq!(api.calls_to("/api/recents"), 2);
        assert_eq!(fetcher.in_flight(&key).map(|(g, _)| g), Some(2));
    }

    #[tokio::test]
    async fn test_finish_only_clears_matching_generation() {
        let api = Arc::new(MockApi::new());
        let fetcher = fetcher(&api);
        let key = QueryKey::search("rust");

        let _ = fetcher.fetch(&key, 3);
        fetcher.finish(&key, 2);
        assert_eq!(fetcher.in_flight_count(), 1);

        fetcher.finish(&key, 3);
        assert_eq!(fetcher.in_flight_count(), 0);
        assert!(fetcher.in_flight(&key).is_none());
    }

    #[tokio::test]
    async fn test_errors_are_shared() {
        let api = Arc::new(MockApi::new());
        api.fail_lists(true);
        let fetcher = fetcher(&api);

        let err = fetcher
            .fetch(&QueryKey::favorites(10), 1)
            .await
            .unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_network_error() {
        let api = Arc::new(MockApi::new());
        let _held = api.gate_next_list();
        let fetcher = Fetcher::with_timeout(api.clone(), Duration::from_secs(5));

        let err = fetcher
            .fetch(&QueryKey::favorites(10), 1)
            .await
            .unwrap_err();
        assert!(err.is_network());
        assert!(err.to_string().contains("timed out"));
    }
}
