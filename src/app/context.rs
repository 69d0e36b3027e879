use std::sync::Arc;

use crate::api::{BookmarkApi, HttpApi};
use crate::app::error::Result;
use crate::cache::QueryCache;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::fetcher::Fetcher;
use crate::invalidation::InvalidationBus;
use crate::mutation::MutationDispatcher;

/// Everything a running client shares: one API client, one fetcher, one cache.
pub struct AppContext {
    pub config: Config,
    pub api: Arc<dyn BookmarkApi + Send + Sync>,
    pub fetcher: Arc<Fetcher>,
    pub cache: QueryCache,
    pub bus: InvalidationBus,
    pub mutations: MutationDispatcher,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let api: Arc<dyn BookmarkApi + Send + Sync> = Arc::new(HttpApi::new(&config.server)?);
        Ok(Self::with_api(api, config))
    }

    pub fn with_api(api: Arc<dyn BookmarkApi + Send + Sync>, config: Config) -> Self {
        let bus = InvalidationBus::new();
        let fetcher = Arc::new(Fetcher::with_timeout(api.clone(), config.server.timeout()));
        let cache = QueryCache::new(fetcher.clone(), &bus, config.cache.clone());
        let mutations = MutationDispatcher::new(api.clone(), bus.clone());

        Self {
            config,
            api,
            fetcher,
            cache,
            bus,
            mutations,
        }
    }

    /// Debouncer for the search box using the configured quiet period.
    pub fn search_debouncer(&self) -> Debouncer {
        Debouncer::new(self.config.search.debounce())
    }

    /// Drop every cached list. Subscriptions still held become inert.
    pub fn shutdown(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::domain::QueryKey;

    #[tokio::test]
    async fn test_context_wires_mutations_to_cache() {
        let api = Arc::new(MockApi::with_bookmarks(&[(
            "Rust",
            "https://www.rust-lang.org/",
            false,
        )]));
        let ctx = AppContext::with_api(api.clone(), Config::default());
        let key = QueryKey::favorites(ctx.config.lists.favorites_count);

        assert!(ctx.cache.fetch_query(&key).await.rows().is_empty());

        ctx.mutations
            .set_favorite("https://www.rust-lang.org/", true)
            .await
            .unwrap();
        assert_eq!(ctx.cache.fetch_query(&key).await.rows().len(), 1);

        ctx.shutdown();
        assert!(ctx.cache.is_empty());
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        let mut config = Config::default();
        config.server.base_url = "not a url".into();

        let err = AppContext::new(config).err().unwrap();
        assert!(err.is_invalid_url());
    }
}
