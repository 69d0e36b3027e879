pub mod http_api;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{BookmarkEntry, QueryKey};

pub use http_api::HttpApi;

/// The six endpoints of the bookmark server.
///
/// Everything above this trait (fetcher, cache, mutations) is transport-agnostic.
#[async_trait]
pub trait BookmarkApi {
    async fn list(&self, key: &QueryKey) -> Result<Vec<BookmarkEntry>>;
    async fn add(&self, url: &str) -> Result<()>;
    async fn hit(&self, url: &str) -> Result<()>;
    async fn set_favorite(&self, url: &str, is_favorite: bool) -> Result<()>;
}

/// Percent-encode a query parameter the way `encodeURIComponent` does.
fn encode(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}

pub fn list_path(key: &QueryKey) -> String {
    match key {
        QueryKey::Favorites { count } => format!("/api/favorites?count={}", count),
        QueryKey::Recents { count } => format!("/api/recents?count={}", count),
        QueryKey::Search { query } => format!("/api/search?q={}", encode(query)),
    }
}

pub fn add_path(url: &str) -> String {
    format!("/api/add?url={}", encode(url))
}

pub fn hit_path(url: &str) -> String {
    format!("/api/hit?url={}", encode(url))
}

pub fn set_favorite_path(url: &str, is_favorite: bool) -> String {
    format!(
        "/api/setFavorite?url={}&isFavorite={}",
        encode(url),
        is_favorite
    )
}
