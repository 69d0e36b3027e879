//! Writes to the bookmark server.
//!
//! Adding a bookmark and changing a favorite publish
//! [`InvalidationTag::BookmarkList`] before returning, so watched lists are
//! already refetching when the caller resumes. Recording a hit does not
//! invalidate anything. Failed writes leave the cache untouched.
//!
//! URLs are validated strictly but sent to the server as typed (trimmed), so
//! the stored bookmark matches what the user entered.

use std::sync::Arc;

use url::Url;

use crate::api::BookmarkApi;
use crate::app::{Result, SatchelError};
use crate::classify::parse_bookmark_url;
use crate::domain::InvalidationTag;
use crate::invalidation::InvalidationBus;

#[derive(Clone)]
pub struct MutationDispatcher {
    api: Arc<dyn BookmarkApi + Send + Sync>,
    bus: InvalidationBus,
}

impl MutationDispatcher {
    pub fn new(api: Arc<dyn BookmarkApi + Send + Sync>, bus: InvalidationBus) -> Self {
        Self { api, bus }
    }

    /// Add `raw` as a bookmark. Invalid URLs are rejected without a request.
    pub async fn add_bookmark(&self, raw: &str) -> Result<Url> {
        let raw = raw.trim();
        let url = validate(raw)?;
        self.api.add(raw).await?;
        tracing::info!("Added bookmark {}", raw);
        self.bus.publish(InvalidationTag::BookmarkList);
        Ok(url)
    }

    pub async fn set_favorite(&self, url: &str, is_favorite: bool) -> Result<()> {
        let url = url.trim();
        validate(url)?;
        self.api.set_favorite(url, is_favorite).await?;
        tracing::info!(
            "{} {}",
            if is_favorite { "Starred" } else { "Unstarred" },
            url
        );
        self.bus.publish(InvalidationTag::BookmarkList);
        Ok(())
    }

    /// Record that `url` was opened. Cached lists pick up the new ordering on
    /// their next refetch.
    pub async fn record_hit(&self, url: &str) -> Result<()> {
        let url = url.trim();
        validate(url)?;
        self.api.hit(url).await?;
        tracing::debug!("Recorded hit for {}", url);
        Ok(())
    }

    /// Record a hit in the background. Failures are logged and otherwise ignored.
    pub fn record_hit_detached(&self, url: &str) -> tokio::task::JoinHandle<()> {
        let dispatcher = self.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.record_hit(&url).await {
                tracing::warn!("Failed to record hit for {}: {}", url, e);
            }
        })
    }
}

fn validate(raw: &str) -> Result<Url> {
    parse_bookmark_url(raw).ok_or_else(|| SatchelError::InvalidUrl(raw.to_string()))
}

/// Text field for adding a bookmark. The text is kept when submission fails
/// so the user can correct it.
#[derive(Debug, Default)]
pub struct AddBookmarkForm {
    pub text: String,
}

impl AddBookmarkForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub async fn submit(&mut self, dispatcher: &MutationDispatcher) -> Result<Url> {
        let url = dispatcher.add_bookmark(&self.text).await?;
        self.text.clear();
        Ok(url)
    }
}
