//! # Satchel
//!
//! Client-side data synchronization for a personal bookmark server.
//!
//! ## Architecture
//!
//! ```text
//! input → Debouncer → QueryCache ⇄ Fetcher → BookmarkApi → server
//!                         ↑
//! MutationDispatcher → InvalidationBus
//! ```
//!
//! Views subscribe to a [`QueryKey`](domain::QueryKey) and are called back as
//! the list loads. Writes go through the
//! [`MutationDispatcher`](mutation::MutationDispatcher), which invalidates the
//! affected lists so every watching view refetches.
//!
//! ## Quick Start
//!
//! ```bash
//! # Show favorites and recent visits
//! satchel favorites
//! satchel recents --count 20
//!
//! # Search, add and star
//! satchel search pasta
//! satchel add https://www.rust-lang.org/
//! satchel star https://www.rust-lang.org/
//!
//! # Interactive prompt
//! satchel shell
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the API client,
/// fetcher, cache, invalidation bus and mutation dispatcher.
pub mod app;

/// Transport seam to the bookmark server.
///
/// - [`BookmarkApi`](api::BookmarkApi): async trait for the server endpoints
/// - [`HttpApi`](api::HttpApi): reqwest-based implementation
pub mod api;

/// Keyed list cache with subscriptions, staleness and eviction.
pub mod cache;

/// Tells bookmark URLs apart from search phrases.
pub mod classify;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/satchel/config.toml`.
pub mod config;

/// Quiet-period filter for typed search text.
pub mod debounce;

/// Core domain models: bookmarks, query keys and invalidation tags.
pub mod domain;

/// Single-flight list reads.
pub mod fetcher;

/// Fan-out of "this list is stale" announcements.
pub mod invalidation;

/// Add, star and hit operations.
pub mod mutation;
