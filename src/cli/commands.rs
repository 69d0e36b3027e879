use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::{AppContext, Result, SatchelError};
use crate::cache::{CacheEntry, QueryStatus, Subscription};
use crate::classify::{classify, Input};
use crate::debounce::Debouncer;
use crate::domain::{BookmarkEntry, QueryKey};
use crate::mutation::AddBookmarkForm;

/// Fetch one list and print it.
pub async fn list(ctx: &AppContext, key: QueryKey) -> Result<()> {
    let entry = ctx.cache.fetch_query(&key).await;

    if let Some(error) = entry.error {
        return Err(SatchelError::Network(error));
    }

    if entry.rows().is_empty() {
        println!("No bookmarks");
        return Ok(());
    }

    print_rows(entry.rows());
    Ok(())
}

pub async fn add(ctx: &AppContext, url: &str) -> Result<()> {
    let url = ctx.mutations.add_bookmark(url).await?;
    println!("Added bookmark: {}", url);
    Ok(())
}

pub async fn set_favorite(ctx: &AppContext, url: &str, is_favorite: bool) -> Result<()> {
    ctx.mutations.set_favorite(url, is_favorite).await?;
    if is_favorite {
        println!("Starred: {}", url);
    } else {
        println!("Unstarred: {}", url);
    }
    Ok(())
}

/// Record a visit, then open the page. A failed hit does not stop the browser.
pub async fn open(ctx: &AppContext, url: &str) -> Result<()> {
    if let Err(e) = ctx.mutations.record_hit(url).await {
        if e.is_invalid_url() {
            return Err(e);
        }
        tracing::warn!("Failed to record hit for {}: {}", url, e);
    }

    open::that(url)?;
    println!("Opened: {}", url);
    Ok(())
}

/// Line-oriented front end over the live cache.
///
/// A URL is added as a bookmark and the recents list is shown. Other text
/// is debounced and becomes the search shown below the prompt; an empty line
/// goes back to favorites.
pub async fn shell(ctx: &AppContext) -> Result<()> {
    let favorites = QueryKey::favorites(ctx.config.lists.favorites_count);
    let mut debouncer = ctx.search_debouncer();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type a URL to bookmark it, text to search, an empty line for favorites. Ctrl-D quits.");
    let mut view = watch(ctx, favorites.clone());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if let Some(key) = handle_line(ctx, &debouncer, &line).await {
                    view = watch(ctx, key);
                }
            }
            Some(query) = debouncer.recv() => {
                let key = if query.is_empty() {
                    favorites.clone()
                } else {
                    QueryKey::search(query)
                };
                // Replacing the subscription unsubscribes from the old list.
                view = watch(ctx, key);
            }
        }
    }

    debouncer.cancel();
    drop(view);
    ctx.shutdown();
    Ok(())
}

/// Act on one shell line. Returns the list to switch to right away, if any.
async fn handle_line(ctx: &AppContext, debouncer: &Debouncer, line: &str) -> Option<QueryKey> {
    match classify(line) {
        Input::Bookmark(_) => {
            let mut form = AddBookmarkForm::new(line.trim());
            match form.submit(&ctx.mutations).await {
                Ok(url) => {
                    println!("Added bookmark: {}", url);
                    Some(QueryKey::recents(ctx.config.lists.recents_count))
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    None
                }
            }
        }
        Input::Search(text) => {
            debouncer.push(text);
            None
        }
        Input::Empty => {
            debouncer.push("");
            None
        }
    }
}

fn watch(ctx: &AppContext, key: QueryKey) -> Subscription {
    ctx.cache.subscribe(key, render)
}

fn render(entry: &CacheEntry) {
    match entry.status {
        QueryStatus::Idle => {}
        QueryStatus::Loading => {
            if entry.data.is_none() {
                println!("Loading {}...", entry.key);
            }
        }
        QueryStatus::Success => {
            println!("-- {} --", entry.key);
            if entry.rows().is_empty() {
                println!("No bookmarks");
            } else {
                print_rows(entry.rows());
            }
        }
        QueryStatus::Error => {
            eprintln!(
                "Error loading {}: {}",
                entry.key,
                entry.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

fn print_rows(rows: &[BookmarkEntry]) {
    for bookmark in rows {
        let star = if bookmark.is_favorite { "★" } else { " " };
        println!(
            "{} {}  ({})\n    {}",
            star,
            bookmark.display_title(),
            bookmark.host(),
            bookmark.url
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::api::mock::MockApi;
    use crate::config::Config;

    fn context(api: &Arc<MockApi>) -> AppContext {
        AppContext::with_api(api.clone(), Config::default())
    }

    #[tokio::test]
    async fn test_list_reports_server_errors() {
        let api = Arc::new(MockApi::new());
        api.fail_lists(true);
        let ctx = context(&api);

        let err = list(&ctx, QueryKey::recents(5)).await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_list_prints_rows() {
        let api = Arc::new(MockApi::with_bookmarks(&[(
            "Rust",
            "https://www.rust-lang.org/",
            true,
        )]));
        let ctx = context(&api);

        list(&ctx, QueryKey::search("rust")).await.unwrap();
        assert_eq!(api.calls(), vec!["/api/search?q=rust"]);
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_url_before_launching() {
        let api = Arc::new(MockApi::new());
        let ctx = context(&api);

        let err = open(&ctx, "not a url").await.unwrap_err();
        assert!(err.is_invalid_url());
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_added_url_switches_to_recents() {
        let api = Arc::new(MockApi::new());
        let ctx = context(&api);
        let debouncer = ctx.search_debouncer();

        let key = handle_line(&ctx, &debouncer, "  https://tokio.rs  ").await;
        assert_eq!(key, Some(QueryKey::recents(ctx.config.lists.recents_count)));
        assert_eq!(api.calls(), vec!["/api/add?url=https%3A%2F%2Ftokio.rs"]);

        // Searches and failed adds keep the current list.
        assert_eq!(handle_line(&ctx, &debouncer, "pasta").await, None);
        api.fail_mutations(true);
        assert_eq!(handle_line(&ctx, &debouncer, "https://docs.rs/").await, None);
    }
}
