//! In-memory bookmark server for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::api::{add_path, hit_path, list_path, set_favorite_path, BookmarkApi};
use crate::app::{Result, SatchelError};
use crate::domain::{BookmarkEntry, QueryKey};

struct Row {
    entry: BookmarkEntry,
    hits: u64,
    last_access: u64,
}

#[derive(Default)]
struct State {
    rows: Vec<Row>,
    clock: u64,
    calls: Vec<String>,
    gates: VecDeque<oneshot::Receiver<Result<Vec<BookmarkEntry>>>>,
}

/// Behaves like the real server's database: favorites ordered by hits,
/// recents by last access, search by substring.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<State>,
    fail_lists: AtomicBool,
    fail_mutations: AtomicBool,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bookmarks(bookmarks: &[(&str, &str, bool)]) -> Self {
        let api = Self::new();
        {
            let mut state = api.state.lock().unwrap();
            for (title, url, is_favorite) in bookmarks {
                state.clock += 1;
                let last_access = state.clock;
                state.rows.push(Row {
                    entry: BookmarkEntry::new(*title, *url, *is_favorite),
                    hits: 0,
                    last_access,
                });
            }
        }
        api
    }

    /// Paths of every request received, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Hold the next list request until the returned sender answers it.
    pub fn gate_next_list(&self) -> oneshot::Sender<Result<Vec<BookmarkEntry>>> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().gates.push_back(rx);
        tx
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    pub fn entry(&self, url: &str) -> Option<BookmarkEntry> {
        self.state
            .lock()
            .unwrap()
            .rows
            .iter()
            .find(|r| r.entry.url == url)
            .map(|r| r.entry.clone())
    }

    fn mutation(&self, path: String, apply: impl FnOnce(&mut State)) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(path.clone());
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(SatchelError::Network(format!("{} returned 500", path)));
        }
        apply(&mut state);
        Ok(())
    }

    fn query(&self, key: &QueryKey) -> Vec<BookmarkEntry> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<&Row> = state.rows.iter().collect();
        match key {
            QueryKey::Favorites { count } => {
                rows.retain(|r| r.entry.is_favorite);
                rows.sort_by(|a, b| b.hits.cmp(&a.hits));
                rows.truncate(*count as usize);
            }
            QueryKey::Recents { count } => {
                rows.sort_by(|a, b| b.last_access.cmp(&a.last_access));
                rows.truncate(*count as usize);
            }
            QueryKey::Search { query } => {
                let needle = query.to_lowercase();
                rows.retain(|r| {
                    r.entry.title.to_lowercase().contains(&needle)
                        || r.entry.url.to_lowercase().contains(&needle)
                });
            }
        }
        rows.into_iter().map(|r| r.entry.clone()).collect()
    }
}

#[async_trait]
impl BookmarkApi for MockApi {
    async fn list(&self, key: &QueryKey) -> Result<Vec<BookmarkEntry>> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(list_path(key));
            state.gates.pop_front()
        };

        // Let other tasks observe the request as in flight.
        tokio::task::yield_now().await;

        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Err(SatchelError::Network("gate dropped".into())));
        }

        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(SatchelError::Network(format!(
                "{} returned 500",
                list_path(key)
            )));
        }

        Ok(self.query(key))
    }

    async fn add(&self, url: &str) -> Result<()> {
        tokio::task::yield_now().await;
        self.mutation(add_path(url), |state| {
            state.clock += 1;
            let last_access = state.clock;
            if !state.rows.iter().any(|r| r.entry.url == url) {
                state.rows.push(Row {
                    entry: BookmarkEntry::new(url, url, false),
                    hits: 0,
                    last_access,
                });
            }
        })
    }

    async fn hit(&self, url: &str) -> Result<()> {
        tokio::task::yield_now().await;
        self.mutation(hit_path(url), |state| {
            state.clock += 1;
            let now = state.clock;
            if let Some(row) = state.rows.iter_mut().find(|r| r.entry.url == url) {
                row.hits += 1;
                row.last_access = now;
            }
        })
    }

    async fn set_favorite(&self, url: &str, is_favorite: bool) -> Result<()> {
        tokio::task::yield_now().await;
        self.mutation(set_favorite_path(url, is_favorite), |state| {
            if let Some(row) = state.rows.iter_mut().find(|r| r.entry.url == url) {
                row.entry.is_favorite = is_favorite;
            }
        })
    }
}
