//! Process-wide, in-memory session storage.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::History;

/// Default history bound (the last 10 exchanges).
pub const DEFAULT_MAX_HISTORY: usize = 20;

/// Thread-safe mapping from client identifier to [`History`].
///
/// Cloning produces a shared view of the same store. Reads clone the stored
/// history out, so no shard guard is ever held across an `.await`.
///
/// Entries are never evicted: one history (and one lock) per distinct client
/// id lives for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    histories: DashMap<String, History>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    max_history: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl SessionStore {
    /// Create a store bounding every history to `max_history` turns.
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                histories: DashMap::new(),
                locks: DashMap::new(),
                max_history,
            }),
        }
    }

    /// Configured history bound.
    #[must_use]
    pub fn max_history(&self) -> usize {
        self.inner.max_history
    }

    /// Stored history for `client_id`, or an empty one.
    #[must_use]
    pub fn get(&self, client_id: &str) -> History {
        self.inner
            .histories
            .get(client_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Replace the stored history, keeping only the most recent turns.
    pub fn put(&self, client_id: &str, history: History) {
        let history = history.truncated(self.inner.max_history);
        self.inner.histories.insert(client_id.to_string(), history);
    }

    /// Serialize work for one client id.
    ///
    /// The returned guard must be held for the full read, backend call, write
    /// cycle. Different client ids never contend.
    pub async fn acquire(&self, client_id: &str) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(
            self.inner
                .locks
                .entry(client_id.to_string())
                .or_default()
                .value(),
        );
        lock.lock_owned().await
    }

    /// Number of clients with a stored history.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.histories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.histories.is_empty()
    }
}
