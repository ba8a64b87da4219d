//! Process-wide response cache with single-flight fetch coordination.
//!
//! Entries are immutable once fetched and live for the process lifetime:
//! there is no eviction, no TTL and no size bound. That is intentional and
//! matches the protocol contract, but it is a capacity limitation for
//! long-running deployments (see DESIGN.md).

use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tracing::debug;

use crate::source::SourceError;

type FetchResult = Result<Bytes, SourceError>;

enum Slot {
    /// Fully materialized content.
    Ready(Bytes),
    /// A fetch is in flight; waiters subscribe here for its result.
    Pending(watch::Receiver<Option<FetchResult>>),
}

enum Claim {
    Wait(watch::Receiver<Option<FetchResult>>),
    Lead(watch::Sender<Option<FetchResult>>),
}

/// Concurrency-safe map from resource identifier to fetched bytes.
///
/// Identifiers are compared as plain strings; no normalization is applied.
pub struct ResponseCache {
    entries: DashMap<String, Slot>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Return the cached bytes for `key`, fetching them with `fetch` if absent.
    ///
    /// At most one caller runs `fetch` per key at a time; concurrent callers
    /// for the same key wait for that fetch and share its result, success or
    /// error. Errors are never cached: the next call after a failure fetches
    /// again. Fetches for different keys proceed independently; the map lock
    /// is only held for slot bookkeeping, never across a fetch.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> FetchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult>,
    {
        let claim = match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) => match occupied.get() {
                Slot::Ready(bytes) => {
                    debug!(key, "cache hit");
                    return Ok(bytes.clone());
                }
                Slot::Pending(rx) => Claim::Wait(rx.clone()),
            },
            Entry::Vacant(vacant) => {
                let (tx, rx) = watch::channel(None);
                vacant.insert(Slot::Pending(rx));
                Claim::Lead(tx)
            }
        };

        match claim {
            Claim::Wait(mut rx) => {
                debug!(key, "joining in-flight fetch");
                loop {
                    if let Some(result) = rx.borrow_and_update().clone() {
                        return result;
                    }
                    if rx.changed().await.is_err() {
                        // Leader dropped without publishing (task aborted).
                        return Err(SourceError::Upstream {
                            url: key.to_string(),
                            message: "in-flight fetch was aborted".to_string(),
                        });
                    }
                }
            }
            Claim::Lead(tx) => {
                debug!(key, "cache miss, fetching");
                // If this task is dropped mid-fetch, clear the pending slot so
                // the key does not stay stuck forever.
                let mut guard = PendingGuard {
                    entries: &self.entries,
                    key,
                    armed: true,
                };

                let result = fetch().await;

                match &result {
                    Ok(bytes) => {
                        self.entries
                            .insert(key.to_string(), Slot::Ready(bytes.clone()));
                    }
                    Err(_) => {
                        self.entries.remove(key);
                    }
                }
                guard.armed = false;

                // Waiters may all be gone; that is fine.
                let _ = tx.send(Some(result.clone()));
                result
            }
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

struct PendingGuard<'a> {
    entries: &'a DashMap<String, Slot>,
    key: &'a str,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.entries.remove(self.key);
        }
    }
}
