//! Feed Store Module
//!
//! Owns every cached feed entry, keyed by username, plus the per-username
//! locks that serialize the decide-and-fetch sequence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::cache::FeedEntry;
use crate::error::FetchError;
use crate::feed::Post;

// == Feed Store ==
/// Process-lifetime feed cache.
///
/// Entries are only ever overwritten, never removed. Both maps are sharded,
/// so work on different usernames does not contend.
#[derive(Debug, Default)]
pub struct FeedStore {
    /// Cached entries by username
    entries: DashMap<String, FeedEntry>,
    /// One async mutex per username
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FeedStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Lock ==
    /// Acquires the critical section for `username`.
    ///
    /// The guard is owned so it can travel into a spawned task.
    pub async fn lock(&self, username: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(username.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    // == Get ==
    /// Returns a snapshot of the entry for `username`. No side effects.
    pub fn get(&self, username: &str) -> Option<FeedEntry> {
        self.entries.get(username).map(|entry| entry.value().clone())
    }

    // == Mark Scrape Started ==
    /// Records that a fetch is being attempted now, creating the entry if absent.
    pub fn mark_scrape_started(&self, username: &str, now: DateTime<Utc>) {
        self.entries
            .entry(username.to_string())
            .or_default()
            .last_scrape_at = Some(now);
        debug!(username, "scrape started");
    }

    // == Commit Success ==
    /// Replaces the cached posts after a successful fetch.
    ///
    /// An empty result is refused and leaves the entry untouched; returns
    /// whether the write happened.
    pub fn commit_success(
        &self,
        username: &str,
        now: DateTime<Utc>,
        posts: Arc<Vec<Post>>,
    ) -> bool {
        if posts.is_empty() {
            warn!(username, "refusing to cache an empty feed");
            return false;
        }

        let mut entry = self.entries.entry(username.to_string()).or_default();
        entry.posts = posts;
        entry.fetched_at = Some(now);
        entry.last_error = None;
        true
    }

    // == Record Failure ==
    /// Remembers why the last attempt failed. Cached posts are not touched.
    pub fn record_failure(&self, username: &str, error: FetchError) {
        self.entries
            .entry(username.to_string())
            .or_default()
            .last_error = Some(error);
    }

    // == Length ==
    /// Returns the number of usernames with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if no username has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
