//! Feed Entry Module
//!
//! Defines the per-username cache entry and its freshness predicates.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::FetchError;
use crate::feed::Post;

// == Feed Entry ==
/// Cached feed state for a single username.
///
/// `fetched_at` moves only on a successful fetch, `last_scrape_at` on every
/// attempt. Whenever `fetched_at` is set, `posts` is non-empty.
#[derive(Debug, Clone, Default)]
pub struct FeedEntry {
    /// Posts from the last successful fetch, newest first
    pub posts: Arc<Vec<Post>>,
    /// When `posts` was last written
    pub fetched_at: Option<DateTime<Utc>>,
    /// When a fetch was last initiated, regardless of outcome
    pub last_scrape_at: Option<DateTime<Utc>>,
    /// Failure of the most recent unsuccessful attempt
    pub last_error: Option<FetchError>,
}

impl FeedEntry {
    // == Is Fresh ==
    /// Checks whether the entry can be served without contacting upstream.
    ///
    /// Boundary condition: an entry whose age equals the TTL is no longer fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.fetched_at {
            Some(fetched_at) => !self.posts.is_empty() && elapsed(fetched_at, now) < ttl,
            None => false,
        }
    }

    // == Is In Cooldown ==
    /// Checks whether a fetch was attempted less than `cooldown` ago.
    pub fn is_in_cooldown(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
        self.last_scrape_at
            .is_some_and(|started| elapsed(started, now) < cooldown)
    }

    // == Has Usable Stale ==
    /// True when there are posts to fall back on, whatever their age.
    pub fn has_usable_stale(&self) -> bool {
        !self.posts.is_empty()
    }

    /// Age of the cached posts, if any were ever written.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.fetched_at.map(|fetched_at| elapsed(fetched_at, now))
    }
}

// == Utility Functions ==
/// Time between `since` and `now`; a clock stepping backwards counts as zero.
pub fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}
