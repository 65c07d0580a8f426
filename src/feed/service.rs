//! Feed Service
//!
//! The retrieval state machine: decides between a fresh cache hit, a stale
//! answer during the scrape cooldown, a new upstream fetch, and stale
//! fallback when that fetch fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::cache::{FeedEntry, FeedStats, FeedStore, StatsSnapshot};
use crate::config::Config;
use crate::error::FetchError;
use crate::feed::{DynFeedFetcher, Post};

// == Cache Policy ==
/// Timing knobs of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Entries younger than this are served without contacting upstream
    pub ttl: Duration,
    /// Minimum interval between fetch attempts for one username
    pub cooldown: Duration,
    /// Upper bound on one upstream fetch
    pub fetch_timeout: Duration,
    /// Limit used when the caller passes zero
    pub default_limit: usize,
    /// Posts fetched and cached per username; callers get a prefix
    pub max_limit: usize,
}

impl From<&Config> for CachePolicy {
    fn from(config: &Config) -> Self {
        Self {
            ttl: config.ttl,
            cooldown: config.cooldown,
            fetch_timeout: config.fetch_timeout,
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

// == Outcome Types ==
/// Why stale data was served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// A fetch was attempted too recently to try again
    Cooldown,
    /// A fetch was attempted and failed
    Fallback(FetchError),
}

/// Where a served feed came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Cached and within the TTL
    FreshCache,
    /// Cached but expired
    Stale(StaleReason),
    /// Fetched from upstream by this call
    Scraped,
}

/// A successful `get_feed` answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFeed {
    /// Posts, newest first
    pub posts: Arc<Vec<Post>>,
    /// When the posts were fetched from upstream
    pub fetched_at: DateTime<Utc>,
    /// Which branch produced the answer
    pub source: FeedSource,
}

impl ServedFeed {
    fn from_entry(entry: &FeedEntry, source: FeedSource) -> Option<Self> {
        if !entry.has_usable_stale() {
            return None;
        }
        Some(Self {
            posts: Arc::clone(&entry.posts),
            fetched_at: entry.fetched_at?,
            source,
        })
    }

    /// Keeps at most `limit` posts, sharing the cached list when it already fits.
    pub fn truncated(self, limit: usize) -> Self {
        if self.posts.len() <= limit {
            return self;
        }
        Self {
            posts: Arc::new(self.posts[..limit].to_vec()),
            ..self
        }
    }

    /// True unless the posts were fetched by this call.
    pub fn from_cache(&self) -> bool {
        !matches!(self.source, FeedSource::Scraped)
    }

    /// True when the TTL had expired.
    pub fn is_stale(&self) -> bool {
        matches!(self.source, FeedSource::Stale(_))
    }

    /// The failed fetch behind a fallback answer.
    pub fn scrape_error(&self) -> Option<&FetchError> {
        match &self.source {
            FeedSource::Stale(StaleReason::Fallback(error)) => Some(error),
            _ => None,
        }
    }

    /// Short label describing the branch taken.
    pub fn note(&self) -> &'static str {
        match &self.source {
            FeedSource::FreshCache => "fresh-cache",
            FeedSource::Stale(StaleReason::Cooldown) => "cooldown-returning-stale",
            FeedSource::Stale(StaleReason::Fallback(_)) => "fallback-stale-cache",
            FeedSource::Scraped => "fresh-scrape",
        }
    }
}

// == Feed Service ==
/// Cache-fronted feed retrieval. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct FeedService {
    store: Arc<FeedStore>,
    fetcher: DynFeedFetcher,
    stats: Arc<FeedStats>,
    policy: CachePolicy,
}

impl FeedService {
    // == Constructor ==
    /// Creates a service over an existing store.
    pub fn new(store: Arc<FeedStore>, fetcher: DynFeedFetcher, policy: CachePolicy) -> Self {
        Self {
            store,
            fetcher,
            stats: Arc::new(FeedStats::new()),
            policy,
        }
    }

    /// Creates a service with an empty store and settings from `config`.
    pub fn from_config(config: &Config, fetcher: DynFeedFetcher) -> Self {
        Self::new(Arc::new(FeedStore::new()), fetcher, CachePolicy::from(config))
    }

    // == Accessors ==
    /// Returns the underlying cache store.
    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    /// Returns the timing and limit settings in effect.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Returns a snapshot of the outcome counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // == Get Feed ==
    /// Answers with the posts of `username` as of `now`.
    ///
    /// A `limit` of zero means the configured default. Upstream is always
    /// asked for `max_limit` posts and the cached list is shared by every
    /// caller, so `limit` only trims the answer.
    ///
    /// The decision and any fetch run in a spawned task holding the
    /// username's lock: dropping the returned future does not abort a fetch
    /// already under way, and its result still lands in the cache.
    ///
    /// # Errors
    /// Returns the fetch failure when upstream fails and nothing is cached.
    pub async fn get_feed(
        &self,
        username: &str,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<ServedFeed, FetchError> {
        let limit = if limit == 0 {
            self.policy.default_limit
        } else {
            limit
        };

        let service = self.clone();
        let username = username.to_string();
        let task = tokio::spawn(async move { service.resolve(&username, now).await });

        let feed = task.await.map_err(|e| {
            error!("feed task failed: {}", e);
            FetchError::Unknown(format!("feed task failed: {}", e))
        })??;
        Ok(feed.truncated(limit))
    }

    async fn resolve(&self, username: &str, now: DateTime<Utc>) -> Result<ServedFeed, FetchError> {
        let _guard = self.store.lock(username).await;
        let cached = self.store.get(username);

        // 1. Fresh entry
        if let Some(entry) = cached.as_ref().filter(|e| e.is_fresh(now, self.policy.ttl)) {
            if let Some(feed) = ServedFeed::from_entry(entry, FeedSource::FreshCache) {
                debug!(username, "serving fresh cache");
                self.stats.record_fresh_hit();
                return Ok(feed);
            }
        }

        // 2. Recent attempt, do not contact upstream again
        if let Some(entry) = cached
            .as_ref()
            .filter(|e| e.is_in_cooldown(now, self.policy.cooldown))
        {
            let source = FeedSource::Stale(StaleReason::Cooldown);
            return match ServedFeed::from_entry(entry, source) {
                Some(feed) => {
                    debug!(username, "scrape cooldown active, serving stale cache");
                    self.stats.record_cooldown_hit();
                    Ok(feed)
                }
                None => {
                    let error = entry.last_error.clone().unwrap_or_else(|| {
                        FetchError::Unknown("previous scrape attempt is cooling down".to_string())
                    });
                    debug!(username, error = %error, "scrape cooldown active, nothing cached");
                    self.stats.record_error();
                    Err(error)
                }
            };
        }

        // 3. Fetch
        self.store.mark_scrape_started(username, now);
        self.stats.record_scrape();
        let limit = self.policy.max_limit;
        info!(username, limit, "fetching feed from upstream");

        match self.fetch(username, limit).await {
            Ok(posts) => {
                let posts = Arc::new(posts);
                self.store.commit_success(username, now, Arc::clone(&posts));
                info!(username, count = posts.len(), "feed cached");
                Ok(ServedFeed {
                    posts,
                    fetched_at: now,
                    source: FeedSource::Scraped,
                })
            }
            Err(error) => {
                self.stats.record_scrape_failure();
                self.store.record_failure(username, error.clone());

                let source = FeedSource::Stale(StaleReason::Fallback(error.clone()));
                match cached.as_ref().and_then(|e| ServedFeed::from_entry(e, source)) {
                    Some(feed) => {
                        warn!(username, error = %error, "scrape failed, serving stale cache");
                        self.stats.record_fallback_hit();
                        Ok(feed)
                    }
                    None => {
                        warn!(username, error = %error, "scrape failed with nothing cached");
                        self.stats.record_error();
                        Err(error)
                    }
                }
            }
        }
    }

    /// Runs the fetcher under the timeout. An empty result is a failure.
    async fn fetch(&self, username: &str, limit: usize) -> Result<Vec<Post>, FetchError> {
        let timeout = self.policy.fetch_timeout;
        match tokio::time::timeout(timeout, self.fetcher.fetch_posts(username, limit)).await {
            Ok(Ok(posts)) if posts.is_empty() => Err(FetchError::NoPosts),
            Ok(result) => result,
            Err(_) => Err(FetchError::Unknown(format!(
                "upstream fetch timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }
}
