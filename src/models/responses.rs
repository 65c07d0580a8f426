//! Response DTOs for the feed API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::StatsSnapshot;
use crate::feed::{Post, ServedFeed};

/// Response body for the feed endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    /// Always true
    pub ok: bool,
    /// The requested profile
    pub username: String,
    /// When the posts were fetched upstream (Unix milliseconds)
    pub fetched_at: i64,
    /// Number of posts
    pub count: usize,
    /// Posts, newest first
    pub posts: Vec<Post>,
    /// Whether the posts came from the cache
    pub cache: bool,
    /// Whether the cached posts had expired
    pub stale: bool,
    /// Which branch produced the answer
    pub note: String,
    /// Present when stale data replaced a failed scrape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Failure kind of that scrape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scrape_error: Option<String>,
}

impl FeedResponse {
    /// Creates a new FeedResponse from a served feed
    pub fn new(username: impl Into<String>, feed: &ServedFeed) -> Self {
        let scrape_error = feed.scrape_error().map(|error| error.code());
        Self {
            ok: true,
            username: username.into(),
            fetched_at: feed.fetched_at.timestamp_millis(),
            count: feed.posts.len(),
            posts: feed.posts.as_ref().clone(),
            cache: feed.from_cache(),
            stale: feed.is_stale(),
            note: feed.note().to_string(),
            warning: scrape_error.as_ref().map(|_| feed.note().to_string()),
            scrape_error,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub counters: StatsSnapshot,
    /// Usernames with a cache entry
    pub tracked_usernames: usize,
    /// Share of calls answered without contacting upstream
    pub cache_hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from feed statistics
    pub fn new(counters: StatsSnapshot, tracked_usernames: usize) -> Self {
        Self {
            cache_hit_rate: counters.cache_hit_rate(),
            counters,
            tracked_usernames,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::feed::{FeedSource, StaleReason};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn served(source: FeedSource) -> ServedFeed {
        ServedFeed {
            posts: Arc::new(vec![Post::new("abc", "hi", "https://cdn.example/a.jpg", Some(1))]),
            fetched_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            source,
        }
    }

    #[test]
    fn test_fresh_scrape_response() {
        let resp = FeedResponse::new("someone", &served(FeedSource::Scraped));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["count"], 1);
        assert_eq!(json["cache"], false);
        assert_eq!(json["stale"], false);
        assert_eq!(json["note"], "fresh-scrape");
        assert_eq!(json["fetchedAt"], 1_700_000_000_000i64);
        assert_eq!(json["posts"][0]["imageUrl"], "https://cdn.example/a.jpg");
        assert!(json.get("warning").is_none());
        assert!(json.get("scrapeError").is_none());
    }

    #[test]
    fn test_fallback_response_carries_error() {
        let source = FeedSource::Stale(StaleReason::Fallback(FetchError::RateLimited));
        let resp = FeedResponse::new("someone", &served(source));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["cache"], true);
        assert_eq!(json["stale"], true);
        assert_eq!(json["warning"], "fallback-stale-cache");
        assert_eq!(json["scrapeError"], "RATE_LIMIT");
    }

    #[test]
    fn test_cooldown_response() {
        let resp = FeedResponse::new("someone", &served(FeedSource::Stale(StaleReason::Cooldown)));
        assert!(resp.cache);
        assert!(resp.stale);
        assert_eq!(resp.note, "cooldown-returning-stale");
        assert!(resp.warning.is_none());
    }

    #[test]
    fn test_stats_response_flattens_counters() {
        let counters = StatsSnapshot {
            fresh_hits: 3,
            scrapes: 1,
            ..StatsSnapshot::default()
        };
        let json = serde_json::to_value(StatsResponse::new(counters, 2)).unwrap();
        assert_eq!(json["fresh_hits"], 3);
        assert_eq!(json["tracked_usernames"], 2);
        assert_eq!(json["cache_hit_rate"], 0.75);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
