//! Feed Cache - A cached profile feed service
//!
//! Serves the recent posts of a public profile while shielding upstream with
//! a freshness window, a scrape cooldown and stale fallback.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;

pub use api::AppState;
pub use config::Config;
pub use error::FetchError;
pub use feed::{FeedFetcher, FeedService, ServedFeed};
