//! Upstream fetcher seam.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::feed::Post;

/// Source of feed posts for a username.
///
/// Implementations return posts newest first, already truncated to `limit`,
/// and never an empty list on success. Any strategy switching happens inside
/// the single call.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetches the most recent posts of `username`.
    async fn fetch_posts(&self, username: &str, limit: usize) -> Result<Vec<Post>, FetchError>;
}

/// Shared, type-erased fetcher as held by the service.
pub type DynFeedFetcher = Arc<dyn FeedFetcher>;
