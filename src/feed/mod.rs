//! Feed Module
//!
//! Post records, the upstream fetcher seam with its Instagram implementation,
//! payload extraction, and the cache-fronted retrieval service.

pub mod extract;
mod fetcher;
mod instagram;
mod post;
mod service;

// Re-export public types
pub use extract::UndatedPolicy;
pub use fetcher::{DynFeedFetcher, FeedFetcher};
pub use instagram::InstagramFetcher;
pub use post::Post;
pub use service::{CachePolicy, FeedService, FeedSource, ServedFeed, StaleReason};
