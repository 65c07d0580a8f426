//! Cache Module
//!
//! Provides the per-username feed cache with freshness and cooldown predicates.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::FeedEntry;
pub use stats::{FeedStats, StatsSnapshot};
pub use store::FeedStore;
