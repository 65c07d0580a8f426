//! Feed Statistics Module
//!
//! Counts how each `get_feed` call was resolved.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Feed Stats ==
/// Outcome counters, safe to bump from concurrent handlers.
#[derive(Debug, Default)]
pub struct FeedStats {
    fresh_hits: AtomicU64,
    cooldown_hits: AtomicU64,
    fallback_hits: AtomicU64,
    scrapes: AtomicU64,
    scrape_failures: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of [`FeedStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Served from a fresh entry
    pub fresh_hits: u64,
    /// Served stale because of the scrape cooldown
    pub cooldown_hits: u64,
    /// Served stale after a failed scrape
    pub fallback_hits: u64,
    /// Upstream fetch attempts
    pub scrapes: u64,
    /// Upstream fetch attempts that failed
    pub scrape_failures: u64,
    /// Calls that ended with no data at all
    pub errors: u64,
}

impl FeedStats {
    // == Constructor ==
    /// Creates a new FeedStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Cache Outcomes ==
    /// Records a call answered from a fresh entry.
    pub fn record_fresh_hit(&self) {
        self.fresh_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a stale answer given during the scrape cooldown.
    pub fn record_cooldown_hit(&self) {
        self.cooldown_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a stale answer given after a failed scrape.
    pub fn record_fallback_hit(&self) {
        self.fallback_hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Upstream Outcomes ==
    /// Records an upstream fetch attempt.
    pub fn record_scrape(&self) {
        self.scrapes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed upstream fetch attempt.
    pub fn record_scrape_failure(&self) {
        self.scrape_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a call that ended with no data.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fresh_hits: self.fresh_hits.load(Ordering::Relaxed),
            cooldown_hits: self.cooldown_hits.load(Ordering::Relaxed),
            fallback_hits: self.fallback_hits.load(Ordering::Relaxed),
            scrapes: self.scrapes.load(Ordering::Relaxed),
            scrape_failures: self.scrape_failures.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Share of calls answered without contacting upstream.
    ///
    /// Returns 0.0 if no calls have been made.
    pub fn cache_hit_rate(&self) -> f64 {
        let cached = self.fresh_hits + self.cooldown_hits;
        let total = cached + self.scrapes;
        if total == 0 {
            0.0
        } else {
            cached as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = FeedStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(FeedStats::new().snapshot().cache_hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = FeedStats::new();
        stats.record_fresh_hit();
        stats.record_cooldown_hit();
        stats.record_scrape();
        stats.record_scrape();
        assert_eq!(stats.snapshot().cache_hit_rate(), 0.5);
    }

    #[test]
    fn test_counters_are_independent() {
        let stats = FeedStats::new();
        stats.record_scrape();
        stats.record_scrape_failure();
        stats.record_fallback_hit();
        stats.record_error();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.scrapes, 1);
        assert_eq!(snapshot.scrape_failures, 1);
        assert_eq!(snapshot.fallback_hits, 1);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.fresh_hits, 0);
    }
}
