//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::feed::UndatedPolicy;

/// Default freshness window for cached feeds (10 minutes)
pub const DEFAULT_TTL_SECS: u64 = 600;
/// Default minimum interval between scrape attempts per username
pub const DEFAULT_COOLDOWN_SECS: u64 = 5;
/// Default upstream request timeout
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 8;
/// Default number of posts returned
pub const DEFAULT_LIMIT: usize = 10;
/// Largest accepted `limit` query parameter
pub const DEFAULT_MAX_LIMIT: usize = 50;
/// Default upstream origin
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://www.instagram.com";

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long a successful fetch is served as fresh
    pub ttl: Duration,
    /// Minimum interval between fetch attempts for one username
    pub cooldown: Duration,
    /// Upper bound on a single upstream fetch
    pub fetch_timeout: Duration,
    /// Number of posts returned when the caller gives no limit
    pub default_limit: usize,
    /// Largest limit a caller may request
    pub max_limit: usize,
    /// What to do with posts lacking a timestamp
    pub undated_policy: UndatedPolicy,
    /// Upstream origin, without trailing slash
    pub upstream_base_url: String,
    /// Maximum random delay added before each upstream request, in milliseconds
    pub fetch_jitter_ms: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - Freshness window in seconds (default: 600)
    /// - `SCRAPE_COOLDOWN_SECS` - Cooldown between attempts in seconds (default: 5)
    /// - `FETCH_TIMEOUT_SECS` - Upstream timeout in seconds (default: 8)
    /// - `DEFAULT_LIMIT` - Posts per response (default: 10)
    /// - `MAX_LIMIT` - Largest accepted limit (default: 50)
    /// - `UNDATED_POSTS` - `drop` or `append` (default: drop)
    /// - `UPSTREAM_BASE_URL` - Upstream origin (default: https://www.instagram.com)
    /// - `FETCH_JITTER_MS` - Max random pre-request delay (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ttl: Duration::from_secs(parse_env("CACHE_TTL_SECS").unwrap_or(DEFAULT_TTL_SECS)),
            cooldown: Duration::from_secs(
                parse_env("SCRAPE_COOLDOWN_SECS").unwrap_or(DEFAULT_COOLDOWN_SECS),
            ),
            fetch_timeout: Duration::from_secs(
                parse_env("FETCH_TIMEOUT_SECS").unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            ),
            default_limit: parse_env("DEFAULT_LIMIT")
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.default_limit),
            max_limit: parse_env("MAX_LIMIT")
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.max_limit),
            undated_policy: parse_env("UNDATED_POSTS").unwrap_or(defaults.undated_policy),
            upstream_base_url: env::var("UPSTREAM_BASE_URL")
                .ok()
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.upstream_base_url),
            fetch_jitter_ms: parse_env("FETCH_JITTER_MS").unwrap_or(defaults.fetch_jitter_ms),
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
            undated_policy: UndatedPolicy::Drop,
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            fetch_jitter_ms: 300,
            server_port: 3000,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
