//! Error types for the feed service
//!
//! Provides the upstream failure taxonomy and the HTTP-facing error using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

// == Fetch Error Enum ==
/// Typed upstream failure, surfaced by fetchers and consumed by the orchestrator.
///
/// Every kind is eligible for stale fallback; only a missing cache entry
/// turns one into a caller-visible error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Upstream throttled the request (HTTP 429)
    #[error("RATE_LIMIT")]
    RateLimited,

    /// Upstream rejected the request outright (HTTP 403)
    #[error("FORBIDDEN")]
    Forbidden,

    /// Upstream answered with an authentication gate instead of data
    #[error("LOGIN_WALL")]
    LoginWall,

    /// Response received but the expected data structure is absent
    #[error("NO_STRUCTURE")]
    NoStructure,

    /// Structure present but zero usable records
    #[error("NO_POSTS")]
    NoPosts,

    /// Non-success HTTP status not covered above
    #[error("UPSTREAM_HTTP_{0}")]
    UpstreamHttp(u16),

    /// Network error, parse error, timeout or anything else
    #[error("UNKNOWN: {0}")]
    Unknown(String),
}

impl FetchError {
    // == Code ==
    /// Stable machine-readable kind, e.g. `RATE_LIMIT` or `UPSTREAM_HTTP_500`.
    pub fn code(&self) -> String {
        match self {
            FetchError::Unknown(_) => "UNKNOWN".to_string(),
            other => other.to_string(),
        }
    }

    // == Status Code ==
    /// External status a transport should answer with when no stale data exists.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FetchError::RateLimited => StatusCode::SERVICE_UNAVAILABLE,
            FetchError::Forbidden
            | FetchError::LoginWall
            | FetchError::NoStructure
            | FetchError::UpstreamHttp(_) => StatusCode::BAD_GATEWAY,
            FetchError::NoPosts => StatusCode::NOT_FOUND,
            FetchError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // == Recoverable By Page Scrape ==
    /// Whether a failed primary strategy may be retried with the page scrape.
    pub fn allows_page_fallback(&self) -> bool {
        matches!(
            self,
            FetchError::RateLimited
                | FetchError::Forbidden
                | FetchError::LoginWall
                | FetchError::UpstreamHttp(_)
        )
    }

    /// Human readable message for error envelopes.
    ///
    /// Never carries the detail of `Unknown`, which may name upstream URLs.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::RateLimited => "Upstream rate limited this IP (429). Try later.".to_string(),
            FetchError::Forbidden | FetchError::LoginWall | FetchError::NoStructure => {
                "Upstream returned login wall / blocked content.".to_string()
            }
            FetchError::NoPosts => "Profile has no public posts.".to_string(),
            FetchError::UpstreamHttp(code) => format!("Upstream responded with HTTP {}.", code),
            FetchError::Unknown(_) => "Failed to fetch the feed from upstream.".to_string(),
        }
    }
}

// == Api Error Enum ==
/// Error returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No usable feed data for the username
    #[error("Feed unavailable for {username}: {error}")]
    Feed { username: String, error: FetchError },
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "ok": false,
                    "error": msg,
                }),
            ),
            ApiError::Feed { username, error } => {
                if let FetchError::Unknown(detail) = error {
                    error!(username = %username, detail = %detail, "feed request failed");
                }
                (
                    error.status_code(),
                    json!({
                        "ok": false,
                        "username": username,
                        "error": error.user_message(),
                        "code": error.code(),
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
