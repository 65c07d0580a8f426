//! API Routes
//!
//! Configures the Axum router with all feed service endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, instagram_feed_handler, profile_feed_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/instagram?user=<name>&limit=<n>` - Feed by query string
/// - `GET /api/ig/:username?limit=<n>` - Feed by path
/// - `GET /stats` - Outcome counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin, the feed is public data
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/instagram", get(instagram_feed_handler))
        .route("/api/ig/:username", get(profile_feed_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
