//! API Handlers
//!
//! HTTP request handlers for each feed service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::feed::{DynFeedFetcher, FeedService, InstagramFetcher};
use crate::models::{FeedQuery, FeedResponse, HealthResponse, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache-fronted feed retrieval
    pub service: FeedService,
    /// Limits applied during request validation
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new AppState around an existing service.
    pub fn new(service: FeedService, config: Config) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }

    /// Creates a new AppState with the given fetcher and an empty cache.
    pub fn with_fetcher(config: Config, fetcher: DynFeedFetcher) -> Self {
        let service = FeedService::from_config(&config, fetcher);
        Self::new(service, config)
    }

    /// Creates a new AppState from configuration.
    ///
    /// Fetches from the upstream configured in `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let fetcher = InstagramFetcher::new(config)?;
        Ok(Self::with_fetcher(config.clone(), Arc::new(fetcher)))
    }
}

/// Handler for GET /api/instagram?user=
///
/// Accepts the profile as `user` or `username`.
pub async fn instagram_feed_handler(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    serve_feed(&state, None, &query).await
}

/// Handler for GET /api/ig/:username
pub async fn profile_feed_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    serve_feed(&state, Some(username.as_str()), &query).await
}

async fn serve_feed(
    state: &AppState,
    path_username: Option<&str>,
    query: &FeedQuery,
) -> Result<Json<FeedResponse>> {
    let request = query
        .validate(path_username, state.config.default_limit, state.config.max_limit)
        .map_err(ApiError::InvalidRequest)?;

    let feed = state
        .service
        .get_feed(&request.username, request.limit, Utc::now())
        .await
        .map_err(|error| ApiError::Feed {
            username: request.username.clone(),
            error,
        })?;

    Ok(Json(FeedResponse::new(request.username, &feed)))
}

/// Handler for GET /stats
///
/// Returns outcome counters of the feed service.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.service.stats(),
        state.service.store().len(),
    ))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
