//! API Module
//!
//! HTTP handlers and routing for the feed service REST API.
//!
//! # Endpoints
//! - `GET /api/instagram?user=` - Feed by query string
//! - `GET /api/ig/:username` - Feed by path
//! - `GET /stats` - Outcome counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
