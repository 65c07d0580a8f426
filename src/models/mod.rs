//! Request and Response models for the feed API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! deserializing query strings and serializing HTTP response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{FeedQuery, FeedRequest};
pub use responses::{FeedResponse, HealthResponse, StatsResponse};
