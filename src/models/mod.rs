//! Request and Response models for the proxy API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! deserializing query strings and serializing operational response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{BatchParams, ClearCacheParams, ListParams, NAMES_REQUIRED_MESSAGE};
pub use responses::{ClearCacheResponse, ErrorResponse, HealthResponse, StatsResponse};
