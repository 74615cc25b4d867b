//! Error types for the HTTP surface
//!
//! Maps every failure a handler can return to a status code and a
//! `{"error": message}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;
use crate::store::StoreError;
use crate::upstream::UpstreamError;

// == Public Messages ==
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later.";
pub const ROUTE_NOT_FOUND_MESSAGE: &str = "Route not found";

// == Api Error Enum ==
/// Unified error type returned by handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Client exceeded its request budget for the current window
    #[error("Rate limit of {limit} requests exceeded")]
    RateLimited { limit: u64 },

    /// Malformed client input, rejected before any upstream call
    #[error("{0}")]
    Validation(String),

    /// Upstream catalog failure
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Store failure on an operation that cannot degrade gracefully
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(#[from] StoreError),

    #[error("{0}")]
    NotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::RateLimited { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE.to_string())
            }
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Upstream(e) if e.is_not_found() => (StatusCode::NOT_FOUND, e.to_string()),
            ApiError::Upstream(e) => {
                error!(error = %e, "Upstream request failed");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            ApiError::CacheUnavailable(e) => {
                error!(error = %e, "Cache store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
