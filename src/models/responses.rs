//! Response DTOs for the proxy API
//!
//! Bodies of the operational endpoints. Catalog responses are the cached
//! values themselves.

use serde::Serialize;

use crate::cache::StatsSnapshot;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub decode_failures: u64,
    pub store_errors: u64,
    pub upstream_fetches: u64,
    pub upstream_failures: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<StatsSnapshot> for StatsResponse {
    fn from(stats: StatsSnapshot) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            decode_failures: stats.decode_failures,
            store_errors: stats.store_errors,
            upstream_fetches: stats.upstream_fetches,
            upstream_failures: stats.upstream_failures,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// "connected" or "disconnected"
    pub store: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(store_reachable: bool) -> Self {
        let store = if store_reachable {
            "connected"
        } else {
            "disconnected"
        };
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            store: store.to_string(),
        }
    }
}

/// Response body for DELETE /api/cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    pub pattern: String,
    pub deleted: u64,
}

impl ClearCacheResponse {
    pub fn new(pattern: impl Into<String>, deleted: u64) -> Self {
        Self {
            pattern: pattern.into(),
            deleted,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_hit_rate() {
        let resp = StatsResponse::from(StatsSnapshot {
            hits: 80,
            misses: 20,
            ..StatsSnapshot::default()
        });
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::from(StatsSnapshot::default());
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_value(HealthResponse::healthy(false)).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["store"], "disconnected");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_clear_cache_response_serialize() {
        let json = serde_json::to_string(&ClearCacheResponse::new("pokemon:*", 12)).unwrap();
        assert_eq!(json, r#"{"pattern":"pokemon:*","deleted":12}"#);
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"error":"Something went wrong"}"#);
    }
}
