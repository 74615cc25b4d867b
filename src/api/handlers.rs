//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{AccessLayer, Codec};
use crate::catalog::{BatchResult, Catalog};
use crate::config::Config;
use crate::error::{ApiError, Result, ROUTE_NOT_FOUND_MESSAGE};
use crate::models::{
    BatchParams, ClearCacheParams, ClearCacheResponse, HealthResponse, ListParams,
    StatsResponse, NAMES_REQUIRED_MESSAGE,
};
use crate::ratelimit::RateGovernor;
use crate::store::{clear_matching, KeyValueStore};
use crate::upstream::SpeciesApi;

/// Application state shared across all handlers.
///
/// The store handle is shared by the catalog, the rate governor and the
/// admin endpoints.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub governor: Arc<RateGovernor>,
    pub store: Arc<dyn KeyValueStore>,
    /// COUNT hint for each SCAN of an administrative clear
    pub clear_scan_count: usize,
}

impl AppState {
    /// Wires the catalog and rate governor over `store` and `upstream`.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        upstream: Arc<dyn SpeciesApi>,
        config: &Config,
    ) -> Self {
        let access = AccessLayer::new(
            store.clone(),
            Codec::new(config.cache_encoding),
            config.ttl_policy(),
        );
        let catalog = Catalog::new(access, upstream, config.catalog_settings());
        let governor = RateGovernor::new(
            store.clone(),
            config.rate_limit_max,
            config.rate_limit_window(),
        );

        Self {
            catalog: Arc::new(catalog),
            governor: Arc::new(governor),
            store,
            clear_scan_count: config.clear_scan_count.max(1),
        }
    }
}

/// Handler for GET /api/pokemon
pub async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>> {
    let page = state.catalog.list(&params.into_query()).await?;
    Ok(Json(page.into_value()))
}

/// Handler for GET /api/pokemon/:identifier
pub async fn detail_handler(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<Value>> {
    let detail = state.catalog.detail(&identifier).await?;
    Ok(Json(detail.into_value()))
}

/// Handler for GET /api/pokemon/batch
///
/// Responds 200 even when some identifiers failed; those carry an error
/// marker in place of a value.
pub async fn batch_handler(
    State(state): State<AppState>,
    Query(params): Query<BatchParams>,
) -> Result<Json<BatchResult>> {
    let identifiers = params
        .identifiers()
        .ok_or_else(|| ApiError::Validation(NAMES_REQUIRED_MESSAGE.to_string()))?;

    let result = state.catalog.batch(&identifiers).await;
    if result.failures() > 0 {
        info!(
            "Batch completed with {} of {} failed identifiers",
            result.failures(),
            result.len()
        );
    }

    Ok(Json(result))
}

/// Handler for DELETE /api/cache
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    Query(params): Query<ClearCacheParams>,
) -> Result<Json<ClearCacheResponse>> {
    let pattern = params.pattern()?;
    let deleted = clear_matching(state.store.as_ref(), pattern, state.clear_scan_count).await?;

    Ok(Json(ClearCacheResponse::new(pattern, deleted)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.catalog.access().stats().snapshot();
    Json(StatsResponse::from(stats))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let reachable = state.store.ping().await.is_ok();
    Json(HealthResponse::healthy(reachable))
}

/// Fallback for unknown routes.
pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound(ROUTE_NOT_FOUND_MESSAGE.to_string())
}
