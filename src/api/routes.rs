//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    batch_handler, clear_cache_handler, detail_handler, health_handler, list_handler,
    not_found_handler, stats_handler, AppState,
};
use super::middleware::rate_limit;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/pokemon` - Paginated, optionally name-filtered list
/// - `GET /api/pokemon/batch` - Several entries by comma-separated names
/// - `GET /api/pokemon/:identifier` - One entry by name or id
/// - `DELETE /api/cache` - Clear cache keys matching a pattern
/// - `GET /stats` - Access layer counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Rate limiting on the catalog routes only
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let catalog = Router::new()
        .route("/api/pokemon", get(list_handler))
        .route("/api/pokemon/batch", get(batch_handler))
        .route("/api/pokemon/:identifier", get(detail_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .merge(catalog)
        .route("/api/cache", delete(clear_cache_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
