//! API Module
//!
//! HTTP handlers, middleware and routing for the caching proxy.
//!
//! # Endpoints
//! - `GET /api/pokemon` - Paginated list, optional `name` filter
//! - `GET /api/pokemon/:identifier` - One entry
//! - `GET /api/pokemon/batch?names=` - Several entries
//! - `DELETE /api/cache?pattern=` - Clear cached keys
//! - `GET /stats` - Access layer counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use middleware::client_identity;
pub use routes::create_router;
