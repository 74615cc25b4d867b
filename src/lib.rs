//! Dex Cache - A read-through caching proxy for a paginated species catalog
//!
//! Serves list, detail and batch lookups from a shared key-value store,
//! fetching from the upstream API on a miss, with per-client rate limiting.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod ratelimit;
pub mod store;
pub mod tasks;
pub mod upstream;

#[cfg(test)]
mod test_support;

pub use api::{create_router, AppState};
pub use config::{Config, StoreBackend};
pub use store::{KeyValueStore, MemoryStore, RedisStore};
pub use tasks::spawn_cleanup_task;
pub use upstream::{HttpSpeciesApi, SpeciesApi};
