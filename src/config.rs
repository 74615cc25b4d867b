//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::cache::{Encoding, TtlPolicy};
use crate::catalog::{BatchSettings, CatalogSettings};

/// Which [`KeyValueStore`](crate::store::KeyValueStore) backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                reason: format!("unknown backend '{}'", other),
            }),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.to_string(),
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    /// Base URL of the upstream catalog API
    pub upstream_base_url: String,
    pub upstream_timeout_secs: u64,
    /// Requests allowed per client per window
    pub rate_limit_max: u64,
    pub rate_limit_window_secs: u64,
    pub ttl_list_secs: u64,
    pub ttl_search_secs: u64,
    pub ttl_detail_secs: u64,
    /// Write strategy for new cache entries
    pub cache_encoding: Encoding,
    pub batch_chunk_size: usize,
    pub batch_pacing_ms: u64,
    /// Candidates fetched to answer a name-filtered list
    pub search_pool_size: u32,
    /// COUNT hint for each SCAN of an administrative clear
    pub clear_scan_count: usize,
    /// Capacity of the in-memory store
    pub memory_max_entries: usize,
    /// In-memory store cleanup interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 5000)
    /// - `STORE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `REDIS_URL` - Redis connection URL (default: redis://localhost:6379)
    /// - `POKEAPI_BASE_URL` - Upstream base URL (default: https://pokeapi.co/api/v2)
    /// - `UPSTREAM_TIMEOUT_SECS` - Upstream request timeout (default: 10)
    /// - `RATE_LIMIT_MAX` - Requests per client per window (default: 50)
    /// - `RATE_LIMIT_WINDOW_SECS` - Rate limit window (default: 60)
    /// - `CACHE_TTL_LIST_SECS` / `CACHE_TTL_SEARCH_SECS` / `CACHE_TTL_DETAIL_SECS`
    ///   (defaults: 3600 / 1800 / 86400)
    /// - `CACHE_ENCODING` - `plain` or `compressed` (default: plain)
    /// - `BATCH_CHUNK_SIZE` - Identifiers per batch chunk (default: 5)
    /// - `BATCH_PACING_MS` - Pause after each batch item (default: 50)
    /// - `SEARCH_POOL_SIZE` - Candidates for name search (default: 500)
    /// - `CLEAR_SCAN_COUNT` - SCAN COUNT hint (default: 1000)
    /// - `MEMORY_MAX_ENTRIES` - In-memory store capacity (default: 10000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            server_port: parse_or(var("PORT"), defaults.server_port),
            store_backend: parse_or(var("STORE_BACKEND"), defaults.store_backend),
            redis_url: var("REDIS_URL").unwrap_or(defaults.redis_url),
            upstream_base_url: var("POKEAPI_BASE_URL").unwrap_or(defaults.upstream_base_url),
            upstream_timeout_secs: parse_or(
                var("UPSTREAM_TIMEOUT_SECS"),
                defaults.upstream_timeout_secs,
            ),
            rate_limit_max: parse_or(var("RATE_LIMIT_MAX"), defaults.rate_limit_max),
            rate_limit_window_secs: parse_or(
                var("RATE_LIMIT_WINDOW_SECS"),
                defaults.rate_limit_window_secs,
            ),
            ttl_list_secs: parse_or(var("CACHE_TTL_LIST_SECS"), defaults.ttl_list_secs),
            ttl_search_secs: parse_or(var("CACHE_TTL_SEARCH_SECS"), defaults.ttl_search_secs),
            ttl_detail_secs: parse_or(var("CACHE_TTL_DETAIL_SECS"), defaults.ttl_detail_secs),
            cache_encoding: parse_or(var("CACHE_ENCODING"), defaults.cache_encoding),
            batch_chunk_size: parse_or(var("BATCH_CHUNK_SIZE"), defaults.batch_chunk_size),
            batch_pacing_ms: parse_or(var("BATCH_PACING_MS"), defaults.batch_pacing_ms),
            search_pool_size: parse_or(var("SEARCH_POOL_SIZE"), defaults.search_pool_size),
            clear_scan_count: parse_or(var("CLEAR_SCAN_COUNT"), defaults.clear_scan_count),
            memory_max_entries: parse_or(var("MEMORY_MAX_ENTRIES"), defaults.memory_max_entries),
            cleanup_interval: parse_or(var("CLEANUP_INTERVAL"), defaults.cleanup_interval),
        }
    }

    // == Validate ==
    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit_max == 0 {
            return Err(invalid("RATE_LIMIT_MAX", "must be at least 1"));
        }
        if self.rate_limit_window_secs == 0 {
            return Err(invalid("RATE_LIMIT_WINDOW_SECS", "must be at least 1"));
        }
        if self.batch_chunk_size == 0 {
            return Err(invalid("BATCH_CHUNK_SIZE", "must be at least 1"));
        }
        if self.search_pool_size == 0 {
            return Err(invalid("SEARCH_POOL_SIZE", "must be at least 1"));
        }
        if self.clear_scan_count == 0 {
            return Err(invalid("CLEAR_SCAN_COUNT", "must be at least 1"));
        }
        if self.memory_max_entries == 0 {
            return Err(invalid("MEMORY_MAX_ENTRIES", "must be at least 1"));
        }
        if self.cleanup_interval == 0 {
            return Err(invalid("CLEANUP_INTERVAL", "must be at least 1"));
        }
        if [self.ttl_list_secs, self.ttl_search_secs, self.ttl_detail_secs].contains(&0) {
            return Err(invalid("CACHE_TTL_*", "TTLs must be at least 1 second"));
        }
        if self.upstream_base_url.trim().is_empty() {
            return Err(invalid("POKEAPI_BASE_URL", "must not be empty"));
        }
        if self.store_backend == StoreBackend::Redis && self.redis_url.trim().is_empty() {
            return Err(invalid("REDIS_URL", "must not be empty"));
        }
        Ok(())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            list: Duration::from_secs(self.ttl_list_secs),
            search_result: Duration::from_secs(self.ttl_search_secs),
            detail: Duration::from_secs(self.ttl_detail_secs),
        }
    }

    pub fn catalog_settings(&self) -> CatalogSettings {
        CatalogSettings {
            search_pool_size: self.search_pool_size,
            batch: BatchSettings::new(
                self.batch_chunk_size,
                Duration::from_millis(self.batch_pacing_ms),
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 5000,
            store_backend: StoreBackend::Redis,
            redis_url: "redis://localhost:6379".to_string(),
            upstream_base_url: "https://pokeapi.co/api/v2".to_string(),
            upstream_timeout_secs: 10,
            rate_limit_max: 50,
            rate_limit_window_secs: 60,
            ttl_list_secs: 3600,
            ttl_search_secs: 1800,
            ttl_detail_secs: 86400,
            cache_encoding: Encoding::Plain,
            batch_chunk_size: 5,
            batch_pacing_ms: 50,
            search_pool_size: 500,
            clear_scan_count: 1000,
            memory_max_entries: 10000,
            cleanup_interval: 1,
        }
    }
}
