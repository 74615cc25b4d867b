//! Store Module
//!
//! The minimal contract the codec, access layer and rate governor need from the
//! shared key-value store, plus the Redis and in-memory backends.
//!
//! Every operation is assumed to be a network call that can fail transiently.
//! Callers treat a [`StoreError`] as a cache miss or a no-op, never as fatal.

mod entry;
mod lru;
mod memory;
mod redis_store;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub use entry::StoreEntry;
pub use lru::LruTracker;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

// == Public Constants ==
/// Cursor value that starts a scan and signals that a scan has finished.
pub const SCAN_START: u64 = 0;

// == Store Error ==
/// Errors raised by a store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Redis command or connection failure
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// INCR on a key whose value is not an integer
    #[error("Value at key '{0}' is not an integer")]
    NotAnInteger(String),

    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// == Scan Page ==
/// One page of a cursor-based key scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Cursor for the next call; [`SCAN_START`] once the scan is complete
    pub next_cursor: u64,
    /// Keys in this page that matched the pattern
    pub keys: Vec<String>,
}

// == Key-Value Store ==
/// Operations required from the shared cache store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw string stored at `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` at `key`, expiring after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Atomically increments the integer at `key` and returns the new value.
    ///
    /// A missing key counts as zero and is created without expiry.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Sets the expiry of an existing key. Missing keys are ignored.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Returns the remaining time to live of `key`.
    ///
    /// None when the key is missing or has no expiry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// Returns one page of keys matching a glob `pattern`, starting at `cursor`.
    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<ScanPage, StoreError>;

    /// Deletes `keys` and returns how many existed.
    async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

// == Clear Matching ==
/// Deletes every key matching `pattern`, paging through the store with `SCAN`.
///
/// Loops until the cursor returns to [`SCAN_START`], so matches spread over
/// several pages are all removed. Returns the number of deleted keys.
pub async fn clear_matching(
    store: &dyn KeyValueStore,
    pattern: &str,
    page_size: usize,
) -> Result<u64, StoreError> {
    let mut cursor = SCAN_START;
    let mut deleted = 0;

    loop {
        let page = store.scan(cursor, pattern, page_size).await?;

        if !page.keys.is_empty() {
            info!(
                "Deleting {} keys matching pattern: {}",
                page.keys.len(),
                pattern
            );
            deleted += store.delete_many(&page.keys).await?;
        }

        cursor = page.next_cursor;
        if cursor == SCAN_START {
            break;
        }
    }

    info!("Cache cleanup complete: {} keys removed", deleted);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::UnreachableStore;

    #[tokio::test]
    async fn test_clear_matching_spans_multiple_pages() {
        let store = MemoryStore::new(1000);
        for i in 0..25 {
            store
                .set_with_ttl(&format!("pokemon:detail:{}", i), "{}", Duration::from_secs(60))
                .await
                .unwrap();
        }
        store
            .set_with_ttl("ratelimit:127.0.0.1", "3", Duration::from_secs(60))
            .await
            .unwrap();

        let deleted = clear_matching(&store, "pokemon:*", 4).await.unwrap();

        assert_eq!(deleted, 25);
        assert_eq!(store.len().await, 1);
        assert!(store.get("ratelimit:127.0.0.1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_matching_no_matches() {
        let store = MemoryStore::new(10);
        store
            .set_with_ttl("other:key", "v", Duration::from_secs(60))
            .await
            .unwrap();

        let deleted = clear_matching(&store, "pokemon:*", 1000).await.unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear_matching_reports_store_failure() {
        let result = clear_matching(&UnreachableStore, "pokemon:*", 1000).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
