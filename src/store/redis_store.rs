//! Redis Store Module
//!
//! [`KeyValueStore`] backed by a shared Redis instance, so rate counters and
//! cache entries are shared by every server process pointing at it.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError, RedisResult};
use tokio::sync::RwLock;
use tracing::warn;

use super::{KeyValueStore, ScanPage, StoreError};

// == Redis Store ==
/// Redis-backed store with a lazily established multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    client: Arc<Client>,
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
}

impl Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self.connection.try_read() {
            Ok(conn) if conn.is_some() => "connected",
            Ok(_) => "no_connection",
            Err(_) => "lock_error",
        };

        f.debug_struct("RedisStore")
            .field("connection", &status)
            .finish()
    }
}

impl RedisStore {
    /// Creates a store for `redis_url`. No connection is opened until first use.
    pub fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;

        Ok(Self {
            client: Arc::new(client),
            connection: Arc::new(RwLock::new(None)),
        })
    }

    /// Get or create the shared connection.
    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        if let Some(conn) = self.connection.read().await.as_ref() {
            return Ok(conn.clone());
        }

        let mut slot = self.connection.write().await;
        if slot.is_none() {
            *slot = Some(self.client.get_multiplexed_async_connection().await?);
        }

        slot.as_ref()
            .cloned()
            .ok_or_else(|| StoreError::Unavailable("no Redis connection available".into()))
    }

    /// Converts a command result, dropping the shared connection when the
    /// error shows it is dead so the next call reconnects.
    async fn settle<T>(&self, result: RedisResult<T>) -> Result<T, StoreError> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                if needs_reconnect(&e) {
                    warn!("Redis connection lost, reconnecting on next use: {}", e);
                    self.connection.write().await.take();
                }
                Err(e.into())
            }
        }
    }
}

/// True when `error` means the multiplexed connection can no longer be used.
fn needs_reconnect(error: &RedisError) -> bool {
    error.is_connection_dropped() || error.is_io_error() || error.is_unrecoverable_error()
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let result = conn.get(key).await;
        let value: Option<String> = self.settle(result).await?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        let result = conn.set_ex(key, value, seconds).await;
        let _: () = self.settle(result).await?;
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.connection().await?;
        let result = conn.incr(key, 1).await;
        let count: i64 = self.settle(result).await?;
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let result = conn.expire(key, ttl.as_secs() as i64).await;
        let _: bool = self.settle(result).await?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut conn = self.connection().await?;
        let result = conn.pttl(key).await;
        // -1 means no expiry, -2 means no key
        let millis: i64 = self.settle(result).await?;
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<ScanPage, StoreError> {
        let mut conn = self.connection().await?;
        let result = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await;
        let (next_cursor, keys): (u64, Vec<String>) = self.settle(result).await?;

        Ok(ScanPage { next_cursor, keys })
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection().await?;
        let result = conn.del(keys.to_vec()).await;
        let deleted: u64 = self.settle(result).await?;
        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let result = redis::cmd("PING").query_async(&mut conn).await;
        let _: String = self.settle(result).await?;
        Ok(())
    }
}
