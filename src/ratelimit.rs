//! Rate Governor Module
//!
//! Fixed-window request counting per client identity, kept in the shared store
//! so every server instance sees the same counters.
//!
//! The window starts with a client's first request and is never extended by
//! later ones. If the store misbehaves the request is admitted.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::store::{KeyValueStore, StoreError};

// == Public Constants ==
pub const KEY_PREFIX: &str = "ratelimit";
pub const DEFAULT_CEILING: u64 = 50;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Rejected { count: u64, limit: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

// == Rate Governor ==
#[derive(Clone)]
pub struct RateGovernor {
    store: Arc<dyn KeyValueStore>,
    ceiling: u64,
    window: Duration,
}

impl RateGovernor {
    pub fn new(store: Arc<dyn KeyValueStore>, ceiling: u64, window: Duration) -> Self {
        Self {
            store,
            ceiling,
            window,
        }
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Store key holding the counter for `client_id`.
    pub fn counter_key(client_id: &str) -> String {
        format!("{}:{}", KEY_PREFIX, client_id)
    }

    /// Counts this request against `client_id` and decides whether to serve it.
    pub async fn admit(&self, client_id: &str) -> Admission {
        match self.count(client_id).await {
            Ok(count) if count > self.ceiling => {
                debug!(client = %client_id, count, "Rate limit exceeded");
                Admission::Rejected {
                    count,
                    limit: self.ceiling,
                }
            }
            Ok(_) => Admission::Allowed,
            Err(e) => {
                warn!(client = %client_id, error = %e, "Rate limiter store error, allowing request");
                Admission::Allowed
            }
        }
    }

    async fn count(&self, client_id: &str) -> Result<u64, StoreError> {
        let key = Self::counter_key(client_id);

        let count = self.store.increment(&key).await?;
        if count == 1 {
            self.store.expire(&key, self.window).await?;
        } else if count as u64 > self.ceiling && self.store.ttl(&key).await?.is_none() {
            // Restore a window lost when the first request's EXPIRE failed
            warn!(client = %client_id, "Rate counter had no window, restarting it");
            self.store.expire(&key, self.window).await?;
        }

        // Re-read so a window reset is observed. Increments by concurrent
        // requests land after ours and never count against this one.
        let current = match self.store.get(&key).await? {
            Some(raw) => raw.parse::<i64>().map_or(count, |read| read.min(count)),
            None => count,
        };

        Ok(current.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use crate::store::{MemoryStore, ScanPage};
    use crate::test_support::UnreachableStore;

    fn governor(store: Arc<dyn KeyValueStore>, ceiling: u64, window: Duration) -> RateGovernor {
        RateGovernor::new(store, ceiling, window)
    }

    #[tokio::test]
    async fn test_admits_up_to_ceiling_then_rejects() {
        let governor = governor(Arc::new(MemoryStore::new(100)), 3, DEFAULT_WINDOW);

        for _ in 0..3 {
            assert!(governor.admit("10.0.0.1").await.is_allowed());
        }

        assert_eq!(
            governor.admit("10.0.0.1").await,
            Admission::Rejected { count: 4, limit: 3 }
        );
    }

    #[tokio::test]
    async fn test_clients_are_counted_separately() {
        let governor = governor(Arc::new(MemoryStore::new(100)), 1, DEFAULT_WINDOW);

        assert!(governor.admit("a").await.is_allowed());
        assert!(!governor.admit("a").await.is_allowed());
        assert!(governor.admit("b").await.is_allowed());
    }

    #[tokio::test]
    async fn test_first_request_sets_window() {
        let store = Arc::new(MemoryStore::new(100));
        let governor = governor(store.clone(), 5, DEFAULT_WINDOW);

        governor.admit("c").await;
        let first = store.ttl_remaining_ms("ratelimit:c").await.unwrap();
        assert!(first > 59_000 && first <= 60_000);

        tokio::time::sleep(Duration::from_millis(30)).await;
        governor.admit("c").await;
        let second = store.ttl_remaining_ms("ratelimit:c").await.unwrap();
        // Later requests never push the window out
        assert!(second < first);
    }

    #[tokio::test]
    async fn test_new_window_admits_again() {
        let governor = governor(
            Arc::new(MemoryStore::new(100)),
            1,
            Duration::from_millis(100),
        );

        assert!(governor.admit("d").await.is_allowed());
        assert!(!governor.admit("d").await.is_allowed());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(governor.admit("d").await.is_allowed());
    }

    #[tokio::test]
    async fn test_store_failure_fails_open() {
        let governor = governor(Arc::new(UnreachableStore), 0, DEFAULT_WINDOW);

        for _ in 0..5 {
            assert_eq!(governor.admit("e").await, Admission::Allowed);
        }
    }

    #[tokio::test]
    async fn test_concurrent_admits_respect_ceiling() {
        let governor = governor(Arc::new(MemoryStore::new(100)), 5, DEFAULT_WINDOW);

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let governor = governor.clone();
                tokio::spawn(async move { governor.admit("x").await })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap().is_allowed() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
    }

    /// Memory store whose first `expire` call fails.
    struct LosesFirstExpiry {
        inner: MemoryStore,
        failed: AtomicBool,
    }

    #[async_trait]
    impl KeyValueStore for LosesFirstExpiry {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key).await
        }

        async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
            self.inner.set_with_ttl(key, value, ttl).await
        }

        async fn increment(&self, key: &str) -> Result<i64, StoreError> {
            self.inner.increment(key).await
        }

        async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(StoreError::Unavailable("timeout".to_string()));
            }
            self.inner.expire(key, ttl).await
        }

        async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
            self.inner.ttl(key).await
        }

        async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<ScanPage, StoreError> {
            self.inner.scan(cursor, pattern, count).await
        }

        async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError> {
            self.inner.delete_many(keys).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.inner.ping().await
        }
    }

    #[tokio::test]
    async fn test_lost_expiry_is_restored() {
        let store = Arc::new(LosesFirstExpiry {
            inner: MemoryStore::new(100),
            failed: AtomicBool::new(false),
        });
        let governor = governor(store.clone(), 1, Duration::from_millis(100));

        // Expiry fails on the first request, which is still admitted
        assert!(governor.admit("f").await.is_allowed());
        assert!(store.ttl("ratelimit:f").await.unwrap().is_none());

        assert!(!governor.admit("f").await.is_allowed());
        assert!(store.ttl("ratelimit:f").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(governor.admit("f").await.is_allowed());
    }

    #[test]
    fn test_counter_key() {
        assert_eq!(RateGovernor::counter_key("127.0.0.1"), "ratelimit:127.0.0.1");
    }
}
