//! Access Layer Module
//!
//! Cache-aside orchestration: serve from the store when a decodable entry
//! exists, otherwise fetch from upstream, project, store and return.
//!
//! Store failures never reach the caller. A failed read is a miss and a failed
//! write only costs the next request a refetch. Upstream failures are returned
//! as [`UpstreamError`] so the caller can scope them.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{AccessStats, CacheKey, Codec, Decoded, StoredPayload, TtlClass, TtlPolicy};
use crate::store::KeyValueStore;
use crate::upstream::UpstreamError;

// == Access Layer ==
/// Read-through cache in front of upstream fetches.
#[derive(Clone)]
pub struct AccessLayer {
    store: Arc<dyn KeyValueStore>,
    codec: Codec,
    ttl: TtlPolicy,
    stats: Arc<AccessStats>,
}

impl AccessLayer {
    pub fn new(store: Arc<dyn KeyValueStore>, codec: Codec, ttl: TtlPolicy) -> Self {
        Self {
            store,
            codec,
            ttl,
            stats: Arc::new(AccessStats::new()),
        }
    }

    pub fn stats(&self) -> &Arc<AccessStats> {
        &self.stats
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    // == Lookup ==
    /// Reads and decodes `key`. Store errors and undecodable entries are misses.
    pub async fn lookup(&self, key: &CacheKey) -> Option<Decoded> {
        let raw = match self.store.get(key.as_str()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                self.stats.record_store_error();
                warn!(key = %key, error = %e, "Cache retrieval error, treating as miss");
                return None;
            }
        };

        match self.codec.decode(&StoredPayload::new(raw)) {
            Ok(decoded) => {
                if decoded.is_raw() {
                    warn!(key = %key, "Serving undecodable cache entry as raw string");
                }
                Some(decoded)
            }
            Err(e) => {
                self.stats.record_decode_failure();
                warn!(key = %key, error = %e, "Discarding cache entry");
                None
            }
        }
    }

    // == Put ==
    /// Encodes and writes `value` with the TTL of `class`. Best effort.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &CacheKey, class: TtlClass, value: &T) {
        let payload = match self.codec.encode(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache encoding error, skipping write");
                return;
            }
        };

        let ttl = self.ttl.duration(class);
        if let Err(e) = self
            .store
            .set_with_ttl(key.as_str(), payload.as_str(), ttl)
            .await
        {
            self.stats.record_store_error();
            warn!(key = %key, error = %e, "Cache storage error");
        }
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, or fetches, projects and caches it.
    ///
    /// A successful decode, raw passthrough included, is returned without
    /// calling `fetch`.
    pub async fn get_or_fetch<U, T, F, Fut, P>(
        &self,
        key: &CacheKey,
        class: TtlClass,
        fetch: F,
        project: P,
    ) -> Result<Decoded, UpstreamError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<U, UpstreamError>>,
        P: FnOnce(U) -> T,
        T: Serialize,
    {
        if let Some(cached) = self.lookup(key).await {
            self.stats.record_hit();
            debug!(key = %key, "Cache hit");
            return Ok(cached);
        }

        self.stats.record_miss();
        self.stats.record_upstream_fetch();
        debug!(key = %key, "Cache miss, fetching upstream");

        let fetched = fetch().await.inspect_err(|_| self.stats.record_upstream_failure())?;
        let projected = project(fetched);

        let value = serde_json::to_value(&projected)
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        self.put(key, class, &projected).await;

        Ok(Decoded::Structured(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Encoding;
    use crate::store::MemoryStore;
    use crate::test_support::UnreachableStore;
    use serde_json::{json, Value};
    use std::convert::identity;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn layer(store: Arc<dyn KeyValueStore>) -> AccessLayer {
        AccessLayer::new(store, Codec::default(), TtlPolicy::default())
    }

    async fn fetch_value(calls: &AtomicUsize, value: Value) -> Result<Value, UpstreamError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let store = Arc::new(MemoryStore::new(100));
        let access = layer(store.clone());
        let key = CacheKey::detail("pikachu");
        let calls = AtomicUsize::new(0);

        let value = access
            .get_or_fetch(&key, TtlClass::Detail, || fetch_value(&calls, json!({"id": 25})), identity)
            .await
            .unwrap();

        assert_eq!(value, Decoded::Structured(json!({"id": 25})));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.get(key.as_str()).await.unwrap(),
            Some("{\"id\":25}".to_string())
        );
    }

    #[tokio::test]
    async fn test_hit_never_calls_fetch() {
        let store = Arc::new(MemoryStore::new(100));
        let access = layer(store);
        let key = CacheKey::detail("pikachu");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            access
                .get_or_fetch(&key, TtlClass::Detail, || fetch_value(&calls, json!({"id": 25})), identity)
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = access.stats().snapshot();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_raw_passthrough_is_a_hit() {
        let store = Arc::new(MemoryStore::new(100));
        store
            .set_with_ttl("pokemon:detail:ditto", "not json at all", Duration::from_secs(60))
            .await
            .unwrap();
        let access = layer(store);
        let calls = AtomicUsize::new(0);

        let value = access
            .get_or_fetch(
                &CacheKey::detail("ditto"),
                TtlClass::Detail,
                || fetch_value(&calls, json!({"id": 132})),
                identity,
            )
            .await
            .unwrap();

        assert_eq!(value, Decoded::Raw("not json at all".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_undecodable_entry_triggers_fetch() {
        let store = Arc::new(MemoryStore::new(100));
        store
            .set_with_ttl("pokemon:detail:mew", "", Duration::from_secs(60))
            .await
            .unwrap();
        let access = layer(store.clone());
        let calls = AtomicUsize::new(0);

        let value = access
            .get_or_fetch(
                &CacheKey::detail("mew"),
                TtlClass::Detail,
                || fetch_value(&calls, json!({"id": 151})),
                identity,
            )
            .await
            .unwrap();

        assert_eq!(value, Decoded::Structured(json!({"id": 151})));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(access.stats().snapshot().decode_failures, 1);
    }

    #[tokio::test]
    async fn test_projection_applied_before_store() {
        let store = Arc::new(MemoryStore::new(100));
        let access = layer(store.clone());
        let key = CacheKey::detail("eevee");
        let calls = AtomicUsize::new(0);

        let value = access
            .get_or_fetch(
                &key,
                TtlClass::Detail,
                || fetch_value(&calls, json!({"id": 133, "moves": ["tackle"]})),
                |v: Value| json!({"id": v["id"]}),
            )
            .await
            .unwrap();

        assert_eq!(value.into_value(), json!({"id": 133}));
        assert_eq!(
            store.get(key.as_str()).await.unwrap(),
            Some("{\"id\":133}".to_string())
        );
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_fresh_value() {
        let access = layer(Arc::new(UnreachableStore));
        let calls = AtomicUsize::new(0);

        let value = access
            .get_or_fetch(
                &CacheKey::detail("snorlax"),
                TtlClass::Detail,
                || fetch_value(&calls, json!({"id": 143})),
                identity,
            )
            .await
            .unwrap();

        assert_eq!(value, Decoded::Structured(json!({"id": 143})));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // One failed read, one failed write
        assert_eq!(access.stats().snapshot().store_errors, 2);
    }

    #[tokio::test]
    async fn test_upstream_error_propagates_and_is_not_cached() {
        let store = Arc::new(MemoryStore::new(100));
        let access = layer(store.clone());
        let key = CacheKey::detail("missingno");

        let result = access
            .get_or_fetch(
                &key,
                TtlClass::Detail,
                || async {
                    Err::<Value, _>(UpstreamError::Status {
                        status: 404,
                        url: "https://upstream/pokemon/missingno".into(),
                    })
                },
                identity,
            )
            .await;

        assert!(matches!(result, Err(ref e) if e.is_not_found()));
        assert_eq!(store.get(key.as_str()).await.unwrap(), None);
        assert_eq!(access.stats().snapshot().upstream_failures, 1);
    }

    #[tokio::test]
    async fn test_ttl_class_applied() {
        let store = Arc::new(MemoryStore::new(100));
        let access = layer(store.clone());
        let calls = AtomicUsize::new(0);

        access
            .get_or_fetch(
                &CacheKey::list("pi", 1, 20),
                TtlClass::SearchResult,
                || fetch_value(&calls, json!({"count": 0})),
                identity,
            )
            .await
            .unwrap();

        let remaining = store
            .ttl_remaining_ms("pokemon:list:pi:page1:limit20")
            .await
            .unwrap();
        assert!(remaining <= 1_800_000 && remaining > 1_790_000);
    }

    #[tokio::test]
    async fn test_compressed_writes_are_read_back() {
        let store = Arc::new(MemoryStore::new(100));
        let access = AccessLayer::new(
            store.clone(),
            Codec::new(Encoding::Compressed),
            TtlPolicy::default(),
        );
        let key = CacheKey::detail("onix");
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = access
                .get_or_fetch(&key, TtlClass::Detail, || fetch_value(&calls, json!({"id": 95})), identity)
                .await
                .unwrap();
            assert_eq!(value, Decoded::Structured(json!({"id": 95})));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let raw = store.get(key.as_str()).await.unwrap().unwrap();
        assert!(raw.starts_with("H4sI"));
    }
}
