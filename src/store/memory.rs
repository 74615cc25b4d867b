//! In-Memory Store Module
//!
//! Process-local [`KeyValueStore`] with TTL expiration and LRU eviction.
//! Used when no Redis instance is configured, and as the store in tests.
//!
//! Rate counters are never evicted for capacity. They only leave the store
//! when their window expires, so the store may briefly hold more than its
//! capacity when it is full of counters.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyValueStore, LruTracker, ScanPage, StoreEntry, StoreError, SCAN_START};
use crate::ratelimit::KEY_PREFIX as COUNTER_PREFIX;

/// Capacity eviction only removes keys outside the rate counter namespace.
fn is_evictable(key: &str) -> bool {
    key.strip_prefix(COUNTER_PREFIX)
        .map_or(true, |rest| !rest.starts_with(':'))
}

// == Memory Store ==
/// In-process key-value store.
///
/// Each operation runs under a single write lock, so `increment` is atomic
/// with respect to concurrent requests in this process.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Debug)]
struct MemoryInner {
    /// Key-value storage
    entries: HashMap<String, StoreEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Next insertion sequence number, starts above [`SCAN_START`]
    next_seq: u64,
}

impl MemoryInner {
    /// Returns the live entry for `key`, dropping it first if it has expired.
    fn live(&mut self, key: &str) -> Option<&mut StoreEntry> {
        if self.entries.get(key).is_some_and(StoreEntry::is_expired) {
            self.remove(key);
            return None;
        }
        self.entries.get_mut(key)
    }

    fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    /// Writes `value` with the given TTL, keeping the sequence number of an
    /// existing key so an overwrite never moves it relative to a running scan.
    fn upsert(&mut self, key: &str, value: String, ttl: Option<Duration>) {
        let seq = match self.live(key) {
            Some(entry) => entry.seq,
            None => {
                if self.entries.len() >= self.max_entries {
                    if let Some(evicted) = self.lru.evict_oldest_where(is_evictable) {
                        self.entries.remove(&evicted);
                    }
                }
                self.next_seq += 1;
                self.next_seq
            }
        };

        self.entries
            .insert(key.to_string(), StoreEntry::new(value, seq, ttl));
        self.lru.touch(key);
    }
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                max_entries: max_entries.max(1),
                next_seq: SCAN_START,
            }),
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }

    /// Returns the number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// Returns the remaining TTL of `key` in milliseconds.
    pub async fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        let mut inner = self.inner.write().await;
        inner.live(key).and_then(|entry| entry.ttl_remaining_ms())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        // Write lock: reads refresh LRU order
        let mut inner = self.inner.write().await;
        let value = inner.live(key).map(|entry| entry.value.clone());
        if value.is_some() {
            inner.lru.touch(key);
        }
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.upsert(key, value.to_string(), Some(ttl));
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;

        let (next, ttl) = match inner.live(key) {
            Some(entry) => {
                let current: i64 = entry
                    .value
                    .parse()
                    .map_err(|_| StoreError::NotAnInteger(key.to_string()))?;
                let ttl = entry.ttl_remaining_ms().map(Duration::from_millis);
                (current + 1, ttl)
            }
            None => (1, None),
        };

        inner.upsert(key, next.to_string(), ttl);
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.live(key) {
            entry.set_ttl(ttl);
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        Ok(self.ttl_remaining_ms(key).await.map(Duration::from_millis))
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<ScanPage, StoreError> {
        let inner = self.inner.read().await;

        let mut candidates: Vec<(u64, &String)> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.seq >= cursor && !entry.is_expired())
            .map(|(key, entry)| (entry.seq, key))
            .collect();
        candidates.sort_unstable_by_key(|(seq, _)| *seq);

        let count = count.max(1);
        let next_cursor = match candidates.get(count) {
            Some((seq, _)) => *seq,
            None => SCAN_START,
        };

        let keys = candidates
            .into_iter()
            .take(count)
            .filter(|(_, key)| glob_match(pattern, key))
            .map(|(_, key)| key.clone())
            .collect();

        Ok(ScanPage { next_cursor, keys })
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let mut deleted = 0;
        for key in keys {
            if inner.live(key).is_some() {
                inner.remove(key);
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// == Glob Matching ==
/// Matches `key` against a Redis-style glob supporting `*` and `?`.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut p, mut k) = (0, 0);
    // Position of the last `*` seen and the key index it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, k));
                p += 1;
            }
            Some(&c) if c == '?' || c == key[k] => {
                p += 1;
                k += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    k = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
