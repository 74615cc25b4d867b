//! LRU Tracker Module
//!
//! Least-recently-used ordering for the in-memory store's capacity eviction.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Every touch assigns a fresh, strictly increasing stamp. The smallest stamp
/// in `order` is the least recently used key.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Stamp of the latest access per key
    stamps: HashMap<String, u64>,
    /// Keys ordered by access stamp
    order: BTreeMap<u64, String>,
    /// Next stamp to hand out
    clock: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        self.clock += 1;
        if let Some(previous) = self.stamps.insert(key.to_string(), self.clock) {
            self.order.remove(&previous);
        }
        self.order.insert(self.clock, key.to_string());
    }

    // == Remove ==
    /// Stops tracking a key.
    pub fn remove(&mut self, key: &str) {
        if let Some(stamp) = self.stamps.remove(key) {
            self.order.remove(&stamp);
        }
    }

    // == Evict Oldest ==
    /// Returns and forgets the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.evict_oldest_where(|_| true)
    }

    /// Returns and forgets the least recently used key accepted by `evictable`.
    pub fn evict_oldest_where(&mut self, evictable: impl Fn(&str) -> bool) -> Option<String> {
        let stamp = self
            .order
            .iter()
            .find(|(_, key)| evictable(key))
            .map(|(stamp, _)| *stamp)?;
        let key = self.order.remove(&stamp)?;
        self.stamps.remove(&key);
        Some(key)
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}
