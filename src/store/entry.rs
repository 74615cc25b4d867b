//! Store Entry Module
//!
//! A single value held by the in-memory store, with optional expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Store Entry ==
/// Represents a single stored value and its metadata.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// The stored value
    pub value: String,
    /// Insertion sequence number, stable across overwrites (used as scan cursor)
    pub seq: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates a new entry with an optional TTL.
    pub fn new(value: String, seq: u64, ttl: Option<Duration>) -> Self {
        Self {
            value,
            seq,
            expires_at: ttl.map(expiry_from_now),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Set TTL ==
    /// Replaces the expiry with `ttl` from now.
    pub fn set_ttl(&mut self, ttl: Duration) {
        self.expires_at = Some(expiry_from_now(ttl));
    }

    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
fn expiry_from_now(ttl: Duration) -> u64 {
    current_timestamp_ms().saturating_add(ttl.as_millis() as u64)
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
