//! Cache Keys and TTL Classes
//!
//! Every logical request maps to exactly one key:
//!
//! - `pokemon:list:<name>:page<P>:limit<L>` for list pages
//! - `pokemon:detail:<identifier>` for single entries
//!
//! Names and identifiers are trimmed and lower-cased first. The page and limit
//! suffix is numeric and anchored at the end of the key, so two different
//! `(name, page, limit)` triples can never produce the same string.

use std::fmt;
use std::time::Duration;

// == Public Constants ==
/// Namespace prefix shared by all catalog cache keys.
pub const NAMESPACE: &str = "pokemon";

/// Pattern matching every catalog cache key, used by the admin clear.
pub const DEFAULT_CLEAR_PATTERN: &str = "pokemon:*";

/// Normalizes a user-supplied name or identifier.
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// == Cache Key ==
/// A normalized cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for one page of the (optionally name-filtered) list.
    pub fn list(name_filter: &str, page: u32, limit: u32) -> Self {
        Self(format!(
            "{}:list:{}:page{}:limit{}",
            NAMESPACE,
            normalize_identifier(name_filter),
            page,
            limit
        ))
    }

    /// Key for a single entry, addressed by name or numeric id.
    pub fn detail(identifier: &str) -> Self {
        Self(format!(
            "{}:detail:{}",
            NAMESPACE,
            normalize_identifier(identifier)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == TTL Class ==
/// Freshness class of a cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    /// Unfiltered list pages
    List,
    /// Name-filtered list pages
    SearchResult,
    /// Single entries; these change least often
    Detail,
}

// == TTL Policy ==
/// Maps each [`TtlClass`] to a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub list: Duration,
    pub search_result: Duration,
    pub detail: Duration,
}

impl TtlPolicy {
    pub fn duration(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::List => self.list,
            TtlClass::SearchResult => self.search_result,
            TtlClass::Detail => self.detail,
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            list: Duration::from_secs(3600),
            search_result: Duration::from_secs(1800),
            detail: Duration::from_secs(86400),
        }
    }
}
