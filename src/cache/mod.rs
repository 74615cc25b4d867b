//! Cache Module
//!
//! Cache-aside access to the shared store: key normalization, TTL policy,
//! payload codec and the read-through access layer.

mod access;
mod codec;
mod key;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use access::AccessLayer;
pub use codec::{
    Codec, CodecError, DecodeStrategy, Decoded, Encoding, NotDecodable, StoredPayload,
    PREVIEW_CHARS,
};
pub use key::{normalize_identifier, CacheKey, TtlClass, TtlPolicy, DEFAULT_CLEAR_PATTERN, NAMESPACE};
pub use stats::{AccessStats, StatsSnapshot};
