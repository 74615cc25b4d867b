//! Codec Module
//!
//! Converts values to the strings kept in the store and back.
//!
//! Entries carry no encoding tag, and entries written under different write
//! strategies live side by side in the same store. Decoding therefore tries a
//! fixed sequence of interpretations until one produces a value:
//!
//! 1. [`DecodeStrategy::CompressedJson`]: base64 → gzip → JSON
//! 2. [`DecodeStrategy::PlainJson`]: JSON as stored
//! 3. [`DecodeStrategy::RawString`]: the stored text itself

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

// == Public Constants ==
/// Number of characters of a stored payload included in diagnostics.
pub const PREVIEW_CHARS: usize = 50;

// == Stored Payload ==
/// Opaque string as kept in the cache store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPayload(String);

impl StoredPayload {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First [`PREVIEW_CHARS`] characters, for logging.
    pub fn preview(&self) -> String {
        self.0.chars().take(PREVIEW_CHARS).collect()
    }
}

// == Encoding ==
/// Write strategy for new entries. Decoding accepts every strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Plain JSON text
    #[default]
    Plain,
    /// Gzip-compressed JSON, base64-encoded
    Compressed,
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "json" => Ok(Self::Plain),
            "compressed" | "gzip" => Ok(Self::Compressed),
            other => Err(format!("unknown cache encoding '{}'", other)),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Compressed => f.write_str("compressed"),
        }
    }
}

// == Decoded ==
/// Result of decoding a stored payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A JSON value recovered from the payload
    Structured(Value),
    /// Payload returned verbatim because no JSON interpretation fit
    Raw(String),
}

impl Decoded {
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    /// Converts into a JSON value; raw payloads become JSON strings.
    pub fn into_value(self) -> Value {
        match self {
            Self::Structured(value) => value,
            Self::Raw(raw) => Value::String(raw),
        }
    }
}

// == Errors ==
/// Failure to produce a storable payload.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Compression error: {0}")]
    Compress(#[from] std::io::Error),
}

/// No decode strategy produced a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cached payload of {length} bytes could not be decoded")]
pub struct NotDecodable {
    pub length: usize,
    pub preview: String,
}

// == Decode Strategy ==
/// One interpretation of a stored payload, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    CompressedJson,
    PlainJson,
    RawString,
}

impl DecodeStrategy {
    /// Order in which strategies are attempted.
    pub const PRIORITY: [DecodeStrategy; 3] = [
        DecodeStrategy::CompressedJson,
        DecodeStrategy::PlainJson,
        DecodeStrategy::RawString,
    ];

    /// Interprets `raw`; `None` means this strategy produced no value.
    pub fn attempt(self, raw: &str) -> Option<Decoded> {
        match self {
            Self::CompressedJson => decompress(raw)
                .filter(|text| !text.is_empty())
                .and_then(|text| parse_structured(&text)),
            Self::PlainJson => parse_structured(raw),
            Self::RawString => (!raw.is_empty()).then(|| Decoded::Raw(raw.to_string())),
        }
    }
}

/// JSON `null` counts as no result.
fn parse_structured(text: &str) -> Option<Decoded> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(|value| !value.is_null())
        .map(Decoded::Structured)
}

fn compress(text: &str) -> Result<String, std::io::Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let bytes = encoder.finish()?;
    Ok(STANDARD.encode(bytes))
}

fn decompress(raw: &str) -> Option<String> {
    let bytes = STANDARD.decode(raw.trim()).ok()?;
    let mut text = String::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_string(&mut text)
        .ok()?;
    Some(text)
}

// == Codec ==
/// Encodes values with the configured [`Encoding`] and decodes any of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    encoding: Encoding,
}

impl Codec {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Serializes `value` for storage.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<StoredPayload, CodecError> {
        let json = serde_json::to_string(value)?;
        let raw = match self.encoding {
            Encoding::Plain => json,
            Encoding::Compressed => compress(&json)?,
        };
        Ok(StoredPayload(raw))
    }

    /// Decodes a stored payload, whichever strategy wrote it.
    pub fn decode(&self, payload: &StoredPayload) -> Result<Decoded, NotDecodable> {
        for strategy in DecodeStrategy::PRIORITY {
            if let Some(decoded) = strategy.attempt(payload.as_str()) {
                return Ok(decoded);
            }
        }

        let failure = NotDecodable {
            length: payload.len(),
            preview: payload.preview(),
        };
        warn!(
            payload_type = "string",
            length = failure.length,
            preview = %failure.preview,
            "Failed to decode cached payload"
        );
        Err(failure)
    }
}
