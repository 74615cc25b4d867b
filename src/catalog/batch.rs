//! Batch Fetcher Module
//!
//! Resolves many identifiers through the access layer, one at a time, in
//! fixed-size chunks with a pause after every item. A failing identifier only
//! affects its own entry in the result.

use std::collections::HashSet;
use std::time::Duration;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{normalize_identifier, AccessLayer, CacheKey, TtlClass};
use crate::catalog::ProjectedItem;
use crate::upstream::{SpeciesApi, UpstreamError};

// == Public Constants ==
pub const DEFAULT_CHUNK_SIZE: usize = 5;
pub const DEFAULT_PACING: Duration = Duration::from_millis(50);

/// Message stored in every [`ErrorMarker`].
pub const FETCH_FAILED: &str = "Failed to fetch Pokemon";

// == Batch Settings ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// Identifiers per chunk, at least 1
    pub chunk_size: usize,
    /// Pause after each identifier, cache hit or not
    pub pacing: Duration,
}

impl BatchSettings {
    pub fn new(chunk_size: usize, pacing: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            pacing,
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_PACING)
    }
}

// == Batch Result ==
/// Per-identifier failure recorded in place of a value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ErrorMarker {
    pub error: String,
    pub reason: String,
}

impl ErrorMarker {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            error: FETCH_FAILED.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Found(Value),
    Failed(ErrorMarker),
}

impl BatchEntry {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Identifier → entry mapping in request order. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    entries: Vec<(String, BatchEntry)>,
}

impl BatchResult {
    pub fn get(&self, identifier: &str) -> Option<&BatchEntry> {
        self.entries
            .iter()
            .find(|(id, _)| id == identifier)
            .map(|(_, entry)| entry)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|(_, e)| e.is_failed()).count()
    }
}

impl Serialize for BatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, entry) in &self.entries {
            map.serialize_entry(id, entry)?;
        }
        map.end()
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones
/// and repeats of an identifier already listed (compared case-insensitively).
pub fn parse_identifiers(names: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(normalize_identifier(name)))
        .map(str::to_string)
        .collect()
}

// == Batch Fetcher ==
pub struct BatchFetcher<'a> {
    access: &'a AccessLayer,
    upstream: &'a dyn SpeciesApi,
    settings: BatchSettings,
}

impl<'a> BatchFetcher<'a> {
    pub fn new(access: &'a AccessLayer, upstream: &'a dyn SpeciesApi, settings: BatchSettings) -> Self {
        Self {
            access,
            upstream,
            settings,
        }
    }

    /// Resolves `identifiers` chunk by chunk, strictly in order.
    pub async fn fetch_many(&self, identifiers: &[String]) -> BatchResult {
        let mut result = BatchResult {
            entries: Vec::with_capacity(identifiers.len()),
        };

        for (index, chunk) in identifiers.chunks(self.settings.chunk_size).enumerate() {
            debug!(
                "Processing batch chunk {} with {} identifiers",
                index + 1,
                chunk.len()
            );

            for identifier in chunk {
                let entry = match self.fetch_one(identifier).await {
                    Ok(value) => BatchEntry::Found(value),
                    Err(e) => {
                        warn!(identifier = %identifier, error = %e, "Error fetching batch entry");
                        BatchEntry::Failed(ErrorMarker::new(e.to_string()))
                    }
                };
                result.entries.push((identifier.clone(), entry));

                if !self.settings.pacing.is_zero() {
                    tokio::time::sleep(self.settings.pacing).await;
                }
            }
        }

        result
    }

    async fn fetch_one(&self, identifier: &str) -> Result<Value, UpstreamError> {
        let id = normalize_identifier(identifier);
        let key = CacheKey::detail(&id);

        self.access
            .get_or_fetch(
                &key,
                TtlClass::Detail,
                || self.upstream.detail(&id),
                ProjectedItem::from_detail,
            )
            .await
            .map(|decoded| decoded.into_value())
    }
}
