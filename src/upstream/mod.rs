//! Upstream Module
//!
//! The species catalog consumed by the proxy: a paginated list endpoint and an
//! item-by-id endpoint.

mod client;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::HttpSpeciesApi;
pub use types::{
    AbilitySlot, NamedResource, OfficialArtwork, OtherSprites, SpeciesDetail, SpeciesPage,
    Sprites, StatEntry, TypeSlot,
};

// == Upstream Error ==
/// Failure to obtain data from the upstream catalog.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Transport failure, including client-side timeouts
    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    /// Response body did not have the expected shape
    #[error("Unexpected upstream payload: {0}")]
    Malformed(String),
}

impl UpstreamError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

// == Species API ==
/// Read-only access to the upstream catalog.
#[async_trait]
pub trait SpeciesApi: Send + Sync {
    /// Fetches one page of the unfiltered list.
    async fn list(&self, offset: u32, limit: u32) -> Result<SpeciesPage, UpstreamError>;

    /// Fetches one entry by lower-cased name or numeric id.
    async fn detail(&self, identifier: &str) -> Result<SpeciesDetail, UpstreamError>;
}
