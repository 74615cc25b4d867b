//! Catalog Module
//!
//! Catalog operations served through the cache: paginated and name-filtered
//! lists, single entries, and batches of entries.

mod batch;
mod listing;
mod projection;

use std::convert::identity;
use std::sync::Arc;

use crate::cache::{normalize_identifier, AccessLayer, CacheKey, Decoded, TtlClass};
use crate::upstream::{SpeciesApi, SpeciesPage, UpstreamError};

pub use batch::{
    parse_identifiers, BatchEntry, BatchFetcher, BatchResult, BatchSettings, ErrorMarker,
    DEFAULT_CHUNK_SIZE, DEFAULT_PACING, FETCH_FAILED,
};
pub use listing::{total_pages, ListPage, ListQuery, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use projection::{ArtworkRef, ProjectedArtwork, ProjectedItem, ProjectedSprites, ProjectedType, TypeName};

/// Number of unfiltered candidates fetched to answer a name search.
pub const DEFAULT_SEARCH_POOL: u32 = 500;

// == Catalog Settings ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSettings {
    pub search_pool_size: u32,
    pub batch: BatchSettings,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            search_pool_size: DEFAULT_SEARCH_POOL,
            batch: BatchSettings::default(),
        }
    }
}

// == Catalog ==
/// Cached view of the upstream catalog.
#[derive(Clone)]
pub struct Catalog {
    access: AccessLayer,
    upstream: Arc<dyn SpeciesApi>,
    settings: CatalogSettings,
}

impl Catalog {
    pub fn new(access: AccessLayer, upstream: Arc<dyn SpeciesApi>, settings: CatalogSettings) -> Self {
        Self {
            access,
            upstream,
            settings,
        }
    }

    pub fn access(&self) -> &AccessLayer {
        &self.access
    }

    // == List ==
    /// Returns one list page.
    ///
    /// With a name filter, one large unfiltered page is fetched and filtered
    /// and paginated locally, so counts reflect the matches.
    pub async fn list(&self, query: &ListQuery) -> Result<Decoded, UpstreamError> {
        let key = CacheKey::list(&query.name, query.page, query.limit);

        if query.is_filtered() {
            let pool = self.settings.search_pool_size;
            self.access
                .get_or_fetch(
                    &key,
                    TtlClass::SearchResult,
                    || self.upstream.list(0, pool),
                    |page: SpeciesPage| ListPage::filter_and_paginate(page.results, query),
                )
                .await
        } else {
            self.access
                .get_or_fetch(
                    &key,
                    TtlClass::List,
                    || self.upstream.list(query.offset(), query.limit),
                    |page: SpeciesPage| ListPage::from_upstream(page, query),
                )
                .await
        }
    }

    // == Detail ==
    /// Returns one entry by name or numeric id.
    pub async fn detail(&self, identifier: &str) -> Result<Decoded, UpstreamError> {
        let id = normalize_identifier(identifier);
        let key = CacheKey::detail(&id);

        self.access
            .get_or_fetch(&key, TtlClass::Detail, || self.upstream.detail(&id), identity)
            .await
    }

    // == Batch ==
    /// Resolves several entries; failures are reported per identifier.
    pub async fn batch(&self, identifiers: &[String]) -> BatchResult {
        BatchFetcher::new(&self.access, self.upstream.as_ref(), self.settings.batch)
            .fetch_many(identifiers)
            .await
    }
}
