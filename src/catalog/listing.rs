//! List Paging Module
//!
//! List page shape and the local filter-then-paginate policy for name searches.

use serde::{Deserialize, Serialize};

use crate::cache::normalize_identifier;
use crate::upstream::{NamedResource, SpeciesPage};

// == Public Constants ==
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;

// == List Query ==
/// A normalized list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number
    pub page: u32,
    /// Page size, never zero
    pub limit: u32,
    /// Lower-cased name filter; empty means unfiltered
    pub name: String,
}

impl ListQuery {
    pub fn new(page: u32, limit: u32, name: &str) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            name: normalize_identifier(name),
        }
    }

    pub fn is_filtered(&self) -> bool {
        !self.name.is_empty()
    }

    /// Offset of the first result of this page.
    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_LIMIT, "")
    }
}

// == List Page ==
/// One page of results as returned to clients and stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    pub results: Vec<NamedResource>,
    pub count: u64,
    pub total_pages: u64,
    pub current_page: u32,
}

impl ListPage {
    /// Wraps an upstream page fetched with this query's offset and limit.
    pub fn from_upstream(page: SpeciesPage, query: &ListQuery) -> Self {
        Self {
            total_pages: total_pages(page.count, query.limit),
            results: page.results,
            count: page.count,
            current_page: query.page,
        }
    }

    /// Filters `candidates` by case-insensitive substring, then paginates the
    /// filtered set, so `count` and `total_pages` describe the matches only.
    pub fn filter_and_paginate(candidates: Vec<NamedResource>, query: &ListQuery) -> Self {
        let matches: Vec<NamedResource> = candidates
            .into_iter()
            .filter(|candidate| candidate.name.to_lowercase().contains(&query.name))
            .collect();

        let count = matches.len() as u64;
        let results = matches
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();

        Self {
            results,
            count,
            total_pages: total_pages(count, query.limit),
            current_page: query.page,
        }
    }
}

/// `max(1, ceil(count / limit))`
pub fn total_pages(count: u64, limit: u32) -> u64 {
    count.div_ceil(u64::from(limit.max(1))).max(1)
}
