//! Request DTOs for the proxy API
//!
//! Query strings accepted by the catalog and admin endpoints.

use serde::Deserialize;

use crate::cache::{DEFAULT_CLEAR_PATTERN, NAMESPACE};
use crate::catalog::{parse_identifiers, ListQuery, DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::error::ApiError;

pub const NAMES_REQUIRED_MESSAGE: &str = "Names parameter required as comma-separated string";
pub const PATTERN_OUTSIDE_CACHE_MESSAGE: &str = "Pattern must target cached catalog keys";

/// Query for GET /api/pokemon
///
/// Fields are kept as raw strings so non-numeric values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ListParams {
    pub fn into_query(self) -> ListQuery {
        ListQuery::new(
            positive_or(self.page.as_deref(), DEFAULT_PAGE),
            positive_or(self.limit.as_deref(), DEFAULT_LIMIT),
            self.name.as_deref().unwrap_or_default(),
        )
    }
}

fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// Query for GET /api/pokemon/batch
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchParams {
    #[serde(default)]
    pub names: Option<String>,
}

impl BatchParams {
    /// Returns the requested identifiers, or None when there are none.
    pub fn identifiers(&self) -> Option<Vec<String>> {
        let identifiers = parse_identifiers(self.names.as_deref()?);
        (!identifiers.is_empty()).then_some(identifiers)
    }
}

/// Query for DELETE /api/cache
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearCacheParams {
    #[serde(default)]
    pub pattern: Option<String>,
}

impl ClearCacheParams {
    /// Returns the glob to clear. Only keys under the catalog namespace may be
    /// targeted, so rate counters survive an administrative clear.
    pub fn pattern(&self) -> Result<&str, ApiError> {
        let pattern = match self.pattern.as_deref().map(str::trim) {
            Some(pattern) if !pattern.is_empty() => pattern,
            _ => return Ok(DEFAULT_CLEAR_PATTERN),
        };

        match pattern.strip_prefix(NAMESPACE) {
            Some(rest) if rest.starts_with(':') => Ok(pattern),
            _ => Err(ApiError::Validation(PATTERN_OUTSIDE_CACHE_MESSAGE.to_string())),
        }
    }
}
