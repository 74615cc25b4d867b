//! HTTP Catalog Client
//!
//! [`SpeciesApi`] over the PokeAPI-compatible REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{SpeciesApi, SpeciesDetail, SpeciesPage, UpstreamError};

/// reqwest-backed catalog client.
///
/// Timeouts are enforced here, by the HTTP client, and surface as
/// [`UpstreamError::Request`].
#[derive(Debug, Clone)]
pub struct HttpSpeciesApi {
    http: Client,
    base_url: Url,
}

impl HttpSpeciesApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let base_url =
            Url::parse(base_url).map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidUrl(base_url.to_string()));
        }

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    /// Builds `<base>/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        debug!("Fetching upstream {}", url);
        let response = self.http.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SpeciesApi for HttpSpeciesApi {
    async fn list(&self, offset: u32, limit: u32) -> Result<SpeciesPage, UpstreamError> {
        let mut url = self.endpoint(&["pokemon"])?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }

    async fn detail(&self, identifier: &str) -> Result<SpeciesDetail, UpstreamError> {
        let url = self.endpoint(&["pokemon", identifier])?;
        self.get_json(url).await
    }
}
