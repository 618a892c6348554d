// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::trace;
use url::Url;

use super::{http_client, read_json, MusicProvider, DEFAULT_TIMEOUT};
use crate::error::{CatalogError, Result};
use crate::mapper::{map_itunes_artists, map_itunes_tracks};
use crate::models::{ArtistSearchResult, MusicSearchResult, MusicSource, ResultKind};
use crate::rate_limiter::ProviderLimits;

const ITUNES_API_BASE: &str = "https://itunes.apple.com";
/// The Search API rejects larger page sizes.
const MAX_LIMIT: usize = 200;

/// iTunes Search API client.
#[derive(Debug, Clone)]
pub struct ItunesProvider {
    client: Client,
    base_url: String,
    country: Option<String>,
}

impl ItunesProvider {
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ItunesProviderBuilder {
        ItunesProviderBuilder::default()
    }

    fn search_url(&self, query: &str, kind: ResultKind, limit: usize) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/search", self.base_url))
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        let entity = match kind {
            ResultKind::Song => "song",
            ResultKind::Artist => "musicArtist",
        };

        url.query_pairs_mut()
            .append_pair("term", query)
            .append_pair("media", "music")
            .append_pair("entity", entity)
            .append_pair("limit", &limit.clamp(1, MAX_LIMIT).to_string());

        if let Some(country) = &self.country {
            url.query_pairs_mut().append_pair("country", country);
        }

        Ok(url)
    }
}

#[async_trait]
impl MusicProvider for ItunesProvider {
    fn name(&self) -> &str {
        "itunes"
    }

    fn source(&self) -> MusicSource {
        MusicSource::Itunes
    }

    fn limits(&self) -> ProviderLimits {
        ProviderLimits::ITUNES
    }

    async fn fetch(&self, query: &str, kind: ResultKind, limit: usize) -> Result<Value> {
        let url = self.search_url(query, kind, limit)?;
        trace!(target: "itunes", "GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::from_transport(self.name(), e))?;

        read_json(self.name(), response).await
    }

    fn map_tracks(&self, raw: &Value) -> Vec<MusicSearchResult> {
        map_itunes_tracks(raw, MusicSource::Itunes)
    }

    fn map_artists(&self, raw: &Value) -> Vec<ArtistSearchResult> {
        map_itunes_artists(raw, MusicSource::Itunes)
    }
}

/// Builder for configuring an iTunes provider.
#[derive(Debug)]
pub struct ItunesProviderBuilder {
    base_url: String,
    country: Option<String>,
    timeout: Duration,
}

impl Default for ItunesProviderBuilder {
    fn default() -> Self {
        Self {
            base_url: ITUNES_API_BASE.to_string(),
            country: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ItunesProviderBuilder {
    /// Set a custom base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Restrict results to one storefront (ISO 3166-1 alpha-2).
    pub fn country(mut self, country: Option<String>) -> Self {
        self.country = country.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ItunesProvider> {
        Ok(ItunesProvider {
            client: http_client(self.timeout)?,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            country: self.country,
        })
    }
}
