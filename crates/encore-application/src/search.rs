// SPDX-License-Identifier: GPL-3.0-or-later

//! Music search orchestration.
//!
//! A search expands the query into variants and tries each (variant, provider)
//! pair in order until one yields a non-empty result set. Individual failures
//! are logged and skipped; the search only fails when every attempt failed.

use std::sync::Arc;

use encore_catalog::{
    generate_variants, ArtistSearchResult, CatalogError, MusicProvider, MusicSearchResult,
    ProviderHealth, RateLimiter, ResultKind,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("music search unavailable: all {attempts} provider attempts failed")]
    ServiceUnavailable { attempts: usize },
}

pub type SearchResult<T> = Result<T, SearchError>;

/// Searches external catalogs through a shared [`RateLimiter`].
#[derive(Clone)]
pub struct MusicSearchService {
    providers: Vec<Arc<dyn MusicProvider>>,
    limiter: RateLimiter,
}

impl MusicSearchService {
    /// Providers are tried in the given order for every query variant.
    pub fn new(providers: Vec<Arc<dyn MusicProvider>>, limiter: RateLimiter) -> Self {
        Self { providers, limiter }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|provider| provider.name().to_string())
            .collect()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    #[instrument(skip(self), fields(kind = "song"))]
    pub async fn search_songs(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> SearchResult<Vec<MusicSearchResult>> {
        self.search(query, ResultKind::Song, limit, offset, |provider, raw| {
            provider.map_tracks(raw)
        })
        .await
    }

    #[instrument(skip(self), fields(kind = "artist"))]
    pub async fn search_artists(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> SearchResult<Vec<ArtistSearchResult>> {
        self.search(query, ResultKind::Artist, limit, offset, |provider, raw| {
            provider.map_artists(raw)
        })
        .await
    }

    /// Limiter state for every configured provider.
    pub fn provider_status(&self) -> Vec<ProviderHealth> {
        self.providers
            .iter()
            .map(|provider| {
                self.limiter
                    .snapshot(provider.name())
                    .unwrap_or_else(|| ProviderHealth::idle(provider.name()))
            })
            .collect()
    }

    async fn search<T, F>(
        &self,
        query: &str,
        kind: ResultKind,
        limit: usize,
        offset: usize,
        map: F,
    ) -> SearchResult<Vec<T>>
    where
        F: Fn(&dyn MusicProvider, &Value) -> Vec<T>,
    {
        if query.trim().is_empty() || limit == 0 {
            debug!(target: "search", "blank query or zero limit, skipping providers");
            return Ok(Vec::new());
        }

        let variants = generate_variants(query);
        let fetch_limit = offset.saturating_add(limit);
        let mut attempts = 0;
        let mut failures = 0;

        for variant in &variants {
            for provider in &self.providers {
                attempts += 1;
                match self.attempt(provider.as_ref(), variant, kind, fetch_limit).await {
                    Ok(raw) => {
                        let results = map(provider.as_ref(), &raw);
                        if results.is_empty() {
                            debug!(
                                target: "search",
                                provider = provider.name(),
                                variant = %variant,
                                "no results"
                            );
                            continue;
                        }

                        info!(
                            target: "search",
                            provider = provider.name(),
                            variant = %variant,
                            count = results.len(),
                            "search matched"
                        );
                        return Ok(results.into_iter().skip(offset).take(limit).collect());
                    }
                    Err(error) => {
                        failures += 1;
                        warn!(
                            target: "search",
                            provider = provider.name(),
                            variant = %variant,
                            %error,
                            "search attempt failed"
                        );
                    }
                }
            }
        }

        if failures == attempts {
            return Err(SearchError::ServiceUnavailable { attempts });
        }

        debug!(target: "search", attempts, "all variants exhausted without results");
        Ok(Vec::new())
    }

    /// One rate-limited provider call. Outcomes of calls that reached the
    /// provider are reported back to the circuit breaker.
    async fn attempt(
        &self,
        provider: &dyn MusicProvider,
        variant: &str,
        kind: ResultKind,
        limit: usize,
    ) -> Result<Value, CatalogError> {
        self.limiter
            .wait_for_rate_limit(provider.name(), provider.limits())
            .await?;

        match provider.fetch(variant, kind, limit).await {
            Ok(raw) => {
                self.limiter.record_success(provider.name());
                Ok(raw)
            }
            Err(error) => {
                self.limiter.record_failure(provider.name());
                Err(error)
            }
        }
    }
}
