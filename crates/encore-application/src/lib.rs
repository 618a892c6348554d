// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use encore_catalog::{
    FixtureProvider, ItunesProvider, MusicProvider, MusicSource, RateLimiter, SpotifyProvider,
};
use encore_config::{AppConfig, MusicConfig};

pub mod search;
#[cfg(test)]
mod search_tests;

pub use search::{MusicSearchService, SearchError, SearchResult};

use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub search: Arc<MusicSearchService>,
}

impl AppState {
    pub fn new(config: AppConfig, search: MusicSearchService) -> Self {
        Self {
            config,
            search: Arc::new(search),
        }
    }

    /// Build state with providers selected from the configuration.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let search = search_service_from_config(&config.music)?;
        Ok(Self::new(config, search))
    }

    pub fn on_start(&self) {
        info!(
            target: "application",
            providers = ?self.search.provider_names(),
            "application state initialized"
        );
    }
}

/// Choose providers: a fixture file replaces all external catalogs; otherwise
/// Spotify (when credentials are present) is tried before iTunes.
pub fn search_service_from_config(config: &MusicConfig) -> Result<MusicSearchService> {
    let providers = providers_from_config(config)?;
    Ok(MusicSearchService::new(providers, RateLimiter::new()))
}

fn providers_from_config(config: &MusicConfig) -> Result<Vec<Arc<dyn MusicProvider>>> {
    if let Some(path) = config.fixture_path.as_deref() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture catalog {}", path))?;
        let catalog = serde_json::from_str(&contents)
            .with_context(|| format!("parsing fixture catalog {}", path))?;
        let fixture = FixtureProvider::from_catalog("fixture", MusicSource::Fixture, catalog)?;
        info!(target: "application", path, "serving music search from fixtures");
        return Ok(vec![Arc::new(fixture)]);
    }

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let mut providers: Vec<Arc<dyn MusicProvider>> = Vec::new();

    if let Some((client_id, client_secret)) = config.spotify.credentials() {
        let mut builder = SpotifyProvider::builder(client_id, client_secret).timeout(timeout);
        if let Some(base_url) = &config.spotify.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(auth_url) = &config.spotify.auth_url {
            builder = builder.auth_url(auth_url);
        }
        providers.push(Arc::new(builder.build()?));
    }

    let mut itunes = ItunesProvider::builder()
        .timeout(timeout)
        .country(config.itunes.country.clone());
    if let Some(base_url) = &config.itunes.base_url {
        itunes = itunes.base_url(base_url);
    }
    providers.push(Arc::new(itunes.build()?));

    Ok(providers)
}
