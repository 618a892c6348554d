// SPDX-License-Identifier: GPL-3.0-or-later

//! External music catalogs searched by the orchestrator.

pub mod fixture;
pub mod itunes;
pub mod spotify;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{CatalogError, Result};
use crate::models::{ArtistSearchResult, MusicSearchResult, MusicSource, ResultKind};
use crate::rate_limiter::ProviderLimits;

pub use fixture::{FixtureProvider, FixtureResponse};
pub use itunes::ItunesProvider;
pub use spotify::SpotifyProvider;

/// Outbound request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("Encore/", env!("CARGO_PKG_VERSION"));

/// A third-party catalog that can be searched by free text.
///
/// `fetch` performs exactly one outbound call and returns the provider's raw
/// JSON; the `map_*` methods turn that JSON into result models.
#[async_trait]
pub trait MusicProvider: Send + Sync {
    /// Key used for rate limiting and logging.
    fn name(&self) -> &str;

    fn source(&self) -> MusicSource;

    fn limits(&self) -> ProviderLimits;

    async fn fetch(&self, query: &str, kind: ResultKind, limit: usize) -> Result<Value>;

    fn map_tracks(&self, raw: &Value) -> Vec<MusicSearchResult>;

    fn map_artists(&self, raw: &Value) -> Vec<ArtistSearchResult>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Turn a provider response into JSON, mapping non-2xx statuses and
/// unparsable bodies to errors.
pub(crate) async fn read_json(provider: &str, response: Response) -> Result<Value> {
    let status = response.status();
    debug!(target: "catalog", provider, "response status: {}", status);

    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(CatalogError::ApiError {
            status: status.as_u16(),
            message,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| CatalogError::from_transport(provider, e))?;
    trace!(target: "catalog", provider, "response body: {}", body);

    serde_json::from_str(&body).map_err(|e| {
        CatalogError::InvalidResponse(format!("Failed to parse {} response: {}", provider, e))
    })
}
