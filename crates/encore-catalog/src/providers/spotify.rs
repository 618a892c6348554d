// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};
use url::Url;

use super::{http_client, read_json, MusicProvider, DEFAULT_TIMEOUT};
use crate::error::{CatalogError, Result};
use crate::mapper::{map_spotify_artists, map_spotify_tracks};
use crate::models::{ArtistSearchResult, MusicSearchResult, MusicSource, ResultKind};
use crate::rate_limiter::ProviderLimits;

const SPOTIFY_API_BASE: &str = "https://api.spotify.com";
const SPOTIFY_AUTH_BASE: &str = "https://accounts.spotify.com";
const MAX_LIMIT: usize = 50;
/// Tokens are refreshed this long before Spotify says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Spotify Web API client using the client-credentials flow.
#[derive(Debug, Clone)]
pub struct SpotifyProvider {
    client: Client,
    client_id: String,
    client_secret: String,
    base_url: String,
    auth_url: String,
    token: Arc<Mutex<Option<AccessToken>>>,
}

impl SpotifyProvider {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        Self::builder(client_id, client_secret).build()
    }

    pub fn builder(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> SpotifyProviderBuilder {
        SpotifyProviderBuilder {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: SPOTIFY_API_BASE.to_string(),
            auth_url: SPOTIFY_AUTH_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Return a cached bearer token, requesting a new one when missing or
    /// about to expire.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!(target: "spotify", "requesting client-credentials token");
        let credentials = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .client
            .post(format!("{}/api/token", self.auth_url))
            .header(AUTHORIZATION, format!("Basic {}", credentials))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(|e| CatalogError::from_transport(self.name(), e))?;

        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED
        ) {
            return Err(CatalogError::AuthenticationFailed(self.name().to_string()));
        }

        let body = read_json(self.name(), response).await?;
        let token: TokenResponse = serde_json::from_value(body)
            .map_err(|e| CatalogError::InvalidResponse(format!("Invalid token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    fn search_url(&self, query: &str, kind: ResultKind, limit: usize) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/v1/search", self.base_url))
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        let kind = match kind {
            ResultKind::Song => "track",
            ResultKind::Artist => "artist",
        };

        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("type", kind)
            .append_pair("limit", &limit.clamp(1, MAX_LIMIT).to_string());

        Ok(url)
    }
}

#[async_trait]
impl MusicProvider for SpotifyProvider {
    fn name(&self) -> &str {
        "spotify"
    }

    fn source(&self) -> MusicSource {
        MusicSource::Spotify
    }

    fn limits(&self) -> ProviderLimits {
        ProviderLimits::SPOTIFY
    }

    async fn fetch(&self, query: &str, kind: ResultKind, limit: usize) -> Result<Value> {
        let token = self.access_token().await?;
        let url = self.search_url(query, kind, limit)?;
        trace!(target: "spotify", "GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CatalogError::from_transport(self.name(), e))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Revoked or expired early; the next call fetches a fresh token.
            self.token.lock().await.take();
        }

        read_json(self.name(), response).await
    }

    fn map_tracks(&self, raw: &Value) -> Vec<MusicSearchResult> {
        map_spotify_tracks(raw)
    }

    fn map_artists(&self, raw: &Value) -> Vec<ArtistSearchResult> {
        map_spotify_artists(raw)
    }
}

/// Builder for configuring a Spotify provider.
#[derive(Debug)]
pub struct SpotifyProviderBuilder {
    client_id: String,
    client_secret: String,
    base_url: String,
    auth_url: String,
    timeout: Duration,
}

impl SpotifyProviderBuilder {
    /// Set a custom Web API base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom accounts service base URL.
    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<SpotifyProvider> {
        Ok(SpotifyProvider {
            client: http_client(self.timeout)?,
            client_id: self.client_id,
            client_secret: self.client_secret,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            auth_url: self.auth_url.trim_end_matches('/').to_string(),
            token: Arc::new(Mutex::new(None)),
        })
    }
}
