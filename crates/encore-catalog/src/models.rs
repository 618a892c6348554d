// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Catalog that produced a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MusicSource {
    Itunes,
    Spotify,
    Fixture,
}

/// Entity kind requested from a provider's search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Song,
    Artist,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Song => "song",
            Self::Artist => "artist",
        }
    }
}

/// Small/medium/large artwork URLs. A tier is `None` only when the provider
/// offered no artwork at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Artwork {
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

impl Artwork {
    pub fn is_empty(&self) -> bool {
        self.small.is_none() && self.medium.is_none() && self.large.is_none()
    }
}

/// A track as returned to the mobile client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MusicSearchResult {
    /// Provider-scoped track identifier.
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Four-digit release year, or an empty string when unknown.
    pub year: String,
    /// Track length in whole seconds, `0` when unknown.
    pub duration: u32,
    pub preview_url: Option<String>,
    pub artwork: Artwork,
    pub source: MusicSource,
}

/// An artist as returned to the mobile client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSearchResult {
    pub id: String,
    pub name: String,
    /// Primary genre, when the provider reports one.
    pub genre: Option<String>,
    pub artwork: Artwork,
    pub source: MusicSource,
}
