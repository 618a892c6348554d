// SPDX-License-Identifier: GPL-3.0-or-later

//! Conversion from provider JSON into [`MusicSearchResult`] / [`ArtistSearchResult`].
//!
//! Mapping is total: missing optional fields become `None`, `""` or `0`, and
//! entries that cannot be read (or lack a title/name) are skipped.

use serde::Deserialize;
use serde_json::Value;

use crate::models::{ArtistSearchResult, Artwork, MusicSearchResult, MusicSource};

/// Target pixel sizes for the small/medium/large tiers.
type Tiers = [u32; 3];

const ITUNES_TIERS: Tiers = [60, 100, 600];
const SPOTIFY_TIERS: Tiers = [64, 300, 640];
/// Assumed width for Spotify images that report no dimensions.
const SPOTIFY_UNSIZED_WIDTH: u32 = 300;

/// First four characters of a release date when they form a year, else `""`.
pub fn year_from_release_date(release_date: Option<&str>) -> String {
    release_date
        .and_then(|date| date.get(..4))
        .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Whole seconds, truncating; `0` when unknown.
pub fn millis_to_seconds(millis: Option<u64>) -> u32 {
    millis
        .map(|ms| u32::try_from(ms / 1000).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Pick, for each tier, the candidate whose size is closest to the tier
/// target (larger wins ties).
fn artwork_from_sizes(candidates: &[(u32, String)], tiers: Tiers) -> Artwork {
    let pick = |target: u32| {
        candidates
            .iter()
            .min_by_key(|(size, _)| (size.abs_diff(target), std::cmp::Reverse(*size)))
            .map(|(_, url)| url.clone())
    };

    Artwork {
        small: pick(tiers[0]),
        medium: pick(tiers[1]),
        large: pick(tiers[2]),
    }
}

fn entries(raw: &Value, collection: &[&str]) -> Vec<Value> {
    collection
        .iter()
        .try_fold(raw, |value, key| value.get(key))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesTrack {
    wrapper_type: Option<String>,
    track_id: Option<u64>,
    track_name: Option<String>,
    artist_name: Option<String>,
    collection_name: Option<String>,
    release_date: Option<String>,
    track_time_millis: Option<u64>,
    preview_url: Option<String>,
    artwork_url30: Option<String>,
    artwork_url60: Option<String>,
    artwork_url100: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesArtist {
    wrapper_type: Option<String>,
    artist_id: Option<u64>,
    artist_name: Option<String>,
    primary_genre_name: Option<String>,
}

fn itunes_artwork(track: &ItunesTrack) -> Artwork {
    let mut candidates = Vec::new();
    for (size, url) in [
        (30, &track.artwork_url30),
        (60, &track.artwork_url60),
        (100, &track.artwork_url100),
    ] {
        if let Some(url) = non_blank(url.clone()) {
            candidates.push((size, url));
        }
    }

    // The artwork CDN serves any size when the dimensions in the path change.
    if let Some(url) = &track.artwork_url100 {
        if url.contains("100x100") {
            candidates.push((600, url.replace("100x100", "600x600")));
        }
    }

    artwork_from_sizes(&candidates, ITUNES_TIERS)
}

/// Map an iTunes Search API `entity=song` response.
pub fn map_itunes_tracks(raw: &Value, source: MusicSource) -> Vec<MusicSearchResult> {
    entries(raw, &["results"])
        .iter()
        .filter_map(|entry| ItunesTrack::deserialize(entry).ok())
        .filter(|track| track.wrapper_type.as_deref().map_or(true, |w| w == "track"))
        .filter_map(|track| {
            let title = non_blank(track.track_name.clone())?;
            let artist = non_blank(track.artist_name.clone())?;
            Some(MusicSearchResult {
                id: track.track_id.map(|id| id.to_string()).unwrap_or_default(),
                title,
                artist,
                album: non_blank(track.collection_name.clone()),
                year: year_from_release_date(track.release_date.as_deref()),
                duration: millis_to_seconds(track.track_time_millis),
                preview_url: non_blank(track.preview_url.clone()),
                artwork: itunes_artwork(&track),
                source,
            })
        })
        .collect()
}

/// Map an iTunes Search API `entity=musicArtist` response.
pub fn map_itunes_artists(raw: &Value, source: MusicSource) -> Vec<ArtistSearchResult> {
    entries(raw, &["results"])
        .iter()
        .filter_map(|entry| ItunesArtist::deserialize(entry).ok())
        .filter(|artist| artist.wrapper_type.as_deref().map_or(true, |w| w == "artist"))
        .filter_map(|artist| {
            Some(ArtistSearchResult {
                id: artist.artist_id.map(|id| id.to_string()).unwrap_or_default(),
                name: non_blank(artist.artist_name)?,
                genre: non_blank(artist.primary_genre_name),
                // iTunes does not expose artist images through search.
                artwork: Artwork::default(),
                source,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: Option<String>,
    width: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SpotifyNamed {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    name: Option<String>,
    release_date: Option<String>,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    artists: Vec<SpotifyNamed>,
    album: Option<SpotifyAlbum>,
    duration_ms: Option<u64>,
    preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

fn spotify_artwork(images: &[SpotifyImage]) -> Artwork {
    let candidates: Vec<(u32, String)> = images
        .iter()
        .filter_map(|image| {
            let url = non_blank(image.url.clone())?;
            Some((image.width.unwrap_or(SPOTIFY_UNSIZED_WIDTH), url))
        })
        .collect();
    artwork_from_sizes(&candidates, SPOTIFY_TIERS)
}

/// Map a Spotify Web API `type=track` search response.
pub fn map_spotify_tracks(raw: &Value) -> Vec<MusicSearchResult> {
    entries(raw, &["tracks", "items"])
        .iter()
        .filter_map(|entry| SpotifyTrack::deserialize(entry).ok())
        .filter_map(|track| {
            let title = non_blank(track.name)?;
            let artist = track
                .artists
                .into_iter()
                .filter_map(|a| non_blank(a.name))
                .collect::<Vec<_>>()
                .join(", ");
            if artist.is_empty() {
                return None;
            }
            let album = track.album;
            Some(MusicSearchResult {
                id: track.id.unwrap_or_default(),
                title,
                artist,
                album: album.as_ref().and_then(|a| non_blank(a.name.clone())),
                year: year_from_release_date(
                    album.as_ref().and_then(|a| a.release_date.as_deref()),
                ),
                duration: millis_to_seconds(track.duration_ms),
                preview_url: non_blank(track.preview_url),
                artwork: album
                    .as_ref()
                    .map(|a| spotify_artwork(&a.images))
                    .unwrap_or_default(),
                source: MusicSource::Spotify,
            })
        })
        .collect()
}

/// Map a Spotify Web API `type=artist` search response.
pub fn map_spotify_artists(raw: &Value) -> Vec<ArtistSearchResult> {
    entries(raw, &["artists", "items"])
        .iter()
        .filter_map(|entry| SpotifyArtist::deserialize(entry).ok())
        .filter_map(|artist| {
            Some(ArtistSearchResult {
                id: artist.id.unwrap_or_default(),
                name: non_blank(artist.name)?,
                genre: artist.genres.into_iter().find(|g| !g.trim().is_empty()),
                artwork: spotify_artwork(&artist.images),
                source: MusicSource::Spotify,
            })
        })
        .collect()
}
