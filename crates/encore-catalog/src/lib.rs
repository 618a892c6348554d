// SPDX-License-Identifier: GPL-3.0-or-later

//! Music catalog search building blocks.
//!
//! This crate provides query normalization, provider clients for the iTunes
//! Search API and the Spotify Web API (plus an offline fixture provider), the
//! mapping of their JSON into a single result shape, and a per-provider rate
//! limiter with a circuit breaker.

pub mod error;
pub mod mapper;
pub mod models;
pub mod normalizer;
pub mod providers;
pub mod rate_limiter;

pub use error::{CatalogError, Result};
pub use models::{ArtistSearchResult, Artwork, MusicSearchResult, MusicSource, ResultKind};
pub use normalizer::{generate_variants, normalize};
pub use providers::{
    FixtureProvider, FixtureResponse, ItunesProvider, MusicProvider, SpotifyProvider,
};
pub use rate_limiter::{CircuitStatus, ProviderHealth, ProviderLimits, RateLimiter};
