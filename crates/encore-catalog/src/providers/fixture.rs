// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::MusicProvider;
use crate::error::{CatalogError, Result};
use crate::mapper::{map_itunes_artists, map_itunes_tracks};
use crate::models::{ArtistSearchResult, MusicSearchResult, MusicSource, ResultKind};
use crate::rate_limiter::ProviderLimits;

/// One scripted outcome of [`FixtureProvider::fetch`].
#[derive(Debug, Clone)]
pub enum FixtureResponse {
    /// iTunes-shaped search payload.
    Json(Value),
    Timeout,
    Status(u16),
}

/// Offline provider serving canned iTunes-shaped payloads.
///
/// Scripted responses are consumed first, in order. After that a query is
/// answered from the catalog (exact match, then case-insensitive, then the
/// `"*"` entry), falling back to an empty result set.
#[derive(Debug)]
pub struct FixtureProvider {
    name: String,
    source: MusicSource,
    limits: ProviderLimits,
    scripted: Mutex<VecDeque<FixtureResponse>>,
    catalog: HashMap<String, Value>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl FixtureProvider {
    pub fn new(name: impl Into<String>, source: MusicSource) -> Self {
        Self {
            name: name.into(),
            source,
            limits: ProviderLimits::new(std::time::Duration::ZERO, u32::MAX),
            scripted: Mutex::new(VecDeque::new()),
            catalog: HashMap::new(),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Build a provider from a JSON object mapping query text to payloads.
    pub fn from_catalog(name: impl Into<String>, source: MusicSource, catalog: Value) -> Result<Self> {
        let Value::Object(entries) = catalog else {
            return Err(CatalogError::InvalidResponse(
                "fixture catalog must be a JSON object keyed by query".to_string(),
            ));
        };

        let mut provider = Self::new(name, source);
        provider.catalog = entries.into_iter().collect();
        Ok(provider)
    }

    pub fn with_limits(mut self, limits: ProviderLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_entry(mut self, query: impl Into<String>, payload: Value) -> Self {
        self.catalog.insert(query.into(), payload);
        self
    }

    pub fn push_response(&self, response: FixtureResponse) {
        self.scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Number of `fetch` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queries passed to `fetch`, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lookup(&self, query: &str) -> Value {
        let lowered = query.to_lowercase();
        self.catalog
            .get(query)
            .or_else(|| {
                self.catalog
                    .iter()
                    .find(|(key, _)| key.to_lowercase() == lowered)
                    .map(|(_, value)| value)
            })
            .or_else(|| self.catalog.get("*"))
            .cloned()
            .unwrap_or_else(|| json!({ "resultCount": 0, "results": [] }))
    }
}

#[async_trait]
impl MusicProvider for FixtureProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> MusicSource {
        self.source
    }

    fn limits(&self) -> ProviderLimits {
        self.limits
    }

    async fn fetch(&self, query: &str, kind: ResultKind, limit: usize) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());
        debug!(target: "catalog", provider = %self.name, query, kind = kind.as_str(), limit, "fixture fetch");

        let scripted = self
            .scripted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match scripted {
            Some(FixtureResponse::Json(value)) => Ok(value),
            Some(FixtureResponse::Timeout) => Err(CatalogError::Timeout {
                provider: self.name.clone(),
            }),
            Some(FixtureResponse::Status(status)) => Err(CatalogError::ApiError {
                status,
                message: "scripted fixture failure".to_string(),
            }),
            None => Ok(self.lookup(query)),
        }
    }

    fn map_tracks(&self, raw: &Value) -> Vec<MusicSearchResult> {
        map_itunes_tracks(raw, self.source)
    }

    fn map_artists(&self, raw: &Value) -> Vec<ArtistSearchResult> {
        map_itunes_artists(raw, self.source)
    }
}
