use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use encore_application::{AppState, SearchError};
use encore_catalog::{ArtistSearchResult, MusicSearchResult, ProviderHealth};
use encore_config::MusicConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::{IntoParams, ToSchema};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Free-text query; blank queries return an empty list.
    #[serde(default)]
    pub q: String,
    /// Page size, clamped to the configured maximum.
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl SearchParams {
    fn page_size(&self, config: &MusicConfig) -> usize {
        let max = config.max_limit.max(1);
        self.limit.unwrap_or(config.default_limit).clamp(1, max)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

fn unavailable(error: SearchError) -> Response {
    warn!(target: "api", %error, "music search unavailable");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "search temporarily unavailable".to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// Search songs across the configured music catalogs
#[utoipa::path(
    get,
    path = "/api/v1/music/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching songs, possibly empty", body = Vec<MusicSearchResult>),
        (status = 503, description = "Every catalog attempt failed", body = ErrorResponse)
    ),
    tag = "music"
)]
pub async fn search_songs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let limit = params.page_size(&state.config.music);
    debug!(target: "api", q = %params.q, limit, offset = params.offset, "song search");

    match state.search.search_songs(&params.q, limit, params.offset).await {
        Ok(results) => Json(results).into_response(),
        Err(error) => unavailable(error),
    }
}

/// Search artists across the configured music catalogs
#[utoipa::path(
    get,
    path = "/api/v1/music/artists/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching artists, possibly empty", body = Vec<ArtistSearchResult>),
        (status = 503, description = "Every catalog attempt failed", body = ErrorResponse)
    ),
    tag = "music"
)]
pub async fn search_artists(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let limit = params.page_size(&state.config.music);
    debug!(target: "api", q = %params.q, limit, offset = params.offset, "artist search");

    match state.search.search_artists(&params.q, limit, params.offset).await {
        Ok(results) => Json(results).into_response(),
        Err(error) => unavailable(error),
    }
}

/// Rate limiter and circuit breaker state per provider
#[utoipa::path(
    get,
    path = "/api/v1/music/status",
    responses(
        (status = 200, description = "Provider health", body = Vec<ProviderHealth>)
    ),
    tag = "music"
)]
pub async fn provider_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.search.provider_status())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use encore_application::MusicSearchService;
    use encore_catalog::{FixtureProvider, FixtureResponse, MusicProvider, MusicSource, RateLimiter};
    use encore_config::AppConfig;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::router;

    fn state_with(fixture: Arc<FixtureProvider>) -> AppState {
        let providers: Vec<Arc<dyn MusicProvider>> = vec![fixture];
        AppState::new(
            AppConfig::default(),
            MusicSearchService::new(providers, RateLimiter::new()),
        )
    }

    fn tracks(count: usize) -> Value {
        let results: Vec<Value> = (1..=count)
            .map(|n| json!({ "trackName": format!("Track {n}"), "artistName": "Band" }))
            .collect();
        json!({ "results": results })
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn song_search_returns_camel_case_results() {
        let fixture = Arc::new(FixtureProvider::new("itunes", MusicSource::Itunes).with_entry(
            "hey jude",
            json!({ "results": [{
                "trackName": "Hey Jude",
                "artistName": "The Beatles",
                "releaseDate": "1968-08-26",
                "previewUrl": "https://example.com/preview.m4a"
            }]}),
        ));

        let (status, body) = get(state_with(fixture), "/api/v1/music/search?q=hey%20jude").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["title"], "Hey Jude");
        assert_eq!(body[0]["year"], "1968");
        assert_eq!(body[0]["previewUrl"], "https://example.com/preview.m4a");
        assert_eq!(body[0]["source"], "itunes");
    }

    #[tokio::test]
    async fn missing_query_returns_empty_list() {
        let fixture = Arc::new(FixtureProvider::new("itunes", MusicSource::Itunes));
        let (status, body) = get(state_with(fixture.clone()), "/api/v1/music/search").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
        assert_eq!(fixture.calls(), 0);
    }

    #[tokio::test]
    async fn limit_is_clamped_and_offset_applied() {
        let fixture = Arc::new(
            FixtureProvider::new("itunes", MusicSource::Itunes).with_entry("*", tracks(60)),
        );
        let state = state_with(fixture);

        let (_, body) = get(state.clone(), "/api/v1/music/search?q=band&limit=500").await;
        assert_eq!(body.as_array().unwrap().len(), 50);

        let (_, body) = get(state.clone(), "/api/v1/music/search?q=band").await;
        assert_eq!(body.as_array().unwrap().len(), 20);

        let (_, body) = get(state, "/api/v1/music/search?q=band&limit=2&offset=3").await;
        assert_eq!(body[0]["title"], "Track 4");
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn exhausted_providers_return_503() {
        let fixture = Arc::new(FixtureProvider::new("itunes", MusicSource::Itunes));
        fixture.push_response(FixtureResponse::Timeout);

        let (status, body) = get(state_with(fixture), "/api/v1/music/artists/search?q=abba").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "search temporarily unavailable");
    }

    #[tokio::test]
    async fn artist_search_returns_artists() {
        let fixture = Arc::new(FixtureProvider::new("itunes", MusicSource::Itunes).with_entry(
            "abba",
            json!({ "results": [{ "wrapperType": "artist", "artistId": 372976, "artistName": "ABBA" }] }),
        ));

        let (status, body) = get(state_with(fixture), "/api/v1/music/artists/search?q=abba").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "ABBA");
        assert_eq!(body[0]["id"], "372976");
    }

    #[tokio::test]
    async fn status_reports_each_provider() {
        let fixture = Arc::new(FixtureProvider::new("itunes", MusicSource::Itunes));
        let (status, body) = get(state_with(fixture), "/api/v1/music/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["provider"], "itunes");
        assert_eq!(body[0]["circuit"], "closed");
    }

    #[tokio::test]
    async fn unprefixed_music_paths_are_served() {
        let fixture = Arc::new(
            FixtureProvider::new("itunes", MusicSource::Itunes).with_entry("*", tracks(3)),
        );
        let state = state_with(fixture);

        let (status, body) = get(state.clone(), "/music/search?q=band&limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, _) = get(state.clone(), "/music/artists/search?q=band").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get(state, "/music/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["provider"], "itunes");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let fixture = Arc::new(FixtureProvider::new("itunes", MusicSource::Itunes));
        let (status, body) = get(state_with(fixture), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
