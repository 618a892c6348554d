pub mod handlers;

use axum::{routing::get, Json, Router};
use encore_application::AppState;
use encore_catalog::{
    ArtistSearchResult, Artwork, CircuitStatus, MusicSearchResult, MusicSource, ProviderHealth,
};
use handlers::music::{
    provider_status, search_artists, search_songs, ErrorResponse, __path_provider_status,
    __path_search_artists, __path_search_songs,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Serialize, utoipa::ToSchema)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
#[allow(dead_code)]
async fn health() -> Json<HealthResponse> {
    health_handler().await
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        search_songs,
        search_artists,
        provider_status,
    ),
    components(
        schemas(
            HealthResponse,
            MusicSearchResult,
            ArtistSearchResult,
            Artwork,
            MusicSource,
            ProviderHealth,
            CircuitStatus,
            ErrorResponse,
        )
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "music", description = "Song and artist search across external catalogs")
    ),
    info(
        title = "Encore API",
        version = "0.1.0",
        description = "Music search backend for the Encore karaoke app",
    )
)]
struct ApiDoc;

fn music_routes() -> Router<AppState> {
    Router::new()
        .route("/music/search", get(search_songs))
        .route("/music/artists/search", get(search_artists))
        .route("/music/status", get(provider_status))
}

pub fn router(state: AppState) -> Router {
    info!(target: "api", "building router");

    let openapi = ApiDoc::openapi();

    // Unprefixed paths are the ones the mobile client calls; `/api/v1` mirrors them.
    Router::new()
        .route("/health", get(health_handler))
        .merge(music_routes())
        .nest("/api/v1", music_routes())
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", openapi))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
