// SPDX-License-Identifier: GPL-3.0-or-later

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use encore_catalog::{
        CircuitStatus, FixtureProvider, FixtureResponse, MusicProvider, MusicSource, RateLimiter,
    };
    use serde_json::{json, Value};

    use crate::search::{MusicSearchService, SearchError};

    fn hey_jude() -> Value {
        json!({
            "resultCount": 1,
            "results": [{
                "wrapperType": "track",
                "trackId": 1441164430,
                "trackName": "Hey Jude",
                "artistName": "The Beatles",
                "collectionName": "Hey Jude",
                "releaseDate": "1968-08-26",
                "trackTimeMillis": 431333
            }]
        })
    }

    fn numbered_tracks(count: usize) -> Value {
        let results: Vec<Value> = (1..=count)
            .map(|n| json!({ "trackName": format!("Track {n}"), "artistName": "Band" }))
            .collect();
        json!({ "results": results })
    }

    fn service_with(providers: Vec<Arc<FixtureProvider>>) -> MusicSearchService {
        let providers = providers
            .into_iter()
            .map(|provider| provider as Arc<dyn MusicProvider>)
            .collect();
        MusicSearchService::new(providers, RateLimiter::new())
    }

    #[tokio::test]
    async fn blank_query_makes_no_provider_calls() {
        let fixture = Arc::new(FixtureProvider::new("itunes", MusicSource::Itunes));
        let service = service_with(vec![fixture.clone()]);

        for query in ["", "   ", "\t\n"] {
            assert!(service.search_songs(query, 20, 0).await.unwrap().is_empty());
            assert!(service.search_artists(query, 20, 0).await.unwrap().is_empty());
        }
        assert_eq!(fixture.calls(), 0);
    }

    #[tokio::test]
    async fn hey_jude_maps_to_expected_result() {
        let fixture = Arc::new(
            FixtureProvider::new("itunes", MusicSource::Itunes).with_entry("hey jude", hey_jude()),
        );
        let service = service_with(vec![fixture.clone()]);

        let results = service.search_songs("hey jude", 20, 0).await.unwrap();

        assert_eq!(results.len(), 1);
        let track = &results[0];
        assert_eq!(track.title, "Hey Jude");
        assert_eq!(track.artist, "The Beatles");
        assert_eq!(track.year, "1968");
        assert_eq!(track.duration, 431);
        assert_eq!(track.source, MusicSource::Itunes);
        assert_eq!(fixture.calls(), 1);
    }

    #[tokio::test]
    async fn timeout_on_first_variant_falls_through_to_second() {
        let fixture = Arc::new(
            FixtureProvider::new("itunes", MusicSource::Itunes).with_entry("hey jude", hey_jude()),
        );
        fixture.push_response(FixtureResponse::Timeout);
        let service = service_with(vec![fixture.clone()]);

        let results = service.search_songs("Hey Jude", 20, 0).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(fixture.queries(), vec!["Hey Jude", "hey jude"]);

        let health = service.limiter().snapshot("itunes").unwrap();
        assert_eq!(health.total_failures, 1);
        assert_eq!(health.total_successes, 1);
        assert_eq!(health.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn all_variants_empty_is_not_an_error() {
        let fixture = Arc::new(FixtureProvider::new("itunes", MusicSource::Itunes));
        let service = service_with(vec![fixture.clone()]);

        let results = service.search_songs("Lean On (feat. MØ)", 20, 0).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(fixture.calls(), 3);
    }

    #[tokio::test]
    async fn all_variants_failing_is_service_unavailable() {
        let fixture = Arc::new(FixtureProvider::new("itunes", MusicSource::Itunes));
        fixture.push_response(FixtureResponse::Timeout);
        fixture.push_response(FixtureResponse::Status(500));
        let service = service_with(vec![fixture.clone()]);

        let err = service.search_songs("Hey Jude", 20, 0).await.unwrap_err();

        assert!(matches!(err, SearchError::ServiceUnavailable { attempts: 2 }));
        assert_eq!(service.limiter().snapshot("itunes").unwrap().total_failures, 2);
    }

    #[tokio::test]
    async fn failure_then_empty_result_returns_empty() {
        let fixture = Arc::new(FixtureProvider::new("itunes", MusicSource::Itunes));
        fixture.push_response(FixtureResponse::Timeout);
        let service = service_with(vec![fixture]);

        let results = service.search_songs("Hey Jude", 20, 0).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn results_are_paginated() {
        let fixture = Arc::new(
            FixtureProvider::new("itunes", MusicSource::Itunes).with_entry("*", numbered_tracks(5)),
        );
        let service = service_with(vec![fixture]);

        let page = service.search_songs("band", 2, 1).await.unwrap();
        let titles: Vec<_> = page.iter().map(|track| track.title.as_str()).collect();
        assert_eq!(titles, vec!["Track 2", "Track 3"]);

        let past_end = service.search_songs("band", 2, 10).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn second_provider_is_used_when_first_fails() {
        let spotify = Arc::new(FixtureProvider::new("spotify", MusicSource::Spotify));
        spotify.push_response(FixtureResponse::Status(502));
        let itunes = Arc::new(
            FixtureProvider::new("itunes", MusicSource::Itunes).with_entry("*", hey_jude()),
        );
        let service = service_with(vec![spotify.clone(), itunes.clone()]);

        let results = service.search_songs("hey jude", 20, 0).await.unwrap();

        assert_eq!(results[0].source, MusicSource::Itunes);
        assert_eq!(spotify.calls(), 1);
        assert_eq!(itunes.calls(), 1);
    }

    #[tokio::test]
    async fn open_circuit_skips_provider_without_counting_a_failure() {
        let spotify = Arc::new(FixtureProvider::new("spotify", MusicSource::Spotify));
        let itunes = Arc::new(
            FixtureProvider::new("itunes", MusicSource::Itunes).with_entry("*", hey_jude()),
        );
        let service = service_with(vec![spotify.clone(), itunes.clone()]);
        for _ in 0..5 {
            service.limiter().record_failure("spotify");
        }

        let results = service.search_songs("hey jude", 20, 0).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(spotify.calls(), 0);
        let health = service.limiter().snapshot("spotify").unwrap();
        assert_eq!(health.circuit, CircuitStatus::Open);
        assert_eq!(health.total_failures, 5);
    }

    #[tokio::test]
    async fn open_circuit_on_only_provider_is_service_unavailable() {
        let fixture = Arc::new(
            FixtureProvider::new("itunes", MusicSource::Itunes).with_entry("*", hey_jude()),
        );
        let service = service_with(vec![fixture.clone()]);
        for _ in 0..5 {
            service.limiter().record_failure("itunes");
        }

        let err = service.search_songs("hey jude", 20, 0).await.unwrap_err();
        assert!(matches!(err, SearchError::ServiceUnavailable { .. }));
        assert_eq!(fixture.calls(), 0);
    }

    #[tokio::test]
    async fn artist_search_uses_artist_mapping() {
        let fixture = Arc::new(FixtureProvider::new("itunes", MusicSource::Itunes).with_entry(
            "beatles",
            json!({
                "results": [{
                    "wrapperType": "artist",
                    "artistId": 136975,
                    "artistName": "The Beatles",
                    "primaryGenreName": "Rock"
                }]
            }),
        ));
        let service = service_with(vec![fixture]);

        let artists = service.search_artists("Beatles", 10, 0).await.unwrap();

        assert_eq!(artists.len(), 1);
        assert_eq!(artists[0].name, "The Beatles");
        assert_eq!(artists[0].genre.as_deref(), Some("Rock"));
    }

    #[tokio::test]
    async fn provider_status_lists_every_provider() {
        let spotify = Arc::new(FixtureProvider::new("spotify", MusicSource::Spotify));
        let itunes = Arc::new(
            FixtureProvider::new("itunes", MusicSource::Itunes).with_entry("*", hey_jude()),
        );
        let service = service_with(vec![spotify, itunes]);
        service.search_songs("hey jude", 20, 0).await.unwrap();

        let status = service.provider_status();
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].provider, "spotify");
        assert_eq!(status[1].provider, "itunes");
        assert_eq!(status[1].total_successes, 1);
    }
}
