//! TMDB provider tests against a mock server.

use reelshelf::metadata::providers::TmdbProvider;
use reelshelf::metadata::{LookupError, MetadataProvider};
use reelshelf_common::MediaKind;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> TmdbProvider {
    TmdbProvider::new("test-key".into(), "en-US".into())
        .unwrap()
        .with_base_url(server.uri())
        .with_image_base("https://img.test/t/p")
}

fn matrix_search() -> serde_json::Value {
    json!({
        "page": 1,
        "results": [
            { "id": 9999, "title": "The Matrix Revisited", "release_date": "2001-11-19" },
            { "id": 603, "title": "The Matrix", "release_date": "1999-03-30" }
        ]
    })
}

fn matrix_details() -> serde_json::Value {
    json!({
        "id": 603,
        "title": "The Matrix",
        "overview": "Set in the 22nd century...",
        "release_date": "1999-03-30",
        "vote_average": 8.2,
        "vote_count": 24000,
        "genres": [{ "id": 28, "name": "Action" }, { "id": 878, "name": "Science Fiction" }],
        "imdb_id": "tt0133093",
        "poster_path": "/matrix.jpg",
        "backdrop_path": "/matrix-bg.jpg"
    })
}

#[tokio::test]
async fn movie_search_picks_best_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("query", "The Matrix"))
        .and(query_param("year", "1999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matrix_search()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/603"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matrix_details()))
        .expect(1)
        .mount(&server)
        .await;

    let record = provider(&server)
        .lookup_by_title_year(MediaKind::Movie, "The Matrix", Some(1999))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.title, "The Matrix");
    assert_eq!(record.year, Some(1999));
    assert_eq!(record.external_id.as_deref(), Some("tt0133093"));
    assert_eq!(record.genres, vec!["Action", "Science Fiction"]);
    assert_eq!(record.rating, Some(8.2));
    assert_eq!(
        record.poster_url.as_deref(),
        Some("https://img.test/t/p/w500/matrix.jpg")
    );
    assert_eq!(
        record.backdrop_url.as_deref(),
        Some("https://img.test/t/p/w1280/matrix-bg.jpg")
    );
    assert_eq!(record.source, "tmdb");
}

#[tokio::test]
async fn tv_details_carry_imdb_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/tv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": 1396, "name": "Breaking Bad", "first_air_date": "2008-01-20" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tv/1396"))
        .and(query_param("append_to_response", "external_ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1396,
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "vote_average": 8.9,
            "vote_count": 12000,
            "genres": [{ "id": 18, "name": "Drama" }],
            "external_ids": { "imdb_id": "tt0903747" }
        })))
        .mount(&server)
        .await;

    let record = provider(&server)
        .lookup_by_title_year(MediaKind::TvShow, "Breaking Bad", None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.external_id.as_deref(), Some("tt0903747"));
    assert_eq!(record.year, Some(2008));
    assert_eq!(record.poster_url, None);
}

#[tokio::test]
async fn unrelated_results_are_no_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": 1, "title": "Completely Different", "release_date": "1970-01-01" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matrix_details()))
        .expect(0)
        .mount(&server)
        .await;

    let result = provider(&server)
        .lookup_by_title_year(MediaKind::Movie, "Heat", Some(1995))
        .await
        .unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn rate_limit_response_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matrix_search()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/603"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matrix_details()))
        .mount(&server)
        .await;

    let record = provider(&server)
        .lookup_by_title_year(MediaKind::Movie, "The Matrix", Some(1999))
        .await
        .unwrap();
    assert!(record.is_some());
}

#[tokio::test]
async fn rejected_key_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status_code": 7,
            "status_message": "Invalid API key: You must be granted a valid key."
        })))
        .mount(&server)
        .await;

    let err = provider(&server)
        .lookup_by_title_year(MediaKind::Movie, "The Matrix", None)
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Unavailable(_)));
}

#[tokio::test]
async fn garbled_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .lookup_by_title_year(MediaKind::Movie, "The Matrix", None)
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Decode(_)));
}

#[tokio::test]
async fn lookup_by_imdb_id_goes_through_find() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/find/tt0133093"))
        .and(query_param("external_source", "imdb_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "movie_results": [{ "id": 603 }],
            "tv_results": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/603"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matrix_details()))
        .mount(&server)
        .await;

    let record = provider(&server)
        .lookup_by_id("tt0133093")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.title, "The Matrix");
}

#[tokio::test]
async fn lookup_by_tmdb_id_of_deleted_title_is_a_miss() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tv/42"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = provider(&server).lookup_by_id("tmdb:tv:42").await.unwrap();
    assert_eq!(result, None);
}
