//! Integration tests for geocoding and proxy routing using wiremock.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use skycast_weather::client::{AIR_POLLUTION_PATH, CURRENT_PATH, FORECAST_PATH, GEOCODE_PATH};
use skycast_weather::{ApiError, WeatherError, WeatherProvider, WeatherSettings};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn direct(server: &MockServer) -> WeatherSettings {
    WeatherSettings {
        base_url: server.uri(),
        api_key: Some("test_key".to_string()),
        ..Default::default()
    }
}

fn places_body() -> serde_json::Value {
    serde_json::json!([
        {
            "name": "London",
            "local_names": {"en": "London", "ru": "Лондон"},
            "lat": 51.5073219,
            "lon": -0.1276474,
            "country": "GB",
            "state": "England"
        },
        {
            "name": "London",
            "lat": 42.9832406,
            "lon": -81.243372,
            "country": "CA",
            "state": "Ontario"
        }
    ])
}

#[tokio::test]
async fn test_geocode_returns_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .and(query_param("q", "London"))
        .and(query_param("limit", "5"))
        .and(query_param("appid", "test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(places_body()))
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(direct(&server)).unwrap();
    let places = provider.geocode("London").await.unwrap();

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].label(), "London, England, GB");
    assert_eq!(places[0].local_name("ru"), Some("Лондон"));
    assert_eq!(places[1].country, "CA");
}

#[tokio::test]
async fn test_geocode_is_cached_by_raw_input() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(places_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .and(query_param("q", "london"))
        .respond_with(ResponseTemplate::new(200).set_body_json(places_body()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(direct(&server)).unwrap();
    let first = provider.geocode("London").await.unwrap();
    let second = provider.geocode("London").await.unwrap();
    assert_eq!(first, second);

    // Different spelling is a different key.
    provider.geocode("london").await.unwrap();
}

#[tokio::test]
async fn test_geocode_empty_result_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(direct(&server)).unwrap();
    let places = provider.geocode("Atlantis").await.unwrap();
    assert!(places.is_empty());
}

#[tokio::test]
async fn test_geocode_http_failure_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(direct(&server)).unwrap();
    let err = provider.geocode("London").await.unwrap_err();
    assert!(matches!(
        err,
        WeatherError::Geocoding(ApiError::Status { status: 502, .. })
    ));

    // Failures are not cached.
    assert!(provider.geocode("London").await.is_err());
}

#[tokio::test]
async fn test_geocode_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(direct(&server)).unwrap();
    let err = provider.geocode("London").await.unwrap_err();
    assert!(matches!(err, WeatherError::Geocoding(ApiError::Decode(_))));
}

#[tokio::test]
async fn test_proxy_routes_every_request_without_key() {
    let server = MockServer::start().await;
    let settings = WeatherSettings {
        api_key: None,
        proxy_url: Some(format!("{}/.netlify/functions/openweather-proxy", server.uri())),
        ..Default::default()
    };

    for (route, body) in [
        (GEOCODE_PATH, places_body()),
        (
            CURRENT_PATH,
            serde_json::json!({"name": "London", "main": {"temp": 285.0}}),
        ),
        (FORECAST_PATH, serde_json::json!({"list": []})),
        (
            AIR_POLLUTION_PATH,
            serde_json::json!({"list": [{"main": {"aqi": 1}}]}),
        ),
    ] {
        Mock::given(method("GET"))
            .and(path("/.netlify/functions/openweather-proxy"))
            .and(query_param("path", route))
            .and(query_param_is_missing("appid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let provider = WeatherProvider::new(settings).unwrap();
    let places = provider.geocode("London").await.unwrap();
    let fetch = provider
        .fetch_weather(places[0].lat, places[0].lon)
        .await
        .unwrap();
    assert_eq!(fetch.payload.current.name, "London");
    assert_eq!(fetch.payload.forecast.as_ref().map(|f| f.list.len()), Some(0));

    let enriched = fetch.air_update.unwrap().wait().await.unwrap();
    assert_eq!(enriched.air_summary(), "Index: 1 (Good)");
}
