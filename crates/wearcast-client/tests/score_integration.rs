//! Wire-level contract tests: exact request bodies and the full
//! endpoint surface against one mock backend.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wearcast_client::{
    RecommendationApi, RequestGateway, ScoreClient, ScoreRequest, SettingsApi, SettingsClient,
};
use wearcast_location::Coordinate;

fn minimal_score_body() -> serde_json::Value {
    serde_json::json!({
        "weather": { "temp_f": 60.0, "wind_mph": 5.0, "short_forecast": "Clear" },
        "comfort_score": 88.0
    })
}

fn gateway(server: &MockServer) -> RequestGateway {
    RequestGateway::new(&server.uri(), Duration::from_secs(1))
}

// An unset comfort temperature must be an absent key, not null or 0;
// body_json matches the body exactly.
#[tokio::test]
async fn test_unset_comfort_is_absent_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/score"))
        .and(body_json(serde_json::json!({
            "latitude": 40.7128,
            "longitude": -74.006
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(minimal_score_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = ScoreClient::new(gateway(&server));
    let request = ScoreRequest::new(Coordinate::new(40.7128, -74.006).unwrap(), None);
    let rec = client
        .score(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(rec.comfort_score, 88.0);
}

#[tokio::test]
async fn test_set_comfort_is_present_on_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/score"))
        .and(body_json(serde_json::json!({
            "latitude": 40.7128,
            "longitude": -74.006,
            "comfort_temperature": 70.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(minimal_score_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = ScoreClient::new(gateway(&server));
    let request = ScoreRequest::new(Coordinate::new(40.7128, -74.006).unwrap(), Some(70.0));
    client
        .score(&request, &CancellationToken::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_full_endpoint_surface() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "healthy",
            "version": "1.0.0",
            "database": "connected"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/settings/ada"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "comfort_temperature": 66.0,
            "saved_locations": [
                { "name": "Home", "latitude": 40.7128, "longitude": -74.006 }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(200).set_body_json(minimal_score_body()))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    assert!(gateway(&server).health(&cancel).await.unwrap());

    let settings = SettingsClient::new(gateway(&server))
        .fetch_settings("ada", &cancel)
        .await
        .unwrap();
    assert_eq!(settings.comfort_temperature, Some(66.0));

    let coordinate = Coordinate::new(
        settings.saved_locations[0].latitude,
        settings.saved_locations[0].longitude,
    )
    .unwrap();
    let rec = ScoreClient::new(gateway(&server))
        .score(&ScoreRequest::new(coordinate, settings.comfort_temperature), &cancel)
        .await
        .unwrap();
    assert_eq!(rec.weather.short_forecast, "Clear");
}
