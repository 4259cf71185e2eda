// SPDX-License-Identifier: MIT

//! Provider HTTP client tests against a local mock server.

use serde_json::json;
use tripcraft::error::AppError;
use tripcraft::services::maps::ProviderPlace;
use tripcraft::services::{ImageStore, MapsClient};
use wiremock::matchers::{headers, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn maps_client(server: &MockServer) -> MapsClient {
    MapsClient::with_base_urls(Some("test-key".to_string()), server.uri(), server.uri())
}

#[tokio::test]
async fn test_place_details_normalization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/places/test-place"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "test-place",
            "displayName": { "text": "Brooklyn Bridge" },
            "shortFormattedAddress": "New York, NY 10038",
            "addressComponents": [
                { "longText": "New York", "shortText": "NY", "types": ["administrative_area_level_1"] },
                { "longText": "United States", "shortText": "US", "types": ["country"] }
            ],
            "location": { "latitude": 40.7061, "longitude": -73.9969 },
            "primaryType": "historical_landmark",
            "rating": 4.8,
            "userRatingCount": 68123,
        })))
        .mount(&server)
        .await;

    let payload = maps_client(&server)
        .place_details("test-place")
        .await
        .unwrap();
    let place = ProviderPlace::from_value(&payload)
        .unwrap()
        .normalize("test-place");

    assert_eq!(place.name, "Brooklyn Bridge");
    assert_eq!(place.state, "New York");
    assert_eq!(place.country, "United States");
    assert_eq!(place.location.coordinates, vec![-73.9969, 40.7061]);
    assert_eq!(place.rating, 4.8);
}

#[tokio::test]
async fn test_place_details_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/places/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = maps_client(&server).place_details("broken").await.unwrap_err();
    // Upstream failure, not a not-found and not a config problem.
    assert!(matches!(err, AppError::MapsApi(_)));
}

#[tokio::test]
async fn test_compute_route_parses_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/directions/v2:computeRoutes"))
        .and(headers(
            "X-Goog-FieldMask",
            vec![
                "routes.duration",
                "routes.distanceMeters",
                "routes.polyline.encodedPolyline",
            ],
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "routes": [{
                "distanceMeters": 2500.0,
                "duration": "3600s",
                "polyline": { "encodedPolyline": "abcd1234" }
            }]
        })))
        .mount(&server)
        .await;

    let route = maps_client(&server)
        .compute_route(&[vec![40.7, -73.9], vec![40.8, -73.8]])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(route.distance_meters, 2500.0);
    assert_eq!(route.duration_seconds, 3600);
    assert_eq!(route.polyline, "abcd1234");
}

#[tokio::test]
async fn test_compute_route_without_routes_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/directions/v2:computeRoutes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let route = maps_client(&server)
        .compute_route(&[vec![40.7, -73.9], vec![40.8, -73.8]])
        .await
        .unwrap();
    assert!(route.is_none());
}

#[tokio::test]
async fn test_image_upload_returns_durable_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/demo-cloud/image/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secure_url": "https://res.example.com/tripcraft/places/abc.jpg"
        })))
        .mount(&server)
        .await;

    let store = ImageStore::with_base_url(
        Some("demo-cloud".to_string()),
        Some("key".to_string()),
        Some("secret".to_string()),
        server.uri(),
    );
    let url = store
        .upload_from_url("https://provider.example.com/photo.jpg")
        .await
        .unwrap();
    assert_eq!(
        url.as_deref(),
        Some("https://res.example.com/tripcraft/places/abc.jpg")
    );
}

#[tokio::test]
async fn test_image_upload_failure_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/demo-cloud/image/upload"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad signature"))
        .mount(&server)
        .await;

    let store = ImageStore::with_base_url(
        Some("demo-cloud".to_string()),
        Some("key".to_string()),
        Some("secret".to_string()),
        server.uri(),
    );
    let err = store
        .upload_from_url("https://provider.example.com/photo.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MapsApi(_)));
}
