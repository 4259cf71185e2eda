// SPDX-License-Identifier: MIT

//! Google Maps/Places API client.
//!
//! Handles:
//! - Place details with field masks (places and cities use different masks)
//! - Route computation between an ordered list of stop coordinates
//! - Photo media URL construction
//!
//! The raw place payload is returned as JSON so the enrichment layer can
//! cache it verbatim alongside the normalized extraction.

use crate::error::{AppError, Result};
use crate::geo::GeoPoint;
use crate::models::{City, Place, Viewport};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Fields requested for place enrichment.
const PLACE_FIELDS: &str = "id,displayName,shortFormattedAddress,formattedAddress,\
addressComponents,location,primaryType,iconMaskBaseUri,iconBackgroundColor,photos,\
editorialSummary,generativeSummary,reviewSummary,rating,userRatingCount,googleMapsLinks";

/// Fields requested for city enrichment.
const CITY_FIELDS: &str = "displayName,photos,location,viewport,addressComponents";

/// Route response fields; only duration, distance and an overview-quality
/// polyline are needed, which keeps the response payload small.
const ROUTE_FIELDS: &str = "routes.duration,routes.distanceMeters,routes.polyline.encodedPolyline";

/// Maps API client.
#[derive(Clone)]
pub struct MapsClient {
    http: reqwest::Client,
    places_base_url: String,
    routes_base_url: String,
    api_key: Option<String>,
}

impl MapsClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_urls(
            api_key,
            "https://places.googleapis.com/v1".to_string(),
            "https://routes.googleapis.com".to_string(),
        )
    }

    /// Construct against alternative endpoints (used by tests).
    pub fn with_base_urls(
        api_key: Option<String>,
        places_base_url: String,
        routes_base_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            places_base_url,
            routes_base_url,
            api_key,
        }
    }

    /// Fail before any network call when the API key is not configured.
    fn key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(AppError::Config("GOOGLE_MAPS_API_KEY"))
    }

    /// Fetch raw place details for enrichment.
    pub async fn place_details(&self, place_id: &str) -> Result<serde_json::Value> {
        self.details_with_fields(place_id, PLACE_FIELDS).await
    }

    /// Fetch raw place details with the smaller city field mask.
    pub async fn city_details(&self, place_id: &str) -> Result<serde_json::Value> {
        self.details_with_fields(place_id, CITY_FIELDS).await
    }

    async fn details_with_fields(&self, place_id: &str, fields: &str) -> Result<serde_json::Value> {
        let key = self.key()?;
        let url = format!("{}/places/{}", self.places_base_url, place_id);

        let response = self
            .http
            .get(&url)
            .query(&[("fields", fields), ("key", key)])
            .send()
            .await
            .map_err(|e| AppError::MapsApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MapsApi(format!(
                "Place details failed: HTTP {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::MapsApi(format!("JSON parse error: {}", e)))
    }

    /// Compute a route along the given `[lat, lng]` points.
    ///
    /// Returns `Ok(None)` for fewer than two points; a route needs two
    /// endpoints, so that is a no-op rather than an error.
    pub async fn compute_route(&self, points: &[Vec<f64>]) -> Result<Option<RouteSummary>> {
        if points.len() < 2 {
            return Ok(None);
        }

        let key = self.key()?;
        let url = format!("{}/directions/v2:computeRoutes", self.routes_base_url);

        let origin = &points[0];
        let destination = &points[points.len() - 1];
        let intermediates: Vec<serde_json::Value> = points[1..points.len() - 1]
            .iter()
            .map(|p| json!({ "location": { "latLng": latlng(p) } }))
            .collect();

        let mut body = json!({
            "origin": { "location": { "latLng": latlng(origin) } },
            "destination": { "location": { "latLng": latlng(destination) } },
            "travelMode": "WALK",
            "polylineQuality": "overview",
            "routingPreference": "ROUTING_PREFERENCE_UNSPECIFIED",
            "computeAlternativeRoutes": false,
            "languageCode": "en-US",
        });
        if !intermediates.is_empty() {
            body["intermediates"] = json!(intermediates);
        }

        let response = self
            .http
            .post(&url)
            .header("X-Goog-Api-Key", key)
            .header("X-Goog-FieldMask", ROUTE_FIELDS)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::MapsApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MapsApi(format!(
                "Route computation failed: HTTP {}: {}",
                status, body
            )));
        }

        let routes: RoutesResponse = response
            .json()
            .await
            .map_err(|e| AppError::MapsApi(format!("JSON parse error: {}", e)))?;

        let Some(route) = routes.routes.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(RouteSummary {
            distance_meters: route.distance_meters,
            duration_seconds: parse_duration_seconds(&route.duration)?,
            polyline: route.polyline.encoded_polyline,
        }))
    }

    /// Media URL for a provider photo reference.
    pub fn photo_media_url(&self, photo_name: &str) -> Result<String> {
        let key = self.key()?;
        Ok(format!(
            "{}/{}/media?maxHeightPx=400&maxWidthPx=400&key={}",
            self.places_base_url, photo_name, key
        ))
    }
}

fn latlng(point: &[f64]) -> serde_json::Value {
    let (lat, lng) = if point.len() < 2 {
        (0.0, 0.0)
    } else {
        (point[0], point[1])
    };
    json!({ "latitude": lat, "longitude": lng })
}

/// Routes API returns durations like `"3600s"`.
fn parse_duration_seconds(raw: &str) -> Result<i64> {
    raw.trim_end_matches('s')
        .parse()
        .map_err(|_| AppError::MapsApi(format!("Unparseable route duration: {}", raw)))
}

/// Distance, duration and polyline for one computed route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub distance_meters: f64,
    pub duration_seconds: i64,
    pub polyline: String,
}

#[derive(Deserialize)]
struct RoutesResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Route {
    #[serde(default)]
    distance_meters: f64,
    duration: String,
    polyline: RoutePolyline,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoutePolyline {
    encoded_polyline: String,
}

// ─── Place payload normalization ─────────────────────────────────

/// Typed view of the provider's place-details payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderPlace {
    pub id: String,
    pub display_name: LocalizedText,
    pub short_formatted_address: String,
    pub formatted_address: String,
    pub address_components: Vec<AddressComponent>,
    pub location: Option<LatLng>,
    pub viewport: Option<LatLngBounds>,
    pub primary_type: String,
    pub icon_mask_base_uri: String,
    pub icon_background_color: String,
    pub photos: Vec<Photo>,
    pub editorial_summary: Option<LocalizedText>,
    pub generative_summary: Option<GenerativeSummary>,
    pub review_summary: Option<ReviewSummary>,
    pub rating: f64,
    pub user_rating_count: u32,
    pub google_maps_links: Option<MapsLinks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressComponent {
    pub long_text: String,
    pub short_text: String,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LatLngBounds {
    pub low: LatLng,
    pub high: LatLng,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerativeSummary {
    #[serde(default)]
    pub overview: LocalizedText,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewSummary {
    #[serde(default)]
    pub text: LocalizedText,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapsLinks {
    pub directions_uri: String,
    pub place_uri: String,
}

impl ProviderPlace {
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| AppError::MapsApi(format!("Unexpected place payload: {}", e)))
    }

    fn address_component(&self, kind: &str) -> String {
        self.address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == kind))
            .map(|c| c.long_text.clone())
            .unwrap_or_default()
    }

    /// First photo reference, if any.
    pub fn first_photo(&self) -> Option<&str> {
        self.photos
            .first()
            .map(|p| p.name.as_str())
            .filter(|n| !n.is_empty())
    }

    fn latlng_coords(&self) -> Vec<f64> {
        self.location
            .map(|l| vec![l.latitude, l.longitude])
            .unwrap_or_default()
    }

    /// Pure extraction of the normalized place record. The image URL is
    /// attached separately after the photo upload.
    pub fn normalize(&self, place_id: &str) -> Place {
        let summary = self
            .editorial_summary
            .as_ref()
            .map(|s| s.text.clone())
            .filter(|t| !t.is_empty())
            .or_else(|| {
                self.generative_summary
                    .as_ref()
                    .map(|s| s.overview.text.clone())
            })
            .unwrap_or_default();

        let address = if !self.short_formatted_address.is_empty() {
            self.short_formatted_address.clone()
        } else {
            self.formatted_address.clone()
        };

        let links = self.google_maps_links.clone().unwrap_or_default();
        let now = Utc::now();

        Place {
            id: None,
            place_id: place_id.to_string(),
            name: self.display_name.text.clone(),
            state: self.address_component("administrative_area_level_1"),
            country: self.address_component("country"),
            image_url: String::new(),
            address,
            location: GeoPoint::from_coords(&self.latlng_coords()),
            category: self.primary_type.clone(),
            icon_url: self.icon_mask_base_uri.clone(),
            icon_background: self.icon_background_color.clone(),
            summary,
            review_summary: self
                .review_summary
                .as_ref()
                .map(|s| s.text.text.clone())
                .unwrap_or_default(),
            rating: self.rating,
            user_rating_count: self.user_rating_count,
            directions_uri: links.directions_uri,
            place_uri: links.place_uri,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pure extraction of the normalized city record.
    pub fn normalize_city(&self, place_id: &str) -> City {
        let now = Utc::now();
        City {
            id: None,
            place_id: place_id.to_string(),
            name: self.display_name.text.clone(),
            state: self.address_component("administrative_area_level_1"),
            country: self.address_component("country"),
            image_url: String::new(),
            location: Some(GeoPoint::from_coords(&self.latlng_coords())),
            viewport: self.viewport.map(|v| Viewport {
                low: vec![v.low.latitude, v.low.longitude],
                high: vec![v.high.latitude, v.high.longitude],
            }),
            plans: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> serde_json::Value {
        json!({
            "id": "ChIJd8BlQ2BZwokRAFUEcm_qrcA",
            "displayName": { "text": "Brooklyn Bridge" },
            "shortFormattedAddress": "New York, NY 10038",
            "formattedAddress": "Brooklyn Bridge, New York, NY 10038, USA",
            "addressComponents": [
                { "longText": "New York", "shortText": "NY", "types": ["administrative_area_level_1"] },
                { "longText": "United States", "shortText": "US", "types": ["country"] }
            ],
            "location": { "latitude": 40.7061, "longitude": -73.9969 },
            "primaryType": "historical_landmark",
            "iconMaskBaseUri": "https://maps.gstatic.com/mapfiles/place_api/icons/v2/museum_pinlet",
            "iconBackgroundColor": "#13B5C7",
            "photos": [ { "name": "places/abc/photos/xyz" } ],
            "editorialSummary": { "text": "Iconic suspension bridge." },
            "reviewSummary": { "text": { "text": "People love the views." } },
            "rating": 4.8,
            "userRatingCount": 68123,
            "googleMapsLinks": {
                "directionsUri": "https://maps.google.com/dir",
                "placeUri": "https://maps.google.com/place"
            }
        })
    }

    #[test]
    fn test_normalize_place_extraction() {
        let provider = ProviderPlace::from_value(&sample_payload()).unwrap();
        let place = provider.normalize("ChIJd8BlQ2BZwokRAFUEcm_qrcA");

        assert_eq!(place.name, "Brooklyn Bridge");
        assert_eq!(place.state, "New York");
        assert_eq!(place.country, "United States");
        assert_eq!(place.address, "New York, NY 10038");
        // Stored GeoJSON order is [lng, lat].
        assert_eq!(place.location.coordinates, vec![-73.9969, 40.7061]);
        assert_eq!(place.category, "historical_landmark");
        assert_eq!(place.summary, "Iconic suspension bridge.");
        assert_eq!(place.review_summary, "People love the views.");
        assert_eq!(place.rating, 4.8);
        assert_eq!(place.user_rating_count, 68123);
        assert_eq!(place.directions_uri, "https://maps.google.com/dir");
    }

    #[test]
    fn test_normalize_falls_back_to_generative_summary() {
        let mut payload = sample_payload();
        payload["editorialSummary"] = json!(null);
        payload["generativeSummary"] = json!({ "overview": { "text": "Generated overview." } });
        let provider = ProviderPlace::from_value(&payload).unwrap();
        assert_eq!(provider.normalize("x").summary, "Generated overview.");
    }

    #[test]
    fn test_normalize_tolerates_sparse_payload() {
        let provider =
            ProviderPlace::from_value(&json!({ "displayName": { "text": "Somewhere" } })).unwrap();
        let place = provider.normalize("sparse-id");
        assert_eq!(place.name, "Somewhere");
        assert_eq!(place.state, "");
        // Missing location degrades to the permissive [0, 0] default.
        assert_eq!(place.location.coordinates, vec![0.0, 0.0]);
    }

    #[test]
    fn test_normalize_city_viewport() {
        let mut payload = sample_payload();
        payload["viewport"] = json!({
            "low": { "latitude": 40.0, "longitude": -74.5 },
            "high": { "latitude": 41.0, "longitude": -73.5 }
        });
        let provider = ProviderPlace::from_value(&payload).unwrap();
        let city = provider.normalize_city("city-id");
        let viewport = city.viewport.unwrap();
        assert_eq!(viewport.low, vec![40.0, -74.5]);
        assert_eq!(viewport.high, vec![41.0, -73.5]);
        assert_eq!(city.plans, 0);
    }

    #[test]
    fn test_parse_duration_seconds() {
        assert_eq!(parse_duration_seconds("3600s").unwrap(), 3600);
        assert_eq!(parse_duration_seconds("42").unwrap(), 42);
        assert!(parse_duration_seconds("abc").is_err());
    }

    #[tokio::test]
    async fn test_compute_route_requires_two_points() {
        let client = MapsClient::new(Some("test-key".to_string()));
        let result = client.compute_route(&[vec![1.0, 2.0]]).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_a_config_error() {
        let client = MapsClient::new(None);
        let err = client.place_details("abc").await.unwrap_err();
        assert!(matches!(err, AppError::Config("GOOGLE_MAPS_API_KEY")));

        let err = client
            .compute_route(&[vec![1.0, 2.0], vec![3.0, 4.0]])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config("GOOGLE_MAPS_API_KEY")));
    }
}
