// SPDX-License-Identifier: MIT

//! Place and city enrichment against the mapping provider.
//!
//! Cache protocol per external place id:
//! - Uncached, or cached with a stale schema version: fetch the provider
//!   payload, normalize it, upload the first photo to durable storage,
//!   upsert both the normalized record and the raw payload tagged with
//!   the current schema version.
//! - Cached with the current schema version: return the stored record
//!   without any external call.
//!
//! Concurrent enrichments of the same id are not locked against each
//! other; both upserts are keyed by the external id, so duplicates
//! converge to one stored record at the cost of redundant provider calls.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::{City, Place};
use crate::services::maps::{MapsClient, ProviderPlace};
use crate::services::ImageStore;

/// Version of the normalization logic below. Bumping it lazily re-fetches
/// cache entries as they are next requested.
pub const PLACE_SCHEMA_VERSION: i32 = 2;

/// Whether a cached payload needs a provider re-fetch.
pub fn needs_refresh(stored_version: Option<i32>) -> bool {
    stored_version != Some(PLACE_SCHEMA_VERSION)
}

/// Place/city enrichment service.
#[derive(Clone)]
pub struct PlaceEnricher {
    db: Db,
    maps: MapsClient,
    images: ImageStore,
}

impl PlaceEnricher {
    pub fn new(db: Db, maps: MapsClient, images: ImageStore) -> Self {
        Self { db, maps, images }
    }

    /// Fetch an enriched place, going to the provider only on a cache
    /// miss or a stale schema version.
    pub async fn get_place(&self, place_id: &str) -> Result<Place> {
        let stored_version = self.db.cached_payload_version(place_id).await?;

        if !needs_refresh(stored_version) {
            if let Some(place) = self.db.find_place(place_id).await? {
                tracing::debug!(place_id, "Place cache hit");
                return Ok(place);
            }
        }

        tracing::info!(place_id, ?stored_version, "Enriching place from provider");
        let payload = self.maps.place_details(place_id).await?;
        let provider = ProviderPlace::from_value(&payload)?;
        let mut place = provider.normalize(place_id);

        place.image_url = self.stored_photo_url(&provider, place_id).await?;

        self.db.upsert_place(&place).await?;
        let raw = serde_json::to_string(&payload)
            .map_err(|e| AppError::MapsApi(format!("Failed to encode payload: {}", e)))?;
        self.db
            .upsert_cached_payload(place_id, PLACE_SCHEMA_VERSION, &raw)
            .await?;

        Ok(place)
    }

    /// Fetch an enriched city, calling the provider only when the cached
    /// document is absent or still lacks its detail fields.
    pub async fn get_city(&self, place_id: &str) -> Result<City> {
        let cached = self.db.find_city(place_id).await?;
        if let Some(city) = &cached {
            if !city.needs_detail() {
                return Ok(city.clone());
            }
        }

        tracing::info!(place_id, "Enriching city from provider");
        let payload = self.maps.city_details(place_id).await?;
        let provider = ProviderPlace::from_value(&payload)?;
        let mut city = provider.normalize_city(place_id);

        // Keep a previously stored image rather than re-uploading.
        let existing_image = cached
            .as_ref()
            .map(|c| c.image_url.clone())
            .filter(|url| !url.is_empty());
        city.image_url = match existing_image {
            Some(url) => url,
            None => self.stored_photo_url(&provider, place_id).await?,
        };

        self.db.upsert_city(&city).await?;

        self.db
            .find_city(place_id)
            .await?
            .ok_or_else(|| AppError::Database("City upsert did not persist".to_string()))
    }

    /// Upload the first provider photo (at most one) to durable storage.
    async fn stored_photo_url(&self, provider: &ProviderPlace, place_id: &str) -> Result<String> {
        let Some(photo_name) = provider.first_photo() else {
            return Ok(String::new());
        };
        let media_url = self.maps.photo_media_url(photo_name)?;
        tracing::debug!(place_id, "Uploading place photo to durable storage");
        Ok(self
            .images
            .upload_from_url(&media_url)
            .await?
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_version_gate() {
        assert!(needs_refresh(None));
        assert!(needs_refresh(Some(PLACE_SCHEMA_VERSION - 1)));
        assert!(!needs_refresh(Some(PLACE_SCHEMA_VERSION)));
    }

    fn enricher_against(db: Db, server: &MockServer) -> PlaceEnricher {
        let maps = MapsClient::with_base_urls(
            Some("test-key".to_string()),
            server.uri(),
            server.uri(),
        );
        PlaceEnricher::new(db, maps, ImageStore::new(None, None, None))
    }

    /// A cached record at the current schema version is served without
    /// any provider call; the mock server fails the test on one.
    #[tokio::test]
    async fn test_current_version_is_served_without_provider_call() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let db = Db::new_memory();
        let mut place = crate::models::Place::from_raw_stop("Cached Museum", "", "", &[1.0, 2.0]);
        place.place_id = "cached-id".to_string();
        db.upsert_place(&place).await.unwrap();
        db.upsert_cached_payload("cached-id", PLACE_SCHEMA_VERSION, "{}")
            .await
            .unwrap();

        let enricher = enricher_against(db, &server);
        let got = enricher.get_place("cached-id").await.unwrap();
        assert_eq!(got.name, "Cached Museum");

        server.verify().await;
    }

    /// A stale schema version forces a re-fetch and leaves the cache
    /// tagged with the current version.
    #[tokio::test]
    async fn test_stale_version_refetches_from_provider() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/places/stale-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "displayName": { "text": "Fresh Name" },
                "location": { "latitude": 40.0, "longitude": -73.0 },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let db = Db::new_memory();
        let mut place = crate::models::Place::from_raw_stop("Stale Name", "", "", &[1.0, 2.0]);
        place.place_id = "stale-id".to_string();
        db.upsert_place(&place).await.unwrap();
        db.upsert_cached_payload("stale-id", PLACE_SCHEMA_VERSION - 1, "{}")
            .await
            .unwrap();

        let enricher = enricher_against(db.clone(), &server);
        let got = enricher.get_place("stale-id").await.unwrap();
        assert_eq!(got.name, "Fresh Name");
        assert_eq!(
            db.cached_payload_version("stale-id").await.unwrap(),
            Some(PLACE_SCHEMA_VERSION)
        );

        server.verify().await;
    }
}
