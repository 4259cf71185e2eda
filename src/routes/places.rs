// SPDX-License-Identifier: MIT

//! Public place detail route.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::models::Place;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/places/{place_id}", get(get_place))
}

/// Enriched place as returned by the API.
#[derive(Debug, Serialize)]
pub struct PlaceResponse {
    pub id: String,
    pub place_id: String,
    pub name: String,
    pub state: String,
    pub country: String,
    pub image_url: String,
    pub address: String,
    /// `[latitude, longitude]`
    pub location: Vec<f64>,
    pub category: String,
    pub icon_url: String,
    pub icon_background: String,
    pub summary: String,
    pub review_summary: String,
    pub rating: f64,
    pub user_rating_count: u32,
    pub directions_uri: String,
    pub place_uri: String,
}

impl From<Place> for PlaceResponse {
    fn from(place: Place) -> Self {
        Self {
            id: place.id.map(|id| id.to_hex()).unwrap_or_default(),
            place_id: place.place_id,
            name: place.name,
            state: place.state,
            country: place.country,
            image_url: place.image_url,
            address: place.address,
            location: place.location.coords(),
            category: place.category,
            icon_url: place.icon_url,
            icon_background: place.icon_background,
            summary: place.summary,
            review_summary: place.review_summary,
            rating: place.rating,
            user_rating_count: place.user_rating_count,
            directions_uri: place.directions_uri,
            place_uri: place.place_uri,
        }
    }
}

/// Enriched place detail, served from the cache when the schema version
/// is current and from the provider otherwise.
async fn get_place(
    State(state): State<Arc<AppState>>,
    Path(place_id): Path<String>,
) -> Result<Json<PlaceResponse>> {
    let place = state.enricher.get_place(&place_id).await?;
    Ok(Json(place.into()))
}
