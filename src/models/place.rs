// SPDX-License-Identifier: MIT

//! Place cache model, keyed by the mapping provider's place identifier.

use crate::geo::GeoPoint;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point of interest cached locally.
///
/// Either created raw from a user-authored stop (name + coordinates) or
/// normalized out of a provider place-details response by enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// External place id (unique index)
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub address: String,
    pub location: GeoPoint,
    /// Provider primary type, e.g. "museum"
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub icon_background: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub review_summary: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub user_rating_count: u32,
    #[serde(default)]
    pub directions_uri: String,
    #[serde(default)]
    pub place_uri: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Place {
    /// Build a bare place for a user-authored stop with raw coordinates.
    /// Gets a locally generated id since there is no provider id to key on.
    pub fn from_raw_stop(name: &str, image_url: &str, address: &str, coords: &[f64]) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            place_id: ObjectId::new().to_hex(),
            name: name.to_string(),
            state: String::new(),
            country: String::new(),
            image_url: image_url.to_string(),
            address: address.to_string(),
            location: GeoPoint::from_coords(coords),
            category: String::new(),
            icon_url: String::new(),
            icon_background: String::new(),
            summary: String::new(),
            review_summary: String::new(),
            rating: 0.0,
            user_rating_count: 0,
            directions_uri: String::new(),
            place_uri: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
