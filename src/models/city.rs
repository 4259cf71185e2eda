// SPDX-License-Identifier: MIT

//! City cache model: an aggregation anchor grouping plans by metro area.

use crate::geo::GeoPoint;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bounding viewport in API order (`[latitude, longitude]` corners).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

/// Stored city document, keyed by the external place id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    /// Running count of plans referencing this city.
    /// Incremented once per plan creation; never decremented on edit.
    #[serde(default)]
    pub plans: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl City {
    /// Whether the cached document still lacks its enrichment detail.
    pub fn needs_detail(&self) -> bool {
        self.country.is_empty() && self.location.is_none()
    }
}
