// SPDX-License-Identifier: MIT

//! Plan model: a user-authored itinerary of ordered stops.

use crate::geo::GeoPoint;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which part of the day a plan is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaySegment {
    #[serde(rename = "Full day")]
    FullDay,
    #[serde(rename = "Half day")]
    HalfDay,
    Night,
}

/// One waypoint in a plan. Lightweight copy of the referenced place;
/// detail fields live in the `places` collection keyed by `place_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStop {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub address: String,
    /// `[latitude, longitude]` as authored
    #[serde(default)]
    pub location: Vec<f64>,
}

/// Lightweight city reference embedded in a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCity {
    pub place_id: String,
    pub name: String,
}

/// Stored plan document.
///
/// `stop_count` always equals `stops.len()`, and `start_location` /
/// `finish_location` are derived from the first and last stop whenever the
/// stops are written. Neither is client-settable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub day_segment: Option<DaySegment>,
    #[serde(default)]
    pub cities: Vec<PlanCity>,
    #[serde(default)]
    pub stops: Vec<PlanStop>,
    pub stop_count: u32,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub review_count: u32,
    pub start_location: GeoPoint,
    pub finish_location: GeoPoint,
    /// Cumulative distance in miles (route enrichment)
    #[serde(default)]
    pub distance: f64,
    /// Cumulative duration in hours (route enrichment)
    #[serde(default)]
    pub duration: f64,
    /// Encoded route polyline (route enrichment)
    #[serde(default)]
    pub polyline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<ObjectId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projection of a plan for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub day_segment: Option<DaySegment>,
    #[serde(default)]
    pub cities: Vec<PlanCity>,
    pub stop_count: u32,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub review_count: u32,
    pub start_location: Option<GeoPoint>,
    pub finish_location: Option<GeoPoint>,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
}

impl PlanSummary {
    /// Fields fetched from the store for list endpoints.
    pub const PROJECTION: &'static [&'static str] = &[
        "user_id",
        "title",
        "images",
        "type",
        "cities",
        "stop_count",
        "rate",
        "review_count",
        "start_location",
        "finish_location",
        "distance",
        "duration",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_segment_wire_names() {
        assert_eq!(
            serde_json::to_string(&DaySegment::FullDay).unwrap(),
            "\"Full day\""
        );
        assert_eq!(
            serde_json::to_string(&DaySegment::HalfDay).unwrap(),
            "\"Half day\""
        );
        assert_eq!(serde_json::to_string(&DaySegment::Night).unwrap(), "\"Night\"");

        let parsed: DaySegment = serde_json::from_str("\"Half day\"").unwrap();
        assert_eq!(parsed, DaySegment::HalfDay);
    }
}
