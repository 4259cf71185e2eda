// SPDX-License-Identifier: MIT

//! Conversions between the API's `[latitude, longitude]` pairs and the
//! stored GeoJSON `Point` representation.
//!
//! GeoJSON stores coordinates in `[longitude, latitude]` (x, y) order while
//! the API contract uses `[latitude, longitude]`, so both directions swap.

use bson::{doc, Bson};
use serde::{Deserialize, Serialize};

/// A GeoJSON `Point` as persisted in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]`
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    /// Build a point from an API-order `[latitude, longitude]` pair.
    ///
    /// Degenerate input (fewer than two values) maps to `[0, 0]` rather
    /// than failing.
    pub fn from_coords(coords: &[f64]) -> Self {
        let (lat, lng) = if coords.len() < 2 {
            (0.0, 0.0)
        } else {
            (coords[0], coords[1])
        };
        Self {
            kind: "Point".to_string(),
            coordinates: vec![lng, lat],
        }
    }

    /// Return the point in API order `[latitude, longitude]`.
    pub fn coords(&self) -> Vec<f64> {
        if self.coordinates.len() < 2 {
            return vec![];
        }
        vec![self.coordinates[1], self.coordinates[0]]
    }
}

/// Convert an optional stored point to API coordinates.
///
/// An absent point maps to an empty sequence, not an error.
pub fn coords_or_empty(point: Option<&GeoPoint>) -> Vec<f64> {
    point.map(GeoPoint::coords).unwrap_or_default()
}

/// A latitude/longitude bounding box from query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundingBox {
    pub latmin: f64,
    pub lngmin: f64,
    pub latmax: f64,
    pub lngmax: f64,
}

impl BoundingBox {
    /// Build the closed GeoJSON polygon used for `$geoWithin` queries.
    pub fn to_polygon(&self) -> Bson {
        let ring = vec![
            vec![self.lngmin, self.latmin],
            vec![self.lngmin, self.latmax],
            vec![self.lngmax, self.latmax],
            vec![self.lngmax, self.latmin],
            // close the square
            vec![self.lngmin, self.latmin],
        ];
        Bson::Document(doc! {
            "type": "Polygon",
            "coordinates": [ring],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let pair = vec![37.7749, -122.4194];
        let point = GeoPoint::from_coords(&pair);
        assert_eq!(point.coordinates, vec![-122.4194, 37.7749]);
        assert_eq!(point.coords(), pair);
    }

    #[test]
    fn test_degenerate_write_maps_to_origin() {
        let point = GeoPoint::from_coords(&[1.0]);
        assert_eq!(point.coordinates, vec![0.0, 0.0]);
        let point = GeoPoint::from_coords(&[]);
        assert_eq!(point.coordinates, vec![0.0, 0.0]);
    }

    #[test]
    fn test_absent_point_reads_as_empty() {
        assert!(coords_or_empty(None).is_empty());
    }

    #[test]
    fn test_bounding_box_polygon_is_closed() {
        let bbox = BoundingBox {
            latmin: 1.0,
            lngmin: 2.0,
            latmax: 3.0,
            lngmax: 4.0,
        };
        let polygon = bbox.to_polygon();
        let doc = polygon.as_document().unwrap();
        let rings = doc.get_array("coordinates").unwrap();
        let ring = rings[0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }
}
