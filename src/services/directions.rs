// SPDX-License-Identifier: MIT

//! Route enrichment: fetch a route along a plan's stops and recompute the
//! plan-level distance/duration aggregates.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::Plan;
use crate::services::maps::{MapsClient, RouteSummary};

const METERS_PER_MILE: f64 = 1609.34;

/// Convert meters to miles, truncated to two decimals.
pub fn meters_to_miles(meters: f64) -> f64 {
    (meters / (METERS_PER_MILE / 100.0)).floor() / 100.0
}

/// Convert route seconds to plan hours, truncated to two decimals, plus a
/// one-hour dwell allowance per stop.
pub fn route_duration_hours(seconds: i64, stop_count: u32) -> f64 {
    (seconds as f64 / 36.0).floor() / 100.0 + stop_count as f64
}

/// Fetch the route for a plan's stops and persist polyline/distance/
/// duration. The plan is left unmodified when the provider call fails.
pub async fn update_plan_direction(
    db: &Db,
    maps: &MapsClient,
    plan: &Plan,
) -> Result<RouteSummary> {
    if plan.stops.len() < 2 {
        return Err(AppError::BadRequest(
            "Plan should have at least 2 stops".to_string(),
        ));
    }

    let points: Vec<Vec<f64>> = plan.stops.iter().map(|s| s.location.clone()).collect();
    let route = maps
        .compute_route(&points)
        .await?
        .ok_or_else(|| AppError::MapsApi("No route found between stops".to_string()))?;

    let plan_id = plan
        .id
        .ok_or_else(|| AppError::Database("Plan is missing its id".to_string()))?;

    let distance = meters_to_miles(route.distance_meters);
    let duration = route_duration_hours(route.duration_seconds, plan.stop_count);
    db.set_plan_route(plan_id, &route.polyline, distance, duration)
        .await?;

    tracing::info!(
        plan_id = %plan_id,
        distance,
        duration,
        "Plan route updated"
    );

    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::models::PlanStop;
    use bson::oid::ObjectId;
    use chrono::Utc;

    fn plan_with_stops(count: usize) -> Plan {
        let stops: Vec<PlanStop> = (0..count)
            .map(|i| PlanStop {
                place_id: format!("stop-{}", i),
                name: format!("Stop {}", i),
                description: String::new(),
                image_url: String::new(),
                address: String::new(),
                location: vec![40.0 + i as f64, -73.0],
            })
            .collect();
        let now = Utc::now();
        Plan {
            id: Some(ObjectId::new()),
            user_id: ObjectId::new(),
            title: "Test plan".to_string(),
            description: String::new(),
            images: vec![],
            day_segment: None,
            cities: vec![],
            stop_count: stops.len() as u32,
            stops,
            rate: 0.0,
            review_count: 0,
            start_location: GeoPoint::from_coords(&[40.0, -73.0]),
            finish_location: GeoPoint::from_coords(&[41.0, -73.0]),
            distance: 0.0,
            duration: 0.0,
            polyline: String::new(),
            category_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The stop-count guard fires before any store or provider access:
    /// both the offline mock db and the keyless maps client would error,
    /// so a 400 here proves neither was touched.
    #[tokio::test]
    async fn test_single_stop_plan_is_rejected_before_any_io() {
        let db = Db::new_mock();
        let maps = MapsClient::new(None);
        let plan = plan_with_stops(1);

        let err = update_plan_direction(&db, &maps, &plan).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_meters_to_miles_two_decimals() {
        assert_eq!(meters_to_miles(1609.34), 1.0);
        assert_eq!(meters_to_miles(16093.4), 10.0);
        assert_eq!(meters_to_miles(0.0), 0.0);
        assert_eq!(meters_to_miles(804.67), 0.5);
        // Truncated, not rounded up
        assert_eq!(meters_to_miles(1609.0), 0.99);
    }

    #[test]
    fn test_duration_hours_includes_stop_allowance() {
        // One hour of travel plus one hour per stop
        assert_eq!(route_duration_hours(3600, 2), 3.0);
        assert_eq!(route_duration_hours(0, 5), 5.0);
        assert_eq!(route_duration_hours(1800, 0), 0.5);
    }
}
