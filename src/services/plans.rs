// SPDX-License-Identifier: MIT

//! Plan orchestration: the aggregate read path (populate embedded stop and
//! city references from the caches) and the create/update write path.
//!
//! Plans embed lightweight copies of their stops and cities; the detail
//! records live in the `places` and `cities` collections keyed by external
//! id. Reads batch-fetch those details, reorder them to the plan's authored
//! sequence and merge them over the embedded copies. Writes resolve raw
//! stops into new place records before the plan itself is stored.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::geo::{coords_or_empty, GeoPoint};
use crate::middleware::Identity;
use crate::models::{City, DaySegment, Place, Plan, PlanCity, PlanStop, PlanSummary};
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

// ─── Request payloads ────────────────────────────────────────────

/// A stop as submitted by the client. A missing `place_id` marks a raw
/// user-authored stop that gets its own place record on write.
#[derive(Debug, Clone, Deserialize)]
pub struct StopInput {
    #[serde(default)]
    pub place_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub address: String,
    /// `[latitude, longitude]`
    #[serde(default)]
    pub location: Vec<f64>,
}

/// Create/update payload for a plan.
#[derive(Debug, Deserialize, Validate)]
pub struct PlanInput {
    #[validate(length(min = 3, max = 200, message = "title must be 3 to 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "description must be at most 255 characters"))]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(rename = "type")]
    pub day_segment: Option<DaySegment>,
    #[serde(default)]
    pub cities: Vec<PlanCity>,
    #[serde(default)]
    pub stops: Vec<StopInput>,
    #[serde(default)]
    pub category_id: Option<String>,
}

// ─── Response shapes ─────────────────────────────────────────────

/// List-endpoint item: a plan summary with API-order coordinates and the
/// requesting identity's bookmark flag.
#[derive(Debug, Serialize)]
pub struct PlanListItem {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub images: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub day_segment: Option<DaySegment>,
    pub cities: Vec<PlanCity>,
    pub stop_count: u32,
    pub rate: f64,
    pub review_count: u32,
    /// `[latitude, longitude]`, empty when unset
    pub start_location: Vec<f64>,
    pub finish_location: Vec<f64>,
    pub distance: f64,
    pub duration: f64,
    pub is_bookmarked: bool,
}

impl PlanListItem {
    pub fn new(summary: PlanSummary, is_bookmarked: bool) -> Self {
        Self {
            id: summary.id.to_hex(),
            user_id: summary.user_id.to_hex(),
            title: summary.title,
            images: summary.images,
            day_segment: summary.day_segment,
            cities: summary.cities,
            stop_count: summary.stop_count,
            rate: summary.rate,
            review_count: summary.review_count,
            start_location: coords_or_empty(summary.start_location.as_ref()),
            finish_location: coords_or_empty(summary.finish_location.as_ref()),
            distance: summary.distance,
            duration: summary.duration,
            is_bookmarked,
        }
    }
}

/// A stop populated from its cached place record.
#[derive(Debug, Serialize)]
pub struct StopDetail {
    pub place_id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub address: String,
    /// `[latitude, longitude]`
    pub location: Vec<f64>,
    pub category: String,
    pub icon_url: String,
    pub icon_background: String,
    pub rating: f64,
    pub user_rating_count: u32,
    pub directions_uri: String,
    pub place_uri: String,
}

/// A city populated from its cached city record.
#[derive(Debug, Serialize)]
pub struct CityDetail {
    pub place_id: String,
    pub name: String,
    pub state: String,
    pub country: String,
    pub image_url: String,
    /// `[latitude, longitude]`, empty when unset
    pub location: Vec<f64>,
}

/// Full plan detail returned by the read path.
#[derive(Debug, Serialize)]
pub struct PlanDetail {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub day_segment: Option<DaySegment>,
    pub cities: Vec<CityDetail>,
    pub stops: Vec<StopDetail>,
    pub stop_count: u32,
    pub rate: f64,
    pub review_count: u32,
    pub start_location: Vec<f64>,
    pub finish_location: Vec<f64>,
    pub distance: f64,
    pub duration: f64,
    pub polyline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub is_bookmarked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── Read path ───────────────────────────────────────────────────

/// Populate a plan's embedded stop and city references from the caches and
/// attach the bookmark flag for `identity`.
///
/// Details are batch-fetched unordered and then reordered to the plan's
/// authored sequence; stored detail fields take precedence over the
/// embedded copies, which only fill gaps.
pub async fn populate_plan(db: &Db, plan: Plan, identity: &Identity) -> Result<PlanDetail> {
    let plan_id = plan
        .id
        .ok_or_else(|| AppError::Database("Plan is missing its id".to_string()))?;

    let stop_ids: Vec<String> = plan.stops.iter().map(|s| s.place_id.clone()).collect();
    let city_ids: Vec<String> = plan.cities.iter().map(|c| c.place_id.clone()).collect();

    let places = db.find_places_by_ids(&stop_ids).await?;
    let cities = db.find_cities_by_ids(&city_ids).await?;

    let stops = merge_stops(&plan.stops, places);
    let cities = merge_cities(&plan.cities, cities);

    let is_bookmarked = match identity.user_id() {
        Some(user_id) => !db.bookmarked_ids_among(user_id, &[plan_id]).await?.is_empty(),
        None => false,
    };

    Ok(PlanDetail {
        id: plan_id.to_hex(),
        user_id: plan.user_id.to_hex(),
        title: plan.title,
        description: plan.description,
        images: plan.images,
        day_segment: plan.day_segment,
        cities,
        stops,
        stop_count: plan.stop_count,
        rate: plan.rate,
        review_count: plan.review_count,
        start_location: plan.start_location.coords(),
        finish_location: plan.finish_location.coords(),
        distance: plan.distance,
        duration: plan.duration,
        polyline: plan.polyline,
        category_id: plan.category_id.map(|id| id.to_hex()),
        is_bookmarked,
        created_at: plan.created_at,
        updated_at: plan.updated_at,
    })
}

/// Attach bookmark flags to a page of summaries with one batch query.
pub async fn list_items(
    db: &Db,
    identity: &Identity,
    summaries: Vec<PlanSummary>,
) -> Result<Vec<PlanListItem>> {
    let bookmarked = super::bookmarks::bookmarked_ids(db, identity, &summaries).await?;
    Ok(summaries
        .into_iter()
        .map(|summary| {
            let flagged = bookmarked.contains(&summary.id);
            PlanListItem::new(summary, flagged)
        })
        .collect())
}

/// Reorder fetched place details to the authored stop sequence and merge
/// them over the embedded copies.
fn merge_stops(authored: &[PlanStop], places: Vec<Place>) -> Vec<StopDetail> {
    let mut by_id: HashMap<String, Place> = places
        .into_iter()
        .map(|place| (place.place_id.clone(), place))
        .collect();

    authored
        .iter()
        .map(|stop| match by_id.remove(&stop.place_id) {
            Some(place) => StopDetail {
                place_id: place.place_id,
                name: non_empty_or(place.name, &stop.name),
                description: non_empty_or(place.summary, &stop.description),
                image_url: non_empty_or(place.image_url, &stop.image_url),
                address: non_empty_or(place.address, &stop.address),
                location: place.location.coords(),
                category: place.category,
                icon_url: place.icon_url,
                icon_background: place.icon_background,
                rating: place.rating,
                user_rating_count: place.user_rating_count,
                directions_uri: place.directions_uri,
                place_uri: place.place_uri,
            },
            None => StopDetail {
                place_id: stop.place_id.clone(),
                name: stop.name.clone(),
                description: stop.description.clone(),
                image_url: stop.image_url.clone(),
                address: stop.address.clone(),
                location: stop.location.clone(),
                category: String::new(),
                icon_url: String::new(),
                icon_background: String::new(),
                rating: 0.0,
                user_rating_count: 0,
                directions_uri: String::new(),
                place_uri: String::new(),
            },
        })
        .collect()
}

fn merge_cities(authored: &[PlanCity], cities: Vec<City>) -> Vec<CityDetail> {
    let mut by_id: HashMap<String, City> = cities
        .into_iter()
        .map(|city| (city.place_id.clone(), city))
        .collect();

    authored
        .iter()
        .map(|reference| match by_id.remove(&reference.place_id) {
            Some(city) => CityDetail {
                place_id: city.place_id,
                name: non_empty_or(city.name, &reference.name),
                state: city.state,
                country: city.country,
                image_url: city.image_url,
                location: coords_or_empty(city.location.as_ref()),
            },
            None => CityDetail {
                place_id: reference.place_id.clone(),
                name: reference.name.clone(),
                state: String::new(),
                country: String::new(),
                image_url: String::new(),
                location: vec![],
            },
        })
        .collect()
}

fn non_empty_or(detail: String, embedded: &str) -> String {
    if detail.is_empty() {
        embedded.to_string()
    } else {
        detail
    }
}

// ─── Write path ──────────────────────────────────────────────────

/// Create a plan for `user_id`.
///
/// Raw stops (no place id) become new place records, bulk-inserted before
/// the plan; referenced cities are bulk-upserted with their plans counter
/// bumped. Start/finish locations and `stop_count` are derived, never
/// client-settable.
pub async fn create_plan(db: &Db, user_id: ObjectId, input: PlanInput) -> Result<Plan> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if input.stops.is_empty() {
        return Err(AppError::BadRequest(
            "Plan should have at least one stop".to_string(),
        ));
    }
    let category_id = parse_category_id(input.category_id.as_deref())?;

    let (stops, new_places) = resolve_stops(&input.stops);
    db.insert_places(&new_places).await?;
    db.register_plan_cities(&input.cities).await?;

    let (start_location, finish_location) = endpoint_locations(&stops);
    let now = Utc::now();
    let plan = Plan {
        id: None,
        user_id,
        title: input.title,
        description: input.description,
        images: input.images,
        day_segment: input.day_segment,
        cities: input.cities,
        stop_count: stops.len() as u32,
        stops,
        rate: 0.0,
        review_count: 0,
        start_location,
        finish_location,
        distance: 0.0,
        duration: 0.0,
        polyline: String::new(),
        category_id,
        created_at: now,
        updated_at: now,
    };

    let created = db.insert_plan(&plan).await?;
    tracing::info!(
        plan_id = ?created.id,
        user_id = %user_id,
        stops = created.stop_count,
        "Plan created"
    );
    Ok(created)
}

/// Update a plan owned by `user_id`, returning the updated document.
///
/// New raw stops still get place records, but city plan counters are not
/// touched on edit.
pub async fn update_plan(
    db: &Db,
    user_id: ObjectId,
    plan_id: ObjectId,
    input: PlanInput,
) -> Result<Plan> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if input.stops.is_empty() {
        return Err(AppError::BadRequest(
            "Plan should have at least one stop".to_string(),
        ));
    }
    let category_id = parse_category_id(input.category_id.as_deref())?;

    let (stops, new_places) = resolve_stops(&input.stops);
    db.insert_places(&new_places).await?;

    let (start_location, finish_location) = endpoint_locations(&stops);
    let mut fields = bson::doc! {
        "title": input.title,
        "description": input.description,
        "images": to_bson(&input.images)?,
        "cities": to_bson(&input.cities)?,
        "stops": to_bson(&stops)?,
        "stop_count": stops.len() as u32,
        "start_location": to_bson(&start_location)?,
        "finish_location": to_bson(&finish_location)?,
    };
    match input.day_segment {
        Some(segment) => {
            fields.insert("type", to_bson(&segment)?);
        }
        None => {
            fields.insert("type", bson::Bson::Null);
        }
    }
    if let Some(category_id) = category_id {
        fields.insert("category_id", category_id);
    }

    let updated = db
        .update_plan_owned(plan_id, user_id, fields)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan not found with the id: {}", plan_id)))?;
    Ok(updated)
}

/// Split submitted stops into embedded copies plus the new place records
/// raw stops require. The embedded copy always carries a place id.
fn resolve_stops(inputs: &[StopInput]) -> (Vec<PlanStop>, Vec<Place>) {
    let mut stops = Vec::with_capacity(inputs.len());
    let mut new_places = Vec::new();

    for input in inputs {
        let place_id = match input.place_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let place = Place::from_raw_stop(
                    &input.name,
                    &input.image_url,
                    &input.address,
                    &input.location,
                );
                let id = place.place_id.clone();
                new_places.push(place);
                id
            }
        };
        stops.push(PlanStop {
            place_id,
            name: input.name.clone(),
            description: input.description.clone(),
            image_url: input.image_url.clone(),
            address: input.address.clone(),
            location: input.location.clone(),
        });
    }

    (stops, new_places)
}

/// Start and finish points derived from the first and last stop.
fn endpoint_locations(stops: &[PlanStop]) -> (GeoPoint, GeoPoint) {
    let first = stops.first().map(|s| s.location.as_slice()).unwrap_or(&[]);
    let last = stops.last().map(|s| s.location.as_slice()).unwrap_or(&[]);
    (GeoPoint::from_coords(first), GeoPoint::from_coords(last))
}

fn parse_category_id(raw: Option<&str>) -> Result<Option<ObjectId>> {
    match raw.filter(|id| !id.is_empty()) {
        Some(id) => ObjectId::parse_str(id)
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid category id: {}", id))),
        None => Ok(None),
    }
}

fn to_bson<T: Serialize>(value: &T) -> Result<bson::Bson> {
    bson::to_bson(value).map_err(|e| AppError::Database(format!("Failed to encode plan: {}", e)))
}
