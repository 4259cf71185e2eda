// SPDX-License-Identifier: MIT

//! Map-viewport discovery route: plans and places inside a bounding box.

use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::geo::BoundingBox;
use crate::middleware::Identity;
use crate::routes::places::PlaceResponse;
use crate::services::plans::{self, PlanListItem};
use crate::AppState;

/// Caps keep a wide viewport from dumping whole collections on the map.
const PLANS_MAX_LIMIT: i64 = 20;
const PLACES_MAX_LIMIT: i64 = 40;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/all", get(get_all))
}

/// One map item, tagged by kind.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "item", rename_all = "lowercase")]
pub enum NearbyItem {
    Plan(PlanListItem),
    Place(PlaceResponse),
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub items: Vec<NearbyItem>,
}

/// Plans starting inside the bounding box (max 20) and places inside it
/// (max 40).
async fn get_all(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(bbox): Query<BoundingBox>,
) -> Result<Json<NearbyResponse>> {
    let summaries = state
        .db
        .plan_summaries_within(&bbox, PLANS_MAX_LIMIT)
        .await?;
    let plan_items = plans::list_items(&state.db, &identity, summaries).await?;

    let places = state.db.places_within(&bbox, PLACES_MAX_LIMIT).await?;

    let items = plan_items
        .into_iter()
        .map(NearbyItem::Plan)
        .chain(places.into_iter().map(|p| NearbyItem::Place(p.into())))
        .collect();

    Ok(Json(NearbyResponse { items }))
}
