// SPDX-License-Identifier: MIT

//! Public city detail route: the city record plus the paginated plans
//! referencing it.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use bson::doc;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::geo::coords_or_empty;
use crate::middleware::Identity;
use crate::models::{City, Viewport};
use crate::pagination::{Page, PageQuery, Pagination};
use crate::services::plans::{self, PlanListItem};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/cities/{city_id}", get(get_city))
}

/// City as returned by the API.
#[derive(Debug, Serialize)]
pub struct CityResponse {
    pub id: String,
    pub place_id: String,
    pub name: String,
    pub state: String,
    pub country: String,
    pub image_url: String,
    /// `[latitude, longitude]`, empty when unset
    pub location: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    pub plans: u32,
}

impl From<City> for CityResponse {
    fn from(city: City) -> Self {
        Self {
            id: city.id.map(|id| id.to_hex()).unwrap_or_default(),
            place_id: city.place_id,
            name: city.name,
            state: city.state,
            country: city.country,
            image_url: city.image_url,
            location: coords_or_empty(city.location.as_ref()),
            viewport: city.viewport,
            plans: city.plans,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CityDetailResponse {
    pub city: CityResponse,
    pub plans: Page<PlanListItem>,
}

/// City detail plus the plans that reference it, newest first.
async fn get_city(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(city_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CityDetailResponse>> {
    let pagination = Pagination::from_query(&query)?;

    let city = state
        .db
        .find_city(&city_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("City not found with the id: {}", city_id)))?;

    let filter = doc! { "cities.place_id": &city_id };
    let total = state.db.count_plans(filter.clone()).await?;
    let summaries = state
        .db
        .list_plan_summaries(filter, pagination.skip(), pagination.limit())
        .await?;
    let items = plans::list_items(&state.db, &identity, summaries).await?;

    Ok(Json(CityDetailResponse {
        city: city.into(),
        plans: Page::new(pagination, total, items),
    }))
}
