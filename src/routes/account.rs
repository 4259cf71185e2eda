// SPDX-License-Identifier: MIT

//! Authenticated account routes: own plans, route enrichment, bookmarks
//! and city registration. Mounted under `/account` behind the JWT
//! middleware.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use bson::doc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::mongo::parse_object_id;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::middleware::Identity;
use crate::models::Category;
use crate::pagination::{Page, PageQuery, Pagination};
use crate::routes::categories::CategoryResponse;
use crate::routes::cities::CityResponse;
use crate::services::directions::update_plan_direction;
use crate::services::plans::{self, PlanDetail, PlanInput, PlanListItem};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plans", get(list_own_plans).post(create_plan))
        .route(
            "/plans/{plan_id}",
            get(get_own_plan).put(update_plan).delete(delete_plan),
        )
        .route("/plans/{plan_id}/direction", post(plan_direction))
        .route("/bookmarks", get(list_bookmarks))
        .route(
            "/bookmarks/{plan_id}",
            post(add_bookmark).delete(remove_bookmark),
        )
        .route("/cities", post(register_city))
        .route("/categories", post(create_category))
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

// ─── Own Plans ───────────────────────────────────────────────────

/// The caller's plans, newest first.
async fn list_own_plans(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PlanListItem>>> {
    let pagination = Pagination::from_query(&query)?;
    let filter = doc! { "user_id": user.user_id };

    let total = state.db.count_plans(filter.clone()).await?;
    let summaries = state
        .db
        .list_plan_summaries(filter, pagination.skip(), pagination.limit())
        .await?;
    let identity = identity_of(&user);
    let items = plans::list_items(&state.db, &identity, summaries).await?;

    Ok(Json(Page::new(pagination, total, items)))
}

/// Create a plan; responds with the populated detail.
async fn create_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<PlanInput>,
) -> Result<(StatusCode, Json<PlanDetail>)> {
    let created = plans::create_plan(&state.db, user.user_id, input).await?;
    let detail = plans::populate_plan(&state.db, created, &identity_of(&user)).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_own_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanDetail>> {
    let plan_id = parse_object_id(&plan_id)?;
    let plan = state
        .db
        .find_plan_owned(plan_id, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan not found with the id: {}", plan_id)))?;

    let detail = plans::populate_plan(&state.db, plan, &identity_of(&user)).await?;
    Ok(Json(detail))
}

async fn update_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<String>,
    Json(input): Json<PlanInput>,
) -> Result<Json<PlanDetail>> {
    let plan_id = parse_object_id(&plan_id)?;
    let updated = plans::update_plan(&state.db, user.user_id, plan_id, input).await?;
    let detail = plans::populate_plan(&state.db, updated, &identity_of(&user)).await?;
    Ok(Json(detail))
}

/// Delete an owned plan and cascade its bookmarks.
async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    let plan_id = parse_object_id(&plan_id)?;
    let deleted = state.db.delete_plan_owned(plan_id, user.user_id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!(
            "Plan not found with the id: {}",
            plan_id
        )));
    }

    let removed = state.db.delete_plan_bookmarks(plan_id).await?;
    tracing::info!(plan_id = %plan_id, bookmarks_removed = removed, "Plan deleted");
    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Serialize)]
pub struct DirectionResponse {
    pub distance: f64,
    pub duration: f64,
    pub polyline: String,
}

/// Recompute the walking route along an owned plan's stops.
async fn plan_direction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<String>,
) -> Result<Json<DirectionResponse>> {
    let plan_id = parse_object_id(&plan_id)?;
    let plan = state
        .db
        .find_plan_owned(plan_id, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan not found with the id: {}", plan_id)))?;

    let route = update_plan_direction(&state.db, &state.maps, &plan).await?;
    Ok(Json(DirectionResponse {
        distance: crate::services::directions::meters_to_miles(route.distance_meters),
        duration: crate::services::directions::route_duration_hours(
            route.duration_seconds,
            plan.stop_count,
        ),
        polyline: route.polyline,
    }))
}

// ─── Bookmarks ───────────────────────────────────────────────────

/// The caller's bookmarked plans, paginated.
async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PlanListItem>>> {
    let pagination = Pagination::from_query(&query)?;

    let plan_ids = state.db.bookmarked_plan_ids(user.user_id).await?;
    let filter = doc! { "_id": { "$in": plan_ids } };

    let total = state.db.count_plans(filter.clone()).await?;
    let summaries = state
        .db
        .list_plan_summaries(filter, pagination.skip(), pagination.limit())
        .await?;
    // Everything here is bookmarked by construction.
    let items = summaries
        .into_iter()
        .map(|summary| PlanListItem::new(summary, true))
        .collect();

    Ok(Json(Page::new(pagination, total, items)))
}

/// Bookmark a plan. The plan must exist; bookmarking twice trips the
/// compound unique index.
async fn add_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<String>,
) -> Result<(StatusCode, Json<SuccessResponse>)> {
    let plan_id = parse_object_id(&plan_id)?;
    state
        .db
        .find_plan(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan not found with the id: {}", plan_id)))?;

    state.db.insert_bookmark(user.user_id, plan_id).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse { success: true })))
}

async fn remove_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plan_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    let plan_id = parse_object_id(&plan_id)?;
    let removed = state.db.delete_bookmark(user.user_id, plan_id).await?;
    if !removed {
        return Err(AppError::NotFound(format!(
            "Bookmark not found for the plan: {}",
            plan_id
        )));
    }
    Ok(Json(SuccessResponse { success: true }))
}

// ─── Cities ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterCityRequest {
    pub place_id: String,
}

/// Register (enrich and upsert) a city by its external place id.
async fn register_city(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterCityRequest>,
) -> Result<(StatusCode, Json<CityResponse>)> {
    if payload.place_id.is_empty() {
        return Err(AppError::BadRequest("place_id is required".to_string()));
    }
    let city = state.enricher.get_city(&payload.place_id).await?;
    Ok((StatusCode::CREATED, Json(city.into())))
}

// ─── Categories ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: String,
    #[serde(default)]
    pub image_url: String,
}

/// Add a category to the catalog. A duplicate name surfaces through
/// the unique index as a 400 naming the field.
async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let category = Category::new(&payload.name, &payload.image_url);
    let created = state.db.insert_category(&category).await?;

    tracing::info!(name = %created.name, "Category created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

fn identity_of(user: &AuthUser) -> Identity {
    Identity::Authenticated {
        user_id: user.user_id,
        name: user.name.clone(),
        email: user.email.clone(),
    }
}
