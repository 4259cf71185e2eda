// SPDX-License-Identifier: MIT

//! Public category catalog routes: the list the frontend uses to offer
//! valid `categoryId` filters, and a category detail with its plans.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use bson::doc;
use serde::Serialize;
use std::sync::Arc;

use crate::db::mongo::parse_object_id;
use crate::error::{AppError, Result};
use crate::middleware::Identity;
use crate::models::Category;
use crate::pagination::{Page, PageQuery, Pagination};
use crate::services::plans::{self, PlanListItem};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{category_id}", get(get_category))
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub image_url: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: category.name,
            image_url: category.image_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryDetailResponse {
    pub category: CategoryResponse,
    pub plans: Page<PlanListItem>,
}

/// All categories, alphabetical.
async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryResponse>>> {
    let categories = state.db.list_categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// Category detail plus the plans filed under it, newest first.
async fn get_category(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(category_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CategoryDetailResponse>> {
    let pagination = Pagination::from_query(&query)?;
    let category_id = parse_object_id(&category_id)?;

    let category = state.db.find_category(category_id).await?.ok_or_else(|| {
        AppError::NotFound(format!("Category not found with the id: {}", category_id))
    })?;

    let filter = doc! { "category_id": category_id };
    let total = state.db.count_plans(filter.clone()).await?;
    let summaries = state
        .db
        .list_plan_summaries(filter, pagination.skip(), pagination.limit())
        .await?;
    let items = plans::list_items(&state.db, &identity, summaries).await?;

    Ok(Json(CategoryDetailResponse {
        category: category.into(),
        plans: Page::new(pagination, total, items),
    }))
}
