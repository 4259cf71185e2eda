// SPDX-License-Identifier: MIT

//! Public plan browsing routes.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use bson::{doc, Document};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::mongo::parse_object_id;
use crate::error::{AppError, Result};
use crate::middleware::Identity;
use crate::pagination::{Page, PageQuery, Pagination};
use crate::services::plans::{self, PlanDetail, PlanListItem};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/{plan_id}", get(get_plan))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub city_id: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl PlanListQuery {
    fn filter(&self) -> Result<Document> {
        let mut filter = Document::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            filter.insert(
                "title",
                doc! { "$regex": regex_escape(search), "$options": "i" },
            );
        }
        if let Some(category_id) = self.category_id.as_deref().filter(|s| !s.is_empty()) {
            let category_id = bson::oid::ObjectId::parse_str(category_id)
                .map_err(|_| AppError::BadRequest(format!("Invalid category id: {}", category_id)))?;
            filter.insert("category_id", category_id);
        }
        if let Some(city_id) = self.city_id.as_deref().filter(|s| !s.is_empty()) {
            filter.insert("cities.place_id", city_id);
        }
        Ok(filter)
    }
}

/// User input goes into a `$regex`, so strip it down to a literal match.
fn regex_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// List plan summaries with search/category/city filters.
async fn list_plans(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<PlanListQuery>,
) -> Result<Json<Page<PlanListItem>>> {
    let pagination = Pagination::from_query(&PageQuery {
        page: query.page,
        size: query.size,
    })?;
    let filter = query.filter()?;

    let total = state.db.count_plans(filter.clone()).await?;
    let summaries = state
        .db
        .list_plan_summaries(filter, pagination.skip(), pagination.limit())
        .await?;
    let items = plans::list_items(&state.db, &identity, summaries).await?;

    Ok(Json(Page::new(pagination, total, items)))
}

/// Full plan detail with populated stops and cities.
async fn get_plan(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanDetail>> {
    let plan_id = parse_object_id(&plan_id)?;
    let plan = state
        .db
        .find_plan(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plan not found with the id: {}", plan_id)))?;

    let detail = plans::populate_plan(&state.db, plan, &identity).await?;
    Ok(Json(detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_escape_neutralizes_metacharacters() {
        assert_eq!(regex_escape("plain"), "plain");
        assert_eq!(regex_escape("a.b*"), "a\\.b\\*");
        assert_eq!(regex_escape("(x|y)"), "\\(x\\|y\\)");
    }

    #[test]
    fn test_filter_combines_search_and_city() {
        let query = PlanListQuery {
            search: Some("museum".to_string()),
            city_id: Some("city-1".to_string()),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert!(filter.contains_key("title"));
        assert_eq!(filter.get_str("cities.place_id").unwrap(), "city-1");
    }

    #[test]
    fn test_filter_rejects_bad_category_id() {
        let query = PlanListQuery {
            category_id: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            query.filter().unwrap_err(),
            AppError::BadRequest(_)
        ));
    }
}
