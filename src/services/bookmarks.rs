// SPDX-License-Identifier: MIT

//! Bookmark flag aggregation for plan lists.

use crate::db::Db;
use crate::error::Result;
use crate::middleware::Identity;
use crate::models::PlanSummary;
use bson::oid::ObjectId;
use std::collections::HashSet;

/// The set of `plans`' ids bookmarked by the requesting identity.
///
/// Anonymous requests resolve to an empty set with no I/O; authenticated
/// requests issue exactly one batch query regardless of list size.
pub async fn bookmarked_ids(
    db: &Db,
    identity: &Identity,
    plans: &[PlanSummary],
) -> Result<HashSet<ObjectId>> {
    let Some(user_id) = identity.user_id() else {
        return Ok(HashSet::new());
    };

    let plan_ids: Vec<ObjectId> = plans.iter().map(|plan| plan.id).collect();
    db.bookmarked_ids_among(user_id, &plan_ids).await
}
