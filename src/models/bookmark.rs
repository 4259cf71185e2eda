// SPDX-License-Identifier: MIT

//! Bookmark model: a user's saved reference to a plan.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `(user_id, plan_id)` join record with a compound unique index, so at
/// most one bookmark exists per user and plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub plan_id: ObjectId,
    pub created_at: DateTime<Utc>,
}
