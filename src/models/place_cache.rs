// SPDX-License-Identifier: MIT

//! Raw provider payload cache with schema-version-gated invalidation.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw place-details JSON as returned by the provider, tagged with the
/// normalization schema version in effect when it was fetched.
///
/// A stored version older than the current one triggers a re-fetch and
/// overwrite on the next request for that id, which lets the extracted
/// fields evolve without invalidating every cache entry at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPlacePayload {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// External place id (unique index)
    pub place_id: String,
    pub version: i32,
    /// Raw response body
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
