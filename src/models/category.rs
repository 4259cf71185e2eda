// SPDX-License-Identifier: MIT

//! Plan category catalog entry.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A category plans can be filed under (unique name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: &str, image_url: &str) -> Self {
        Self {
            id: None,
            name: name.trim().to_string(),
            image_url: image_url.to_string(),
            created_at: Utc::now(),
        }
    }
}
