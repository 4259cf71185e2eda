// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod bookmark;
pub mod category;
pub mod city;
pub mod place;
pub mod place_cache;
pub mod plan;
pub mod user;

pub use bookmark::Bookmark;
pub use category::Category;
pub use city::{City, Viewport};
pub use place::Place;
pub use place_cache::CachedPlacePayload;
pub use plan::{DaySegment, Plan, PlanCity, PlanStop, PlanSummary};
pub use user::User;
