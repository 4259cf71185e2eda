// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod bookmarks;
pub mod directions;
pub mod enrichment;
pub mod images;
pub mod maps;
pub mod plans;

pub use enrichment::PlaceEnricher;
pub use images::ImageStore;
pub use maps::{MapsClient, RouteSummary};
