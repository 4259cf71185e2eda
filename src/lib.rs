// SPDX-License-Identifier: MIT

//! TripCraft: travel-planning REST API.
//!
//! This crate provides the backend API for authoring trip plans out of
//! ordered stops, grouping them by city, bookmarking, and enriching
//! places and routes through the Google mapping APIs.

pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;

use config::Config;
use db::Db;
use services::{MapsClient, PlaceEnricher};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub maps: MapsClient,
    pub enricher: PlaceEnricher,
}
