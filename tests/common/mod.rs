// SPDX-License-Identifier: MIT

use bson::oid::ObjectId;
use std::sync::Arc;
use tripcraft::config::Config;
use tripcraft::db::Db;
use tripcraft::middleware::auth::create_jwt;
use tripcraft::routes::create_router;
use tripcraft::services::{ImageStore, MapsClient, PlaceEnricher};
use tripcraft::AppState;

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> Db {
    Db::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let maps = MapsClient::new(None);
    let images = ImageStore::new(None, None, None);
    let enricher = PlaceEnricher::new(db.clone(), maps.clone(), images);

    let state = Arc::new(AppState {
        config,
        db,
        maps,
        enricher,
    });

    (create_router(state.clone()), state)
}

/// Create a valid session token for an arbitrary test user.
#[allow(dead_code)]
pub fn create_test_jwt(signing_key: &[u8]) -> String {
    create_jwt(
        &ObjectId::new(),
        "Test User",
        "test@example.com",
        signing_key,
        3600,
    )
    .expect("Failed to create test JWT")
}
