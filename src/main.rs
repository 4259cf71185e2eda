// SPDX-License-Identifier: MIT

//! TripCraft API Server
//!
//! Travel-planning backend: trip plans built from ordered stops, city
//! grouping, bookmarks, and place/route enrichment via the Google
//! mapping APIs.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripcraft::{
    config::Config,
    db::Db,
    services::{ImageStore, MapsClient, PlaceEnricher},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting TripCraft API");

    // Connect to MongoDB and make sure the schema indexes exist
    let db = Db::connect(&config.mongodb_uri, &config.mongodb_db)
        .await
        .expect("Failed to connect to MongoDB");
    db.ensure_indexes().await.expect("Failed to create indexes");

    // Provider clients
    let maps = MapsClient::new(config.maps_api_key.clone());
    let images = ImageStore::new(
        config.image_cloud_name.clone(),
        config.image_api_key.clone(),
        config.image_api_secret.clone(),
    );
    let enricher = PlaceEnricher::new(db.clone(), maps.clone(), images);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        maps,
        enricher,
    });

    // Build router
    let app = tripcraft::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tripcraft=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
