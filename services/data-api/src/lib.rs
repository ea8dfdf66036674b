//! Data Service Library
//!
//! Serves the Assaba vector layers as GeoJSON FeatureCollections in
//! EPSG:4326 and the yearly rasters as base64 transfer payloads.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use handlers::{datasets, health, landing, layers};
use state::AppState;

/// Build the service router with its middleware stack.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(landing::landing_handler))
        // Vector layers
        .route("/admin/districts", get(layers::districts_handler))
        .route("/admin/region", get(layers::region_handler))
        .route("/roads", get(layers::roads_handler))
        .route("/water", get(layers::water_handler))
        // Rasters
        .route("/rasters/landcover", get(layers::landcover_handler))
        .route("/rasters/gpp", get(layers::gpp_handler))
        .route("/rasters/precip", get(layers::precip_handler))
        .route("/rasters/pop", get(layers::population_handler))
        // Catalog, health and metrics
        .route("/datasets", get(datasets::list_datasets_handler))
        .route("/health", get(health::health_handler))
        .route("/metrics", get(health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
