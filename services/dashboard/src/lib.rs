//! Dashboard Service Library
//!
//! Web views over the Assaba datasets: an overlay map of the vector layers,
//! heatmaps and histograms of the yearly rasters and the district attribute
//! table. Data comes from local files or from the data service.

pub mod config;
pub mod handlers;
pub mod source;
pub mod state;
pub mod views;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/layers/:name", get(handlers::layer_handler))
        .route("/rasters/:dataset/heatmap.png", get(handlers::heatmap_handler))
        .route("/rasters/:dataset/histogram.svg", get(handlers::histogram_handler))
        .route("/rasters/:dataset/summary", get(handlers::summary_handler))
        .route("/districts/table", get(handlers::districts_table_handler))
        .route("/health", get(|| async { "ok" }))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
