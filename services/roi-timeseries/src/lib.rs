//! ROI Time-Series Service Library
//!
//! Draw a region of interest on a map, then compute regional-mean time series
//! of MODIS GPP/NDVI or CHIRPS precipitation over it on Earth Engine, or
//! compare two periods of the same variables.

pub mod analysis;
pub mod earth_engine;
pub mod error;
pub mod handlers;
pub mod page;
pub mod platform;
pub mod roi;
pub mod state;
pub mod variables;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/sessions", post(handlers::create_session_handler))
        .route(
            "/sessions/:id/roi",
            get(handlers::get_roi_handler)
                .put(handlers::put_roi_handler)
                .delete(handlers::delete_roi_handler),
        )
        .route("/sessions/:id/analysis", post(handlers::analysis_handler))
        .route("/sessions/:id/comparison", post(handlers::comparison_handler))
        .route("/health", get(handlers::health_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
