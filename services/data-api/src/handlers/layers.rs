//! Vector layer and raster routes.
//!
//! Every request resolves its file from the catalog, reads it on the blocking
//! pool and returns either the data or `{"error": ...}` with status 200.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use geodata_access::{read_raster, read_vector, AccessError};
use geodata_common::{codec, DatasetId, GeoDataError};

use super::error_response;
use crate::metrics;
use crate::state::AppState;

/// Query parameters of the raster routes.
#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

/// Read the file behind `id` with `reader` on the blocking pool.
///
/// A missing file maps to [`GeoDataError::FileNotFound`] carrying the
/// `/`-separated path relative to the data root.
async fn load<T, F>(
    state: &AppState,
    id: DatasetId,
    year: Option<i32>,
    reader: F,
) -> Result<T, GeoDataError>
where
    T: Send + 'static,
    F: FnOnce(&Path) -> Result<T, AccessError> + Send + 'static,
{
    let def = state.catalog.get(id);
    let relative = def.relative_path(year);
    let path = def.resolve(&state.data_root, year);

    let started = Instant::now();
    let result = tokio::task::spawn_blocking(move || reader(&path))
        .await
        .map_err(|e| GeoDataError::InternalError(format!("load task failed: {}", e)))?;
    metrics::record_load_duration(id.name(), started.elapsed());

    match result {
        Ok(value) => Ok(value),
        Err(AccessError::NotFound(_)) => {
            warn!(dataset = %id, path = %relative, "Dataset file not found");
            metrics::record_missing_file(id.name());
            Err(GeoDataError::FileNotFound(relative))
        }
        Err(e) => {
            error!(dataset = %id, path = %relative, error = %e, "Failed to load dataset");
            metrics::record_read_error(id.name());
            Err(e.into())
        }
    }
}

async fn vector_response(state: &AppState, id: DatasetId) -> Response {
    match load(state, id, None, read_vector).await {
        Ok(layer) => {
            info!(dataset = %id, features = layer.len(), "Serving vector layer");
            Json(layer.collection).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn raster_response(state: &AppState, id: DatasetId, year: Option<i32>) -> Response {
    match load(state, id, year, read_raster).await {
        Ok(grid) => {
            let (rows, cols) = grid.shape();
            info!(dataset = %id, year = ?year, rows, cols, "Serving raster");
            Json(codec::encode(&grid)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET /admin/districts
pub async fn districts_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    metrics::record_request("districts");
    vector_response(&state, DatasetId::Districts).await
}

/// GET /admin/region
pub async fn region_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    metrics::record_request("region");
    vector_response(&state, DatasetId::Region).await
}

/// GET /roads
pub async fn roads_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    metrics::record_request("roads");
    vector_response(&state, DatasetId::Roads).await
}

/// GET /water
pub async fn water_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    metrics::record_request("water");
    vector_response(&state, DatasetId::Water).await
}

/// GET /rasters/landcover?year=
pub async fn landcover_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<YearQuery>,
) -> Response {
    metrics::record_request("landcover");
    raster_response(&state, DatasetId::Landcover, query.year).await
}

/// GET /rasters/gpp?year=
pub async fn gpp_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<YearQuery>,
) -> Response {
    metrics::record_request("gpp");
    raster_response(&state, DatasetId::Gpp, query.year).await
}

/// GET /rasters/precip?year=
pub async fn precip_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<YearQuery>,
) -> Response {
    metrics::record_request("precip");
    raster_response(&state, DatasetId::Precip, query.year).await
}

/// GET /rasters/pop?year=
pub async fn population_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<YearQuery>,
) -> Response {
    metrics::record_request("population");
    raster_response(&state, DatasetId::Population, query.year).await
}
