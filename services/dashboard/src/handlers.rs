//! Dashboard routes.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use geojson::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use geodata_common::codec::PayloadMetadata;
use geodata_common::dataset::DEFAULT_YEAR;
use geodata_common::{DatasetId, DatasetKind, GeoDataError, RasterGrid};
use renderer::{heatmap_png, render_heatmap, ColorRamp, Histogram, DEFAULT_BINS, MAX_BINS};

use crate::source::SourceError;
use crate::state::AppState;
use crate::views;

/// Heatmaps are upscaled until their longer side reaches this many pixels.
const HEATMAP_TARGET_SIZE: usize = 600;

const MAX_HEATMAP_SCALE: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RasterQuery {
    pub year: Option<i32>,
    pub bins: Option<usize>,
}

/// JSON body for a failed dataset: `{"warning": ...}` or `{"error": ...}`.
fn failure_response(err: &SourceError) -> Response {
    match err {
        SourceError::Warning(message) => {
            (StatusCode::NOT_FOUND, Json(json!({ "warning": message }))).into_response()
        }
        SourceError::Data(e) => {
            let code = e.http_status_code();
            let status = if code >= 400 {
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            } else {
                StatusCode::BAD_GATEWAY
            };
            (status, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

fn geodata_failure(err: GeoDataError) -> Response {
    failure_response(&SourceError::Data(err))
}

/// Parse a dataset name from the URL and check its kind.
fn dataset_of_kind(name: &str, kind: DatasetKind) -> Result<DatasetId, Response> {
    match DatasetId::parse(name) {
        Ok(id) if id.kind() == kind => Ok(id),
        Ok(_) | Err(_) => Err(geodata_failure(GeoDataError::UnknownDataset(name.to_string()))),
    }
}

/// GET / - dashboard page
pub async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> Html<String> {
    Html(views::index_page(&state.catalog, &state.source.describe()))
}

/// GET /layers/:name - normalised GeoJSON of one vector layer
pub async fn layer_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let id = match dataset_of_kind(&name, DatasetKind::Vector) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.source.vector(id).await {
        Ok(collection) => Json(collection).into_response(),
        Err(e) => failure_response(&e),
    }
}

async fn load_raster(
    state: &AppState,
    name: &str,
    year: Option<i32>,
) -> Result<(DatasetId, i32, RasterGrid), Response> {
    let id = dataset_of_kind(name, DatasetKind::Raster)?;
    let year = year
        .or(state.catalog.get(id).default_year)
        .unwrap_or(DEFAULT_YEAR);

    match state.source.raster(id, year).await {
        Ok(grid) => Ok((id, year, grid)),
        Err(e) => Err(failure_response(&e)),
    }
}

/// GET /rasters/:dataset/heatmap.png?year= - Viridis heatmap
pub async fn heatmap_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<RasterQuery>,
) -> Response {
    let (id, year, grid) = match load_raster(&state, &name, query.year).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    let rendered = tokio::task::spawn_blocking(move || {
        let (rows, cols) = grid.shape();
        let values = grid.data().to_f64_vec();
        let heatmap = render_heatmap(
            &values,
            cols,
            rows,
            |v| grid.is_valid(v),
            &ColorRamp::viridis(),
        );
        let scale = (HEATMAP_TARGET_SIZE / rows.max(cols).max(1)).clamp(1, MAX_HEATMAP_SCALE);
        heatmap_png(&heatmap, scale)
    })
    .await;

    match rendered {
        Ok(Ok(png)) => {
            info!(dataset = %id, year, bytes = png.len(), "Rendered heatmap");
            ([(header::CONTENT_TYPE, "image/png")], png).into_response()
        }
        Ok(Err(e)) => {
            error!(dataset = %id, year, error = %e, "Heatmap rendering failed");
            geodata_failure(GeoDataError::RenderError(e.to_string()))
        }
        Err(e) => geodata_failure(GeoDataError::InternalError(e.to_string())),
    }
}

/// GET /rasters/:dataset/histogram.svg?year=&bins= - value histogram
pub async fn histogram_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<RasterQuery>,
) -> Response {
    let bins = query.bins.unwrap_or(DEFAULT_BINS);
    if !(1..=MAX_BINS).contains(&bins) {
        warn!(bins, "Histogram bin count out of range");
        return geodata_failure(GeoDataError::InvalidParameter {
            param: "bins".to_string(),
            message: format!("must be between 1 and {}", MAX_BINS),
        });
    }

    let (id, year, grid) = match load_raster(&state, &name, query.year).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    let values = grid.masked_values().into_iter().flatten();
    let histogram = Histogram::compute(values, bins);

    let x_label = state
        .catalog
        .get(id)
        .value_label
        .clone()
        .unwrap_or_else(|| id.name().to_string());
    let svg = histogram.to_svg(&views::histogram_title(id, year), &x_label);

    ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response()
}

#[derive(Debug, Serialize)]
pub struct RasterSummary {
    pub dataset: String,
    pub year: i32,
    pub title: String,
    pub histogram_title: String,
    /// `[rows, cols]`
    pub shape: [usize; 2],
    pub dtype: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_cells: usize,
    pub metadata: PayloadMetadata,
}

/// GET /rasters/:dataset/summary?year= - shape, dtype and band statistics
pub async fn summary_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<RasterQuery>,
) -> Response {
    let (id, year, grid) = match load_raster(&state, &name, query.year).await {
        Ok(loaded) => loaded,
        Err(response) => return response,
    };

    let (rows, cols) = grid.shape();
    let stats = grid.stats();
    Json(RasterSummary {
        dataset: id.name().to_string(),
        year,
        title: views::map_title(id, year),
        histogram_title: views::histogram_title(id, year),
        shape: [rows, cols],
        dtype: grid.profile().dtype.as_str().to_string(),
        min: stats.min,
        max: stats.max,
        mean: stats.mean,
        valid_cells: stats.valid_cells,
        metadata: PayloadMetadata::from(grid.profile()),
    })
    .into_response()
}

#[derive(Debug, Serialize)]
pub struct DistrictTable {
    pub count: usize,
    pub columns: Vec<String>,
    pub records: Vec<JsonObject>,
    /// Distinct `ADM3_EN` values in order of appearance.
    pub names: Vec<String>,
}

/// GET /districts/table - attribute records of the districts layer
pub async fn districts_table_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let collection = match state.source.vector(DatasetId::Districts).await {
        Ok(collection) => collection,
        Err(e) => return failure_response(&e),
    };

    if collection.features.is_empty() {
        warn!("Districts layer has no features");
        return failure_response(&SourceError::Warning(
            "No se encontró ninguna feature en /admin/districts.".to_string(),
        ));
    }

    let records: Vec<JsonObject> = collection
        .features
        .into_iter()
        .map(|f| f.properties.unwrap_or_default())
        .collect();

    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut names: Vec<String> = Vec::new();
    for name in records
        .iter()
        .filter_map(|r| r.get("ADM3_EN").and_then(Value::as_str))
    {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    Json(DistrictTable {
        count: records.len(),
        columns,
        records,
        names,
    })
    .into_response()
}
