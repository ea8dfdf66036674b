//! ROI tool routes.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use renderer::svg_to_png;

use crate::analysis::{self, AnalysisRequest, ComparisonRequest, NO_DATA_WARNING};
use crate::error::RoiError;
use crate::page;
use crate::roi::{RoiPolygon, SessionId};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Png,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

fn error_response(err: &RoiError) -> Response {
    match err {
        RoiError::Platform(inner) => error!(error = %inner, "Analysis platform failed"),
        other => warn!(error = %other, "Request rejected"),
    }
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name.
fn content_disposition(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect();
    let mut encoded = String::with_capacity(file_name.len() * 3);
    for byte in file_name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    HeaderValue::from_str(&format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn download(content_type: &'static str, file_name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, content_disposition(file_name)),
        ],
        body,
    )
        .into_response()
}

/// GET / - map, analysis and comparison screens
pub async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> Html<String> {
    Html(page::index_page(&state.platform.name()))
}

/// POST /sessions - start a session with no ROI
pub async fn create_session_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let id = state.sessions.create().await;
    info!(session = %id, "Session created");
    (StatusCode::CREATED, Json(json!({ "id": id }))).into_response()
}

/// GET /sessions/:id/roi
pub async fn get_roi_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Response {
    match state.sessions.context(id).await {
        Ok(ctx) => Json(json!({
            "id": id,
            "roi": ctx.roi.as_ref().map(RoiPolygon::to_geometry),
            "updated_at": ctx.updated_at,
        }))
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// PUT /sessions/:id/roi - store the first polygon of a GeoJSON document
pub async fn put_roi_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(body): Json<Value>,
) -> Response {
    let polygon = match RoiPolygon::from_geojson(body) {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };
    let geometry = polygon.to_geometry();
    let bounds = polygon.bounds();

    match state.sessions.set_roi(id, polygon).await {
        Ok(()) => {
            info!(
                session = %id,
                min_lon = bounds.min_x,
                min_lat = bounds.min_y,
                max_lon = bounds.max_x,
                max_lat = bounds.max_y,
                "ROI stored"
            );
            Json(json!({ "id": id, "roi": geometry })).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// DELETE /sessions/:id/roi
pub async fn delete_roi_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Response {
    match state.sessions.clear_roi(id).await {
        Ok(cleared) => Json(json!({ "id": id, "cleared": cleared })).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /sessions/:id/analysis?format=json|csv|png
pub async fn analysis_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Query(query): Query<ExportQuery>,
    Json(request): Json<AnalysisRequest>,
) -> Response {
    let result = async {
        let (variable, range) = request.validate()?;
        let ctx = state.sessions.context(id).await?;
        analysis::run_analysis(state.platform.as_ref(), &ctx, variable, range).await
    }
    .await;

    let report = match result {
        Ok(report) => report,
        Err(e) => return error_response(&e),
    };

    match query.format {
        ExportFormat::Json => Json(report).into_response(),
        ExportFormat::Csv => match report.to_csv() {
            Ok(bytes) => download(
                "text/csv; charset=utf-8",
                &report.variable.csv_file_name(),
                bytes,
            ),
            Err(e) => error_response(&e),
        },
        ExportFormat::Png => {
            let Some(svg) = report.chart_svg.clone() else {
                return (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "warning": NO_DATA_WARNING })),
                )
                    .into_response();
            };
            let rendered = tokio::task::spawn_blocking(move || svg_to_png(&svg)).await;
            match rendered {
                Ok(Ok(png)) => download("image/png", &report.variable.png_file_name(), png),
                Ok(Err(e)) => error_response(&RoiError::Export(e.to_string())),
                Err(e) => error_response(&RoiError::Export(e.to_string())),
            }
        }
    }
}

/// POST /sessions/:id/comparison
pub async fn comparison_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<ComparisonRequest>,
) -> Response {
    let result = async {
        let (period1, period2, variables) = request.validate()?;
        let ctx = state.sessions.context(id).await?;
        analysis::run_comparison(state.platform.as_ref(), &ctx, period1, period2, &variables).await
    }
    .await;

    match result {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /health
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition("Precipitación_(CHIRPS)_timeseries.csv");
        let text = value.to_str().unwrap();
        assert!(text.starts_with("attachment; filename=\"Precipitaci_n_(CHIRPS)_timeseries.csv\""));
        assert!(text.contains("filename*=UTF-8''Precipitaci%C3%B3n_%28CHIRPS%29_timeseries.csv"));
    }
}
