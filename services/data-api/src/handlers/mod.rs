//! HTTP request handlers for the data service.

pub mod datasets;
pub mod health;
pub mod landing;
pub mod layers;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use geodata_common::GeoDataError;

/// Render an error as `{"error": message}` with the error's status code.
///
/// Data-layer failures keep status 200 so clients inspect the body.
pub fn error_response(err: &GeoDataError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
