//! Landing route.

use axum::Json;
use serde::Serialize;

use crate::metrics;

#[derive(Debug, Serialize)]
pub struct LandingResponse {
    pub message: String,
}

/// GET / - welcome message
pub async fn landing_handler() -> Json<LandingResponse> {
    metrics::record_request("landing");
    Json(LandingResponse {
        message: "Hola desde el servicio de datos de Assaba!".to_string(),
    })
}
