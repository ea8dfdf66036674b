//! ROI tool routes against an in-memory analysis platform.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use geodata_common::BoundingBox;
use roi_timeseries::error::PlatformError;
use roi_timeseries::platform::{AnalysisPlatform, RawObservation, SeriesQuery};
use roi_timeseries::roi::{default_roi_bounds, DEFAULT_ROI_WARNING};
use roi_timeseries::state::AppState;
use roi_timeseries::variables::Variable;

/// Returns one observation per month of the queried range, optionally
/// empty for some variables, and remembers every query.
#[derive(Default)]
struct FakePlatform {
    queries: Mutex<Vec<SeriesQuery>>,
    empty: Vec<Variable>,
    fail: bool,
}

#[async_trait]
impl AnalysisPlatform for FakePlatform {
    async fn regional_means(&self, query: &SeriesQuery) -> Result<Vec<RawObservation>, PlatformError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(PlatformError::Status {
                status: 403,
                body: "Permission denied".to_string(),
            });
        }
        if self.empty.contains(&query.variable) {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        let mut date = query.range.start;
        let mut i = 0.0;
        while date <= query.range.end {
            let ms = date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_millis();
            out.push(RawObservation::new(ms, Some(i)));
            out.push(RawObservation::new(ms + 1, None));
            i += 1.0;
            date = date.checked_add_months(chrono::Months::new(1)).unwrap();
        }
        // platform order is arbitrary
        out.reverse();
        Ok(out)
    }

    fn name(&self) -> String {
        "fake".to_string()
    }
}

fn app(platform: Arc<FakePlatform>) -> Router {
    roi_timeseries::build_router(Arc::new(AppState::new(platform)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn json_of(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn new_session(app: &Router) -> String {
    let (status, body) = json_of(app, "POST", "/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

fn drawn_square() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-12.0, 16.0], [-11.0, 16.0], [-11.0, 17.0], [-12.0, 17.0], [-12.0, 16.0]]]
            }
        }]
    })
}

#[tokio::test]
async fn analysis_without_roi_uses_default_region() {
    let platform = Arc::new(FakePlatform::default());
    let app = app(platform.clone());
    let id = new_session(&app).await;

    let (status, report) = json_of(
        &app,
        "POST",
        &format!("/sessions/{id}/analysis"),
        Some(json!({"start": "2010-01-01", "end": "2012-12-31", "variable": "GPP (MODIS)"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["variable"], "gpp");
    assert_eq!(report["roi_source"], "default");
    assert_eq!(report["warnings"], json!([DEFAULT_ROI_WARNING]));
    assert_eq!(report["points"].as_array().unwrap().len(), 36);
    assert_eq!(report["points"][0]["date"], "2010-01-01");
    assert_eq!(report["points"][0]["value"], 0.0);
    assert!(report["chart_svg"].as_str().unwrap().contains("Serie de Tiempo: GPP (MODIS)"));

    let queries = platform.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].variable, Variable::Gpp);
    assert_eq!(queries[0].roi.bounds(), default_roi_bounds());
}

#[tokio::test]
async fn drawn_roi_is_used_and_cleared() {
    let platform = Arc::new(FakePlatform::default());
    let app = app(platform.clone());
    let id = new_session(&app).await;

    let (status, body) = json_of(&app, "PUT", &format!("/sessions/{id}/roi"), Some(drawn_square())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roi"]["type"], "Polygon");

    let (_, body) = json_of(&app, "GET", &format!("/sessions/{id}/roi"), None).await;
    assert_eq!(body["roi"]["coordinates"][0][0], json!([-12.0, 16.0]));

    let (_, report) = json_of(
        &app,
        "POST",
        &format!("/sessions/{id}/analysis"),
        Some(json!({"start": "2015-01-01", "end": "2015-06-30", "variable": "ndvi"})),
    )
    .await;
    assert_eq!(report["roi_source"], "drawn");
    assert_eq!(report["warnings"], json!([]));
    assert_eq!(
        platform.queries.lock().unwrap()[0].roi.bounds(),
        BoundingBox::new(-12.0, 16.0, -11.0, 17.0)
    );

    let (_, body) = json_of(&app, "DELETE", &format!("/sessions/{id}/roi"), None).await;
    assert_eq!(body["cleared"], true);
    let (_, body) = json_of(&app, "GET", &format!("/sessions/{id}/roi"), None).await;
    assert!(body["roi"].is_null());
}

#[tokio::test]
async fn inverted_range_is_rejected_before_querying() {
    let platform = Arc::new(FakePlatform::default());
    let app = app(platform.clone());
    let id = new_session(&app).await;

    let (status, body) = json_of(
        &app,
        "POST",
        &format!("/sessions/{id}/analysis"),
        Some(json!({"start": "2016-01-01", "end": "2010-01-01", "variable": "gpp"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "La fecha de inicio debe ser anterior a la fecha de fin.");
    assert!(platform.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_series_warns_without_chart() {
    let platform = Arc::new(FakePlatform {
        empty: vec![Variable::Precipitation],
        ..Default::default()
    });
    let app = app(platform);
    let id = new_session(&app).await;

    let (status, report) = json_of(
        &app,
        "POST",
        &format!("/sessions/{id}/analysis"),
        Some(json!({"start": "2010-01-01", "end": "2010-12-31", "variable": "precipitation"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(report["chart_svg"].is_null());
    assert_eq!(
        report["warnings"][1],
        "No se encontraron datos para el rango de fechas y la ROI seleccionada."
    );
}

#[tokio::test]
async fn csv_export_has_header_and_file_name() {
    let app = app(Arc::new(FakePlatform::default()));
    let id = new_session(&app).await;

    let request = Request::builder()
        .method("POST")
        .uri(format!("/sessions/{id}/analysis?format=csv"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"start": "2010-01-01", "end": "2010-03-31", "variable": "gpp"}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("filename=\"GPP_(MODIS)_timeseries.csv\""));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(text, "date,value\n2010-01-01,0\n2010-02-01,1\n2010-03-01,2\n");
}

#[tokio::test]
async fn comparison_defaults_to_gpp_and_ndvi() {
    let platform = Arc::new(FakePlatform {
        empty: vec![Variable::Ndvi],
        ..Default::default()
    });
    let app = app(platform.clone());
    let id = new_session(&app).await;

    let (status, report) =
        json_of(&app, "POST", &format!("/sessions/{id}/comparison"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["period1"]["start"], "2010-01-01");
    assert_eq!(report["period2"]["end"], "2020-12-31");

    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["variable"], "gpp");
    let svg = results[0]["chart_svg"].as_str().unwrap();
    assert!(svg.contains("Período 1"));
    assert!(svg.contains("Período 2"));
    assert!(results[0]["warning"].is_null());

    assert!(results[1]["chart_svg"].is_null());
    assert_eq!(results[1]["warning"], "No se encontraron datos para NDVI (MODIS).");

    let queries = platform.queries.lock().unwrap();
    assert_eq!(queries.len(), 4);
    assert_eq!(
        queries[1].range.start,
        NaiveDate::from_ymd_opt(2016, 1, 1).unwrap()
    );
}

#[tokio::test]
async fn comparison_rejects_three_variables() {
    let app = app(Arc::new(FakePlatform::default()));
    let id = new_session(&app).await;

    let (status, body) = json_of(
        &app,
        "POST",
        &format!("/sessions/{id}/comparison"),
        Some(json!({"variables": ["gpp", "ndvi", "precipitation"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("At most 2"));
}

#[tokio::test]
async fn platform_failure_is_generic_error() {
    let app = app(Arc::new(FakePlatform {
        fail: true,
        ..Default::default()
    }));
    let id = new_session(&app).await;

    let (status, body) = json_of(
        &app,
        "POST",
        &format!("/sessions/{id}/analysis"),
        Some(json!({"variable": "gpp"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Error en el análisis. Revisa los logs.");
}

#[tokio::test]
async fn unknown_session_and_bad_geometry() {
    let app = app(Arc::new(FakePlatform::default()));

    let (status, _) = json_of(
        &app,
        "GET",
        "/sessions/6f1c2f4e-8a4b-4f55-9a53-0d7b1a2c3d4e/roi",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let id = new_session(&app).await;
    let (status, _) = json_of(
        &app,
        "PUT",
        &format!("/sessions/{id}/roi"),
        Some(json!({"type": "Point", "coordinates": [0.0, 0.0]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn index_and_health() {
    let app = app(Arc::new(FakePlatform::default()));

    let (status, bytes) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    let page = String::from_utf8(bytes).unwrap();
    assert!(page.contains("Análisis de Series de Tiempo por ROI"));
    assert!(page.contains("\"platform\":\"fake\""));

    let (status, body) = json_of(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
