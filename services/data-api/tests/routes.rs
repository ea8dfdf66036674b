//! In-process tests of the data service routes.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use data_api::config::DataApiConfig;
use data_api::state::AppState;
use geodata_common::codec::{decode, TransferPayload};
use geodata_common::dataset::{CatalogOverrides, DatasetOverride};
use geodata_common::{DatasetId, Dtype, RasterData};
use test_utils::{
    assaba_districts, assert_coords_approx_eq, create_landcover_grid, create_precipitation_grid,
    layout, FeatureFixture, RasterFixture, TempDataRoot,
};

const DISTRICTS_GEOJSON: &str = "Admin_layers/Assaba_Districts_layer.geojson";

fn app(root: &TempDataRoot) -> Router {
    let mut overrides = CatalogOverrides::default();
    overrides.datasets.insert(
        DatasetId::Districts,
        DatasetOverride {
            path_template: Some(DISTRICTS_GEOJSON.to_string()),
            ..Default::default()
        },
    );
    let mut config = DataApiConfig::new(root.path());
    config.catalog = config.catalog.with_overrides(overrides);
    data_api::build_router(Arc::new(AppState::new(config, None)))
}

fn app_with_builtin_catalog(root: &TempDataRoot) -> Router {
    data_api::build_router(Arc::new(AppState::new(DataApiConfig::new(root.path()), None)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn landing_returns_message() {
    let root = TempDataRoot::new();
    let (status, body) = get(app(&root), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn missing_districts_file_is_reported_in_body() {
    let root = TempDataRoot::new();
    let (status, body) = get(app_with_builtin_catalog(&root), "/admin/districts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"error": "No se encontró Admin_layers/Assaba_Districts_layer.shp"})
    );
}

#[tokio::test]
async fn missing_raster_year_is_reported_in_body() {
    let root = TempDataRoot::new();
    let (status, body) = get(app(&root), "/rasters/pop?year=2005").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"error": "No se encontró Gridded_Population_Density_Data/mrt_pd_2005_1km.tif"})
    );
}

#[tokio::test]
async fn districts_are_served_as_feature_collection() {
    let root = TempDataRoot::new();
    root.add_geojson(DISTRICTS_GEOJSON, Some(4326), &assaba_districts());

    let (status, body) = get(app(&root), "/admin/districts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "FeatureCollection");

    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 3);
    let names: Vec<&str> = features
        .iter()
        .filter_map(|f| f["properties"]["ADM3_EN"].as_str())
        .collect();
    assert!(names.contains(&"Kiffa"));
    assert!(names.contains(&"Kankossa"));
}

#[tokio::test]
async fn districts_shapefile_is_read_with_date_fields() {
    let root = TempDataRoot::new();
    let features: Vec<FeatureFixture> = assaba_districts()
        .into_iter()
        .map(|mut f| {
            f.properties["SURVEYED"] = json!("2019-05-01");
            f
        })
        .collect();
    root.add_shapefile(layout::DISTRICTS, Some(4326), &features, &["SURVEYED"]);
    root.add_shapefile(layout::REGION, Some(4326), &assaba_districts()[..1], &[]);

    let (status, body) = get(app_with_builtin_catalog(&root), "/admin/districts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "FeatureCollection");
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 3);
    for feature in features {
        assert_eq!(feature["properties"]["SURVEYED"], "2019-05-01 00:00:00");
    }
    let kiffa = features
        .iter()
        .find(|f| f["properties"]["ADM3_EN"] == "Kiffa")
        .unwrap();
    let first = &kiffa["geometry"]["coordinates"][0][0];
    assert_coords_approx_eq!(
        (first[0].as_f64().unwrap(), first[1].as_f64().unwrap()),
        (-12.0, 16.4),
        1e-6
    );

    let (status, body) = get(app_with_builtin_catalog(&root), "/admin/region").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["features"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn corrupt_raster_is_reported_in_body() {
    let root = TempDataRoot::new();
    root.add_file(&layout::landcover(2010), b"this is not a GeoTIFF");

    let (status, body) = get(app(&root), "/rasters/landcover").await;
    assert_eq!(status, StatusCode::OK);
    let message = body["error"].as_str().unwrap();
    assert!(!message.is_empty());
    assert!(body.get("base64_data").is_none());
}

#[tokio::test]
async fn landcover_defaults_to_2010_and_matches_file() {
    let root = TempDataRoot::new();
    let (width, height) = (20, 15);
    let values = create_landcover_grid(width, height);
    root.add_raster(
        &layout::landcover(2010),
        &RasterFixture::assaba(width, height),
        &values,
    );

    let (status, body) = get(app(&root), "/rasters/landcover").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("error").is_none());

    let payload: TransferPayload = serde_json::from_value(body).unwrap();
    assert_eq!(payload.shape, [height, width]);
    assert_eq!(payload.metadata.dtype.as_deref(), Some("uint8"));
    assert_eq!(payload.metadata.crs, "EPSG:4326");

    let grid = decode(&payload).unwrap();
    match grid.data() {
        RasterData::UInt8(a) => assert_eq!(a.iter().copied().collect::<Vec<u8>>(), values),
        other => panic!("expected uint8, got {}", other.dtype()),
    }
}

#[tokio::test]
async fn precip_year_parameter_selects_file() {
    let root = TempDataRoot::new();
    let fixture = RasterFixture::assaba(8, 6);
    root.add_raster(&layout::precip(2010), &fixture, &create_precipitation_grid(8, 6, 1));
    root.add_raster(&layout::precip(2018), &fixture, &create_precipitation_grid(8, 6, 2));

    let (_, body) = get(app(&root), "/rasters/precip?year=2018").await;
    let payload: TransferPayload = serde_json::from_value(body).unwrap();
    let grid = decode(&payload).unwrap();
    assert_eq!(grid.profile().dtype, Dtype::Float32);
    assert_eq!(
        grid.data().to_f64_vec(),
        create_precipitation_grid(8, 6, 2)
            .into_iter()
            .map(f64::from)
            .collect::<Vec<f64>>()
    );
}

#[tokio::test]
async fn datasets_listing_reports_available_years() {
    let root = TempDataRoot::new();
    root.add_raster(
        &layout::gpp(2012),
        &RasterFixture::assaba(4, 4),
        &create_precipitation_grid(4, 4, 3),
    );

    let (status, body) = get(app(&root), "/datasets").await;
    assert_eq!(status, StatusCode::OK);

    let datasets = body["datasets"].as_array().unwrap();
    assert_eq!(datasets.len(), 8);
    let gpp = datasets.iter().find(|d| d["name"] == "gpp").unwrap();
    assert_eq!(gpp["kind"], "raster");
    assert_eq!(gpp["route"], "/rasters/gpp");
    assert_eq!(gpp["available_years"], json!([2012]));
    let roads = datasets.iter().find(|d| d["name"] == "roads").unwrap();
    assert_eq!(roads["available"], false);
}

#[tokio::test]
async fn health_and_cors() {
    let root = TempDataRoot::new();
    let response = app(&root)
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:8501")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn metrics_without_recorder_is_empty() {
    let root = TempDataRoot::new();
    let response = app(&root)
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}
