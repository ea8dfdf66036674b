//! Vector layer normalisation against on-disk fixtures.

use geodata_access::{read_vector, AccessError};
use geodata_common::CrsCode;
use serde_json::json;
use test_utils::{
    assaba_districts, assert_approx_eq, assert_coords_approx_eq, write_wkt_csv, FeatureFixture, TempDataRoot,
};

fn first_coord(layer: &geodata_access::VectorLayer) -> (f64, f64) {
    let geometry = layer.features()[0].geometry.as_ref().unwrap();
    let value = serde_json::to_value(geometry).unwrap();
    let point = match value["type"].as_str().unwrap() {
        "Point" => value["coordinates"].clone(),
        "Polygon" => value["coordinates"][0][0].clone(),
        "LineString" => value["coordinates"][0].clone(),
        other => panic!("unexpected geometry {other}"),
    };
    (point[0].as_f64().unwrap(), point[1].as_f64().unwrap())
}

#[test]
fn geographic_layer_keeps_features_and_attributes() {
    let root = TempDataRoot::new();
    let path = root.add_geojson("Admin_layers/districts.geojson", None, &assaba_districts());

    let layer = read_vector(&path).unwrap();
    assert_eq!(layer.crs, CrsCode::Epsg4326);
    assert_eq!(layer.len(), 3);
    assert!(layer.field_names().contains(&"ADM3_EN".to_string()));

    let names: Vec<String> = layer
        .records()
        .iter()
        .map(|r| r["ADM3_EN"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Kiffa", "Guerou", "Kankossa"]);

    // lon/lat order is preserved
    assert_coords_approx_eq!(first_coord(&layer), (-12.0, 16.4), 1e-9);
}

#[test]
fn projected_layer_is_reprojected_to_lon_lat() {
    let root = TempDataRoot::new();
    // UTM 28N, easting 500000 lies on the -15° central meridian
    let roads = vec![FeatureFixture::line(
        &[(500_000.0, 1_800_000.0), (520_000.0, 1_810_000.0)],
        json!({"name": "Route de l'Espoir"}),
    )];
    let path = root.add_geojson("roads.geojson", Some(32628), &roads);

    let layer = read_vector(&path).unwrap();
    assert_eq!(layer.crs, CrsCode::Epsg4326);
    assert_eq!(layer.len(), 1);

    let (lon, lat) = first_coord(&layer);
    assert_approx_eq!(lon, -15.0, 1e-6);
    assert!(lat > 16.0 && lat < 16.5, "lat {lat}");
}

#[test]
fn layer_without_crs_is_assumed_geographic() {
    let root = TempDataRoot::new();
    let path = root.join("water.csv");
    write_wkt_csv(
        &path,
        &[
            ("LINESTRING (-11.9 16.6,-11.5 16.7)", "Oued Gorgol"),
            ("POINT (-11.4 16.62)", "Mare de Kiffa"),
        ],
    )
    .unwrap();

    let layer = read_vector(&path).unwrap();
    assert_eq!(layer.crs, CrsCode::Epsg4326);
    assert_eq!(layer.len(), 2);
    assert_coords_approx_eq!(first_coord(&layer), (-11.9, 16.6), 1e-9);
}

#[test]
fn empty_layer_is_valid() {
    let root = TempDataRoot::new();
    let path = root.add_geojson("empty.geojson", None, &[]);

    let layer = read_vector(&path).unwrap();
    assert!(layer.is_empty());
    assert!(layer.field_names().is_empty());
    assert_eq!(layer.to_json_value()["type"], "FeatureCollection");
}

#[test]
fn missing_layer_is_not_found() {
    let root = TempDataRoot::new();
    let err = read_vector(&root.join("Admin_layers/Assaba_Districts_layer.shp")).unwrap_err();
    assert!(matches!(err, AccessError::NotFound(_)));
}
