//! Vector access: read the first layer of a vector source as EPSG:4326 GeoJSON.

use std::path::Path;

use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::vector::{FieldValue, Geometry, LayerAccess};
use gdal::Dataset;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use serde::Serialize;
use tracing::{error, info, warn};

use geodata_common::crs::WEB_MAP_EPSG;
use geodata_common::time::DATETIME_FORMAT;
use geodata_common::CrsCode;

use crate::error::AccessError;

/// A normalised vector layer: GeoJSON features in EPSG:4326.
#[derive(Debug, Clone, Serialize)]
pub struct VectorLayer {
    /// Layer name as reported by the driver.
    pub name: String,

    /// Always [`CrsCode::Epsg4326`] after normalisation.
    pub crs: CrsCode,

    pub collection: FeatureCollection,
}

impl VectorLayer {
    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }

    pub fn features(&self) -> &[Feature] {
        &self.collection.features
    }

    /// Attribute names, in the order of the first feature.
    pub fn field_names(&self) -> Vec<String> {
        self.collection
            .features
            .first()
            .and_then(|f| f.properties.as_ref())
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Attribute records, one JSON object per feature.
    pub fn records(&self) -> Vec<JsonObject> {
        self.collection
            .features
            .iter()
            .map(|f| f.properties.clone().unwrap_or_default())
            .collect()
    }

    /// The FeatureCollection as a JSON value.
    pub fn to_json_value(&self) -> JsonValue {
        serde_json::to_value(&self.collection).unwrap_or(JsonValue::Null)
    }
}

/// Read the first layer of the vector source at `path`.
pub fn read_vector(path: &Path) -> Result<VectorLayer, AccessError> {
    if !path.exists() {
        return Err(AccessError::not_found(path));
    }

    let dataset = Dataset::open(path).map_err(|e| AccessError::read(path, e))?;
    let mut layer = dataset.layer(0).map_err(|e| AccessError::read(path, e))?;
    let name = layer.name();

    let to_wgs84 = match layer.spatial_ref() {
        None => {
            warn!(
                path = %path.display(),
                "Layer has no CRS, assuming EPSG:{}", WEB_MAP_EPSG
            );
            None
        }
        Some(source) => match wgs84_transform(source) {
            Ok(transform) => transform,
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to build reprojection to EPSG:{}, keeping source coordinates",
                    WEB_MAP_EPSG
                );
                None
            }
        },
    };

    let mut features = Vec::new();
    for feature in layer.features() {
        let geometry = match feature.geometry() {
            Some(geom) => Some(to_geojson_geometry(geom, to_wgs84.as_ref(), path)?),
            None => None,
        };

        let mut properties = JsonObject::new();
        for (field, value) in feature.fields() {
            properties.insert(field, field_to_json(value));
        }

        features.push(Feature {
            bbox: None,
            geometry,
            id: feature
                .fid()
                .map(|fid| geojson::feature::Id::Number(fid.into())),
            properties: Some(properties),
            foreign_members: None,
        });
    }

    if features.is_empty() {
        warn!(path = %path.display(), "Vector layer is empty");
    }
    info!(
        path = %path.display(),
        layer = %name,
        features = features.len(),
        "Loaded vector layer"
    );

    Ok(VectorLayer {
        name,
        crs: CrsCode::Epsg4326,
        collection: FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
    })
}

/// Build a source → EPSG:4326 transform in lon/lat order.
///
/// Returns `None` when the source already is EPSG:4326.
fn wgs84_transform(mut source: SpatialRef) -> gdal::errors::Result<Option<CoordTransform>> {
    if source.auth_code().ok() == Some(WEB_MAP_EPSG as i32) {
        return Ok(None);
    }
    source.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    let mut target = SpatialRef::from_epsg(WEB_MAP_EPSG)?;
    target.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    CoordTransform::new(&source, &target).map(Some)
}

fn to_geojson_geometry(
    geom: &Geometry,
    transform: Option<&CoordTransform>,
    path: &Path,
) -> Result<geojson::Geometry, AccessError> {
    let json = match transform {
        Some(ct) => match geom.transform(ct) {
            Ok(projected) => projected.json(),
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to reproject geometry, keeping source coordinates"
                );
                geom.json()
            }
        },
        None => geom.json(),
    }
    .map_err(|e| AccessError::read(path, e))?;

    serde_json::from_str(&json).map_err(|e| AccessError::read(path, e))
}

/// Map an attribute value to JSON. Dates become "YYYY-MM-DD HH:MM:SS" text.
pub fn field_to_json(value: Option<FieldValue>) -> JsonValue {
    let Some(value) = value else {
        return JsonValue::Null;
    };
    match value {
        FieldValue::IntegerValue(v) => JsonValue::from(v),
        FieldValue::Integer64Value(v) => JsonValue::from(v),
        FieldValue::RealValue(v) => {
            serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)
        }
        FieldValue::StringValue(v) => JsonValue::String(v),
        FieldValue::IntegerListValue(v) => JsonValue::from(v),
        FieldValue::Integer64ListValue(v) => JsonValue::from(v),
        FieldValue::RealListValue(v) => JsonValue::Array(
            v.into_iter()
                .map(|x| serde_json::Number::from_f64(x).map_or(JsonValue::Null, JsonValue::Number))
                .collect(),
        ),
        FieldValue::StringListValue(v) => JsonValue::from(v),
        FieldValue::DateValue(d) => {
            JsonValue::String(d.format("%Y-%m-%d 00:00:00").to_string())
        }
        FieldValue::DateTimeValue(dt) => JsonValue::String(dt.format(DATETIME_FORMAT).to_string()),
        #[allow(unreachable_patterns)]
        _ => JsonValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, TimeZone};

    #[test]
    fn test_date_fields_are_text() {
        let d = NaiveDate::from_ymd_opt(2019, 5, 1).unwrap();
        assert_eq!(
            field_to_json(Some(FieldValue::DateValue(d))),
            JsonValue::String("2019-05-01 00:00:00".into())
        );

        let dt = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2020, 12, 31, 23, 5, 9)
            .unwrap();
        assert_eq!(
            field_to_json(Some(FieldValue::DateTimeValue(dt))),
            JsonValue::String("2020-12-31 23:05:09".into())
        );
    }

    #[test]
    fn test_scalar_fields() {
        assert_eq!(field_to_json(None), JsonValue::Null);
        assert_eq!(field_to_json(Some(FieldValue::IntegerValue(7))), JsonValue::from(7));
        assert_eq!(
            field_to_json(Some(FieldValue::StringValue("Kiffa".into()))),
            JsonValue::from("Kiffa")
        );
        assert_eq!(field_to_json(Some(FieldValue::RealValue(f64::NAN))), JsonValue::Null);
        assert_eq!(
            field_to_json(Some(FieldValue::RealListValue(vec![1.5, 2.0]))),
            serde_json::json!([1.5, 2.0])
        );
    }
}
