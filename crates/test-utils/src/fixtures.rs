//! On-disk fixtures: GeoTIFFs, vector layers and a temporary data root
//! laid out like the production data directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gdal::raster::{Buffer, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, Geometry, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType};
use gdal::DriverManager;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Common bounding boxes, `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Approximate extent of the Assaba region.
    pub const ASSABA: (f64, f64, f64, f64) = (-13.3, 15.6, -10.7, 18.1);

    /// Default ROI rectangle used by the time-series tool.
    pub const DEFAULT_ROI: (f64, f64, f64, f64) = (-16.0, 16.0, -14.0, 18.0);
}

/// Relative paths of the canonical data layout.
pub mod layout {
    pub const DISTRICTS: &str = "Admin_layers/Assaba_Districts_layer.shp";
    pub const REGION: &str = "Admin_layers/Assaba_Region_layer.shp";

    pub fn landcover(year: i32) -> String {
        format!("Modis_Land_Cover_Data/{year}LCT.tif")
    }

    pub fn gpp(year: i32) -> String {
        format!("MODIS_Gross_Primary_Production_GPP/{year}_GP.tif")
    }

    pub fn precip(year: i32) -> String {
        format!("Climate_Precipitation_Data/{year}R.tif")
    }

    pub fn population(year: i32) -> String {
        format!("Gridded_Population_Density_Data/mrt_pd_{year}_1km.tif")
    }
}

/// Georeferencing of a single-band GeoTIFF fixture.
#[derive(Debug, Clone)]
pub struct RasterFixture {
    pub width: usize,
    pub height: usize,
    /// GDAL geotransform order.
    pub transform: [f64; 6],
    pub epsg: Option<u32>,
    pub nodata: Option<f64>,
}

impl RasterFixture {
    /// A north-up EPSG:4326 grid anchored at the north-west corner of Assaba
    /// with 0.01° pixels.
    pub fn assaba(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            transform: [bbox::ASSABA.0, 0.01, 0.0, bbox::ASSABA.3, 0.0, -0.01],
            epsg: Some(4326),
            nodata: None,
        }
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn without_crs(mut self) -> Self {
        self.epsg = None;
        self
    }

    /// Write `data` (row-major, `width * height` values) as a GeoTIFF.
    pub fn write<T: GdalType + Copy>(&self, path: &Path, data: &[T]) -> gdal::errors::Result<()> {
        ensure_parent(path);
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut dataset =
            driver.create_with_band_type::<T, _>(path, self.width, self.height, 1)?;
        dataset.set_geo_transform(&self.transform)?;
        if let Some(code) = self.epsg {
            dataset.set_spatial_ref(&SpatialRef::from_epsg(code)?)?;
        }

        let mut band = dataset.rasterband(1)?;
        if self.nodata.is_some() {
            band.set_no_data_value(self.nodata)?;
        }
        let mut buffer = Buffer::new((self.width, self.height), data.to_vec());
        band.write((0, 0), (self.width, self.height), &mut buffer)?;
        Ok(())
    }
}

/// One feature of a vector fixture.
#[derive(Debug, Clone)]
pub struct FeatureFixture {
    pub geometry: Value,
    pub properties: Value,
}

impl FeatureFixture {
    /// Axis-aligned rectangle polygon.
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64, properties: Value) -> Self {
        Self {
            geometry: json!({
                "type": "Polygon",
                "coordinates": [[
                    [min_x, min_y],
                    [max_x, min_y],
                    [max_x, max_y],
                    [min_x, max_y],
                    [min_x, min_y]
                ]]
            }),
            properties,
        }
    }

    pub fn line(coords: &[(f64, f64)], properties: Value) -> Self {
        let coordinates: Vec<Value> = coords.iter().map(|(x, y)| json!([x, y])).collect();
        Self {
            geometry: json!({ "type": "LineString", "coordinates": coordinates }),
            properties,
        }
    }
}

/// Three Assaba districts with the attribute names of the real layer.
pub fn assaba_districts() -> Vec<FeatureFixture> {
    vec![
        FeatureFixture::rectangle(
            -12.0,
            16.4,
            -11.2,
            17.0,
            json!({"ADM3_EN": "Kiffa", "ADM3_PCODE": "MR03001", "AREA_KM2": 7412.5}),
        ),
        FeatureFixture::rectangle(
            -11.2,
            16.4,
            -10.8,
            17.2,
            json!({"ADM3_EN": "Guerou", "ADM3_PCODE": "MR03003", "AREA_KM2": 5127.0}),
        ),
        FeatureFixture::rectangle(
            -12.9,
            16.0,
            -12.0,
            16.8,
            json!({"ADM3_EN": "Kankossa", "ADM3_PCODE": "MR03004", "AREA_KM2": 9980.25}),
        ),
    ]
}

/// Write a GeoJSON FeatureCollection. With `epsg` set, a legacy `crs`
/// member is added so GDAL reports that CRS for the layer.
pub fn write_geojson(path: &Path, epsg: Option<u32>, features: &[FeatureFixture]) -> io::Result<()> {
    ensure_parent(path);
    let features: Vec<Value> = features
        .iter()
        .map(|f| json!({"type": "Feature", "properties": f.properties, "geometry": f.geometry}))
        .collect();
    let mut collection = json!({"type": "FeatureCollection", "features": features});
    if let Some(code) = epsg {
        collection["crs"] = json!({
            "type": "name",
            "properties": {"name": format!("urn:ogc:def:crs:EPSG::{code}")}
        });
    }
    fs::write(path, serde_json::to_vec_pretty(&collection)?)
}

/// Write an ESRI Shapefile (with its `.shx`, `.dbf` and `.prj` sidecars).
///
/// Field types follow the first feature: strings, integers and reals. The
/// properties named in `date_fields` hold `YYYY-MM-DD` text and are written
/// as `Date` fields. Null properties are left unset.
pub fn write_shapefile(
    path: &Path,
    epsg: Option<u32>,
    features: &[FeatureFixture],
    date_fields: &[&str],
) -> gdal::errors::Result<()> {
    ensure_parent(path);
    let srs = epsg.map(SpatialRef::from_epsg).transpose()?;
    let ty = match features.first().and_then(|f| f.geometry["type"].as_str()) {
        Some("Polygon") => OGRwkbGeometryType::wkbPolygon,
        Some("LineString") => OGRwkbGeometryType::wkbLineString,
        _ => OGRwkbGeometryType::wkbUnknown,
    };

    let driver = DriverManager::get_driver_by_name("ESRI Shapefile")?;
    let mut dataset = driver.create_vector_only(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("layer")
        .to_string();
    let mut layer = dataset.create_layer(LayerOptions {
        name: &name,
        srs: srs.as_ref(),
        ty,
        ..Default::default()
    })?;

    let schema: Vec<(String, OGRFieldType::Type)> = features
        .first()
        .and_then(|f| f.properties.as_object())
        .map(|props| {
            props
                .iter()
                .map(|(key, value)| {
                    let field_type = if date_fields.contains(&key.as_str()) {
                        OGRFieldType::OFTDate
                    } else if value.is_i64() {
                        OGRFieldType::OFTInteger64
                    } else if value.is_number() {
                        OGRFieldType::OFTReal
                    } else {
                        OGRFieldType::OFTString
                    };
                    (key.clone(), field_type)
                })
                .collect()
        })
        .unwrap_or_default();
    let defs: Vec<(&str, OGRFieldType::Type)> =
        schema.iter().map(|(k, t)| (k.as_str(), *t)).collect();
    layer.create_defn_fields(&defs)?;

    for feature in features {
        let geometry = Geometry::from_wkt(&geometry_wkt(&feature.geometry))?;
        let mut names = Vec::new();
        let mut values = Vec::new();
        for (key, field_type) in &schema {
            let value = &feature.properties[key.as_str()];
            let field = match *field_type {
                OGRFieldType::OFTDate => value
                    .as_str()
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                    .map(FieldValue::DateValue),
                OGRFieldType::OFTInteger64 => value.as_i64().map(FieldValue::Integer64Value),
                OGRFieldType::OFTReal => value.as_f64().map(FieldValue::RealValue),
                _ => value.as_str().map(|s| FieldValue::StringValue(s.to_string())),
            };
            if let Some(field) = field {
                names.push(key.as_str());
                values.push(field);
            }
        }
        layer.create_feature_fields(geometry, &names, &values)?;
    }
    Ok(())
}

/// WKT of a GeoJSON Polygon or LineString value.
fn geometry_wkt(geometry: &Value) -> String {
    let ring = |positions: &Value| -> String {
        positions
            .as_array()
            .map(|ps| {
                ps.iter()
                    .map(|p| format!("{} {}", p[0], p[1]))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    };
    let coords = &geometry["coordinates"];
    match geometry["type"].as_str() {
        Some("LineString") => format!("LINESTRING ({})", ring(coords)),
        _ => {
            let rings: Vec<String> = coords
                .as_array()
                .map(|rs| rs.iter().map(|r| format!("({})", ring(r))).collect())
                .unwrap_or_default();
            format!("POLYGON ({})", rings.join(", "))
        }
    }
}

/// Write a CSV whose `WKT` column holds geometries. GDAL reads such a
/// file as a layer without any CRS.
pub fn write_wkt_csv(path: &Path, rows: &[(&str, &str)]) -> io::Result<()> {
    ensure_parent(path);
    let mut text = String::from("WKT,name\n");
    for (wkt, name) in rows {
        text.push_str(&format!("\"{wkt}\",{name}\n"));
    }
    fs::write(path, text)
}

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
}

/// A temporary directory used as the data root of a service under test.
///
/// The directory is deleted when the value is dropped.
pub struct TempDataRoot {
    dir: TempDir,
}

impl TempDataRoot {
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("assaba-data-")
            .tempdir()
            .expect("Failed to create temp data root");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a `/`-separated relative path.
    pub fn join(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .fold(self.dir.path().to_path_buf(), |acc, seg| acc.join(seg))
    }

    /// Write a raster fixture at a relative path and return its absolute path.
    pub fn add_raster<T: GdalType + Copy>(
        &self,
        relative: &str,
        fixture: &RasterFixture,
        data: &[T],
    ) -> PathBuf {
        let path = self.join(relative);
        fixture
            .write(&path, data)
            .expect("Failed to write raster fixture");
        path
    }

    /// Write raw bytes at a relative path and return its absolute path.
    pub fn add_file(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.join(relative);
        ensure_parent(&path);
        fs::write(&path, bytes).expect("Failed to write file fixture");
        path
    }

    /// Write a shapefile fixture at a relative path and return its absolute path.
    pub fn add_shapefile(
        &self,
        relative: &str,
        epsg: Option<u32>,
        features: &[FeatureFixture],
        date_fields: &[&str],
    ) -> PathBuf {
        let path = self.join(relative);
        write_shapefile(&path, epsg, features, date_fields)
            .expect("Failed to write shapefile fixture");
        path
    }

    /// Write a GeoJSON fixture at a relative path and return its absolute path.
    pub fn add_geojson(&self, relative: &str, epsg: Option<u32>, features: &[FeatureFixture]) -> PathBuf {
        let path = self.join(relative);
        write_geojson(&path, epsg, features).expect("Failed to write vector fixture");
        path
    }
}

impl Default for TempDataRoot {
    fn default() -> Self {
        Self::new()
    }
}
