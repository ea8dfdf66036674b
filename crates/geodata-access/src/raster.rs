//! Raster access: open a GeoTIFF (or any GDAL raster) and materialise band 1.

use std::path::Path;
use std::time::Instant;

use gdal::raster::{GdalType, RasterBand};
use gdal::{Dataset, Metadata};
use ndarray::Array2;
use tracing::{debug, info};

use geodata_common::{RasterData, RasterGrid, RasterProfile};

use crate::error::AccessError;

/// Geotransform used when the file carries none (identity, pixel space).
const IDENTITY_TRANSFORM: [f64; 6] = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Read band 1 of the raster at `path` fully into memory.
pub fn read_raster(path: &Path) -> Result<RasterGrid, AccessError> {
    if !path.is_file() {
        return Err(AccessError::not_found(path));
    }

    let started = Instant::now();
    let dataset = Dataset::open(path).map_err(|e| AccessError::read(path, e))?;
    let transform = dataset.geo_transform().unwrap_or(IDENTITY_TRANSFORM);
    let crs = dataset_crs(&dataset);
    let driver = dataset.driver().short_name();
    let count = dataset.raster_count() as usize;

    let band = dataset.rasterband(1).map_err(|e| AccessError::read(path, e))?;
    let (width, height) = band.size();
    let nodata = band.no_data_value();
    let band_type = band.band_type().name();

    let data = match band_type.as_str() {
        "Byte" if is_signed_byte(&band) => {
            RasterData::Int8(read_band::<u8>(&band, path, width, height)?.mapv(|v| v as i8))
        }
        "Byte" => RasterData::UInt8(read_band(&band, path, width, height)?),
        // Int8 bands are widened by GDAL into i16 without loss
        "Int8" => {
            RasterData::Int8(read_band::<i16>(&band, path, width, height)?.mapv(|v| v as i8))
        }
        "UInt16" => RasterData::UInt16(read_band(&band, path, width, height)?),
        "Int16" => RasterData::Int16(read_band(&band, path, width, height)?),
        "UInt32" => RasterData::UInt32(read_band(&band, path, width, height)?),
        "Int32" => RasterData::Int32(read_band(&band, path, width, height)?),
        "Float32" => RasterData::Float32(read_band(&band, path, width, height)?),
        "Float64" => RasterData::Float64(read_band(&band, path, width, height)?),
        other => {
            return Err(AccessError::UnsupportedDtype {
                path: path.display().to_string(),
                dtype: other.to_string(),
            })
        }
    };

    let profile = RasterProfile {
        crs,
        transform,
        dtype: data.dtype(),
        nodata,
        driver,
        count,
        width,
        height,
    };
    let grid = RasterGrid::new(data, profile)?;

    info!(
        path = %path.display(),
        width,
        height,
        dtype = %grid.profile().dtype,
        "Loaded raster"
    );
    debug!(
        path = %path.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        bands = count,
        "Raster read complete"
    );

    Ok(grid)
}

/// "EPSG:xxxx" when the CRS has an authority code, otherwise its WKT.
fn dataset_crs(dataset: &Dataset) -> String {
    if let Ok(srs) = dataset.spatial_ref() {
        if let Ok(code) = srs.auth_code() {
            return format!("EPSG:{code}");
        }
    }
    dataset.projection()
}

fn is_signed_byte(band: &RasterBand) -> bool {
    band.metadata_item("PIXELTYPE", "IMAGE_STRUCTURE")
        .map_or(false, |v| v.eq_ignore_ascii_case("SIGNEDBYTE"))
}

fn read_band<T: GdalType + Copy + Default>(
    band: &RasterBand,
    path: &Path,
    width: usize,
    height: usize,
) -> Result<Array2<T>, AccessError> {
    let mut data = vec![T::default(); width * height];
    band.read_into_slice((0, 0), (width, height), (width, height), &mut data, None)
        .map_err(|e| AccessError::read(path, e))?;
    Array2::from_shape_vec((height, width), data).map_err(|e| AccessError::read(path, e))
}
