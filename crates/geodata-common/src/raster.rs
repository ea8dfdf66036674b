//! In-memory raster grids: typed band data plus georeferencing profile.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-width numeric element types, named the way numpy names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl Dtype {
    pub const ALL: [Dtype; 8] = [
        Dtype::UInt8,
        Dtype::Int8,
        Dtype::UInt16,
        Dtype::Int16,
        Dtype::UInt32,
        Dtype::Int32,
        Dtype::Float32,
        Dtype::Float64,
    ];

    /// Parse a dtype string ("uint8", "int16", "float32", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "uint8" | "byte" => Some(Dtype::UInt8),
            "int8" => Some(Dtype::Int8),
            "uint16" => Some(Dtype::UInt16),
            "int16" => Some(Dtype::Int16),
            "uint32" => Some(Dtype::UInt32),
            "int32" => Some(Dtype::Int32),
            "float32" => Some(Dtype::Float32),
            "float64" => Some(Dtype::Float64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dtype::UInt8 => "uint8",
            Dtype::Int8 => "int8",
            Dtype::UInt16 => "uint16",
            Dtype::Int16 => "int16",
            Dtype::UInt32 => "uint32",
            Dtype::Int32 => "int32",
            Dtype::Float32 => "float32",
            Dtype::Float64 => "float64",
        }
    }

    /// Size in bytes of one element.
    pub fn item_size(&self) -> usize {
        match self {
            Dtype::UInt8 | Dtype::Int8 => 1,
            Dtype::UInt16 | Dtype::Int16 => 2,
            Dtype::UInt32 | Dtype::Int32 | Dtype::Float32 => 4,
            Dtype::Float64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Dtype::Float32 | Dtype::Float64)
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric element that can live in a [`RasterData`] array.
pub trait Pixel: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    const DTYPE: Dtype;

    fn write_le(self, out: &mut Vec<u8>);

    /// Read one element from exactly `DTYPE.item_size()` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;

    fn to_f64(self) -> f64;
}

macro_rules! impl_pixel {
    ($t:ty, $dtype:expr) => {
        impl Pixel for $t {
            const DTYPE: Dtype = $dtype;

            #[inline]
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(bytes);
                <$t>::from_le_bytes(buf)
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_pixel!(u8, Dtype::UInt8);
impl_pixel!(i8, Dtype::Int8);
impl_pixel!(u16, Dtype::UInt16);
impl_pixel!(i16, Dtype::Int16);
impl_pixel!(u32, Dtype::UInt32);
impl_pixel!(i32, Dtype::Int32);
impl_pixel!(f32, Dtype::Float32);
impl_pixel!(f64, Dtype::Float64);

/// Band data in its native element type, shape `(rows, cols)`.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterData {
    UInt8(Array2<u8>),
    Int8(Array2<i8>),
    UInt16(Array2<u16>),
    Int16(Array2<i16>),
    UInt32(Array2<u32>),
    Int32(Array2<i32>),
    Float32(Array2<f32>),
    Float64(Array2<f64>),
}

/// Dispatch an expression over every variant of [`RasterData`].
macro_rules! with_array {
    ($data:expr, $a:ident => $body:expr) => {
        match $data {
            RasterData::UInt8($a) => $body,
            RasterData::Int8($a) => $body,
            RasterData::UInt16($a) => $body,
            RasterData::Int16($a) => $body,
            RasterData::UInt32($a) => $body,
            RasterData::Int32($a) => $body,
            RasterData::Float32($a) => $body,
            RasterData::Float64($a) => $body,
        }
    };
}

fn array_to_le_bytes<T: Pixel>(array: &Array2<T>) -> Vec<u8> {
    let mut out = Vec::with_capacity(array.len() * T::DTYPE.item_size());
    // iter() walks in logical row-major order whatever the memory layout
    for value in array.iter() {
        value.write_le(&mut out);
    }
    out
}

fn array_from_le_bytes<T: Pixel>(
    rows: usize,
    cols: usize,
    bytes: &[u8],
) -> Result<Array2<T>, RasterShapeError> {
    let item = T::DTYPE.item_size();
    let expected = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(item))
        .ok_or_else(|| RasterShapeError::Reshape(format!("{rows}x{cols} overflows")))?;
    if bytes.len() != expected {
        return Err(RasterShapeError::ByteLength {
            expected,
            actual: bytes.len(),
        });
    }
    let values: Vec<T> = bytes.chunks_exact(item).map(T::read_le).collect();
    Array2::from_shape_vec((rows, cols), values)
        .map_err(|e| RasterShapeError::Reshape(e.to_string()))
}

impl RasterData {
    pub fn dtype(&self) -> Dtype {
        match self {
            RasterData::UInt8(_) => Dtype::UInt8,
            RasterData::Int8(_) => Dtype::Int8,
            RasterData::UInt16(_) => Dtype::UInt16,
            RasterData::Int16(_) => Dtype::Int16,
            RasterData::UInt32(_) => Dtype::UInt32,
            RasterData::Int32(_) => Dtype::Int32,
            RasterData::Float32(_) => Dtype::Float32,
            RasterData::Float64(_) => Dtype::Float64,
        }
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        with_array!(self, a => a.dim())
    }

    pub fn len(&self) -> usize {
        with_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw row-major little-endian bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        with_array!(self, a => array_to_le_bytes(a))
    }

    /// Rebuild from raw row-major little-endian bytes of the given dtype.
    pub fn from_le_bytes(
        dtype: Dtype,
        rows: usize,
        cols: usize,
        bytes: &[u8],
    ) -> Result<Self, RasterShapeError> {
        Ok(match dtype {
            Dtype::UInt8 => RasterData::UInt8(array_from_le_bytes(rows, cols, bytes)?),
            Dtype::Int8 => RasterData::Int8(array_from_le_bytes(rows, cols, bytes)?),
            Dtype::UInt16 => RasterData::UInt16(array_from_le_bytes(rows, cols, bytes)?),
            Dtype::Int16 => RasterData::Int16(array_from_le_bytes(rows, cols, bytes)?),
            Dtype::UInt32 => RasterData::UInt32(array_from_le_bytes(rows, cols, bytes)?),
            Dtype::Int32 => RasterData::Int32(array_from_le_bytes(rows, cols, bytes)?),
            Dtype::Float32 => RasterData::Float32(array_from_le_bytes(rows, cols, bytes)?),
            Dtype::Float64 => RasterData::Float64(array_from_le_bytes(rows, cols, bytes)?),
        })
    }

    /// All values widened to f64, row-major.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_array!(self, a => a.iter().map(|v| v.to_f64()).collect())
    }

    /// Values as an f64 array with the same shape.
    pub fn to_f64_array(&self) -> Array2<f64> {
        with_array!(self, a => a.mapv(|v| v.to_f64()))
    }
}

/// Georeferencing and format metadata captured when a raster is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterProfile {
    /// CRS as reported by the reader (WKT, or "EPSG:xxxx" when known).
    pub crs: String,

    /// GDAL geotransform order:
    /// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
    pub transform: [f64; 6],

    pub dtype: Dtype,

    pub nodata: Option<f64>,

    /// Driver short name, e.g. "GTiff".
    pub driver: String,

    /// Number of bands in the source file (only band 1 is read).
    pub count: usize,

    pub width: usize,

    pub height: usize,
}

/// A single band fully materialised in memory with its profile.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    data: RasterData,
    profile: RasterProfile,
}

impl RasterGrid {
    /// Pair band data with its profile, checking shape and dtype agree.
    pub fn new(data: RasterData, profile: RasterProfile) -> Result<Self, RasterShapeError> {
        let (rows, cols) = data.shape();
        if rows != profile.height || cols != profile.width {
            return Err(RasterShapeError::Dimensions {
                rows,
                cols,
                height: profile.height,
                width: profile.width,
            });
        }
        if data.dtype() != profile.dtype {
            return Err(RasterShapeError::Dtype {
                data: data.dtype(),
                profile: profile.dtype,
            });
        }
        Ok(Self { data, profile })
    }

    pub fn data(&self) -> &RasterData {
        &self.data
    }

    pub fn profile(&self) -> &RasterProfile {
        &self.profile
    }

    pub fn into_parts(self) -> (RasterData, RasterProfile) {
        (self.data, self.profile)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// True when a value is finite and not the no-data sentinel.
    pub fn is_valid(&self, value: f64) -> bool {
        value.is_finite() && self.profile.nodata.map_or(true, |nd| value != nd)
    }

    /// Row-major values with invalid cells replaced by `None`.
    pub fn masked_values(&self) -> Vec<Option<f64>> {
        self.data
            .to_f64_vec()
            .into_iter()
            .map(|v| if self.is_valid(v) { Some(v) } else { None })
            .collect()
    }

    /// Summary statistics over valid cells.
    pub fn stats(&self) -> RasterStats {
        let mut stats = RasterStats {
            min: None,
            max: None,
            mean: None,
            valid_cells: 0,
            total_cells: self.data.len(),
        };
        let mut sum = 0.0;
        for v in self.masked_values().into_iter().flatten() {
            stats.min = Some(stats.min.map_or(v, |m: f64| m.min(v)));
            stats.max = Some(stats.max.map_or(v, |m: f64| m.max(v)));
            sum += v;
            stats.valid_cells += 1;
        }
        if stats.valid_cells > 0 {
            stats.mean = Some(sum / stats.valid_cells as f64);
        }
        stats
    }
}

/// Value summary of a raster band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_cells: usize,
    pub total_cells: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum RasterShapeError {
    #[error("array is {rows}x{cols} but profile declares {height}x{width}")]
    Dimensions {
        rows: usize,
        cols: usize,
        height: usize,
        width: usize,
    },

    #[error("array dtype {data} does not match profile dtype {profile}")]
    Dtype { data: Dtype, profile: Dtype },

    #[error("expected {expected} bytes, got {actual}")]
    ByteLength { expected: usize, actual: usize },

    #[error("cannot reshape: {0}")]
    Reshape(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn profile(dtype: Dtype, width: usize, height: usize, nodata: Option<f64>) -> RasterProfile {
        RasterProfile {
            crs: "EPSG:4326".to_string(),
            transform: [-13.0, 0.01, 0.0, 18.0, 0.0, -0.01],
            dtype,
            nodata,
            driver: "GTiff".to_string(),
            count: 1,
            width,
            height,
        }
    }

    #[test]
    fn test_dtype_parse_and_size() {
        for dtype in Dtype::ALL {
            assert_eq!(Dtype::parse(dtype.as_str()), Some(dtype));
        }
        assert_eq!(Dtype::parse("Byte"), Some(Dtype::UInt8));
        assert_eq!(Dtype::parse("complex64"), None);
        assert_eq!(Dtype::Int16.item_size(), 2);
        assert_eq!(Dtype::Float64.item_size(), 8);
    }

    #[test]
    fn test_dtype_serde_names() {
        let json = serde_json::to_string(&Dtype::Float32).unwrap();
        assert_eq!(json, "\"float32\"");
        let parsed: Dtype = serde_json::from_str("\"uint16\"").unwrap();
        assert_eq!(parsed, Dtype::UInt16);
    }

    #[test]
    fn test_le_bytes_are_row_major() {
        let data = RasterData::Int16(array![[1i16, 2], [3, -1]]);
        let bytes = data.to_le_bytes();
        assert_eq!(bytes, vec![1, 0, 2, 0, 3, 0, 0xff, 0xff]);
    }

    #[test]
    fn test_from_le_bytes_rejects_wrong_length() {
        let err = RasterData::from_le_bytes(Dtype::Float32, 2, 2, &[0u8; 15]).unwrap_err();
        assert!(matches!(
            err,
            RasterShapeError::ByteLength {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_transposed_layout_still_row_major() {
        let a = array![[1u8, 2, 3], [4, 5, 6]];
        let t = a.t().to_owned();
        let data = RasterData::UInt8(t.reversed_axes());
        assert_eq!(data.to_le_bytes(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_grid_rejects_mismatched_profile() {
        let data = RasterData::UInt8(array![[1u8, 2, 3]]);
        assert!(RasterGrid::new(data.clone(), profile(Dtype::UInt8, 3, 1, None)).is_ok());
        assert!(RasterGrid::new(data.clone(), profile(Dtype::UInt8, 1, 3, None)).is_err());
        assert!(RasterGrid::new(data, profile(Dtype::Int16, 3, 1, None)).is_err());
    }

    #[test]
    fn test_stats_skip_nodata_and_nan() {
        let data = RasterData::Float32(array![[1.0f32, -9999.0], [f32::NAN, 3.0]]);
        let grid = RasterGrid::new(data, profile(Dtype::Float32, 2, 2, Some(-9999.0))).unwrap();
        let stats = grid.stats();
        assert_eq!(stats.valid_cells, 2);
        assert_eq!(stats.total_cells, 4);
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(3.0));
        assert_eq!(stats.mean, Some(2.0));
    }
}
