//! Transfer codec: raster grids to and from a JSON-safe payload.
//!
//! The band is flattened row-major into little-endian bytes and carried as
//! standard base64 text together with its shape and metadata. Decoding
//! always uses the declared dtype; there is no fallback when it is missing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raster::{Dtype, RasterData, RasterGrid, RasterProfile, RasterShapeError};

/// Wire form of a raster band as returned by the data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferPayload {
    pub base64_data: String,

    /// `[rows, cols]`
    pub shape: [usize; 2],

    pub metadata: PayloadMetadata,
}

/// Metadata block of a [`TransferPayload`].
///
/// `dtype` is optional on the wire so that a payload lacking it can be
/// rejected with a precise error instead of a generic parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadMetadata {
    #[serde(default)]
    pub crs: String,

    /// GDAL geotransform order, six elements.
    #[serde(default)]
    pub transform: Vec<f64>,

    #[serde(default)]
    pub dtype: Option<String>,

    #[serde(default)]
    pub nodata: Option<f64>,

    #[serde(default)]
    pub driver: String,

    #[serde(default)]
    pub count: usize,

    #[serde(default)]
    pub width: usize,

    #[serde(default)]
    pub height: usize,
}

impl From<&RasterProfile> for PayloadMetadata {
    fn from(profile: &RasterProfile) -> Self {
        Self {
            crs: profile.crs.clone(),
            transform: profile.transform.to_vec(),
            dtype: Some(profile.dtype.as_str().to_string()),
            nodata: profile.nodata,
            driver: profile.driver.clone(),
            count: profile.count,
            width: profile.width,
            height: profile.height,
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("payload metadata has no dtype")]
    MissingDtype,

    #[error("unknown dtype '{0}'")]
    UnknownDtype(String),

    #[error("invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("transform must have 6 elements, got {0}")]
    Transform(usize),

    #[error("shape mismatch: {0}")]
    Shape(#[from] RasterShapeError),
}

/// Encode a grid into its transfer form.
pub fn encode(grid: &RasterGrid) -> TransferPayload {
    let (rows, cols) = grid.shape();
    TransferPayload {
        base64_data: STANDARD.encode(grid.data().to_le_bytes()),
        shape: [rows, cols],
        metadata: PayloadMetadata::from(grid.profile()),
    }
}

/// Decode only the band data, using the declared dtype.
pub fn decode_data(payload: &TransferPayload) -> Result<RasterData, CodecError> {
    let dtype = declared_dtype(&payload.metadata)?;
    let bytes = STANDARD.decode(payload.base64_data.as_bytes())?;
    let [rows, cols] = payload.shape;
    Ok(RasterData::from_le_bytes(dtype, rows, cols, &bytes)?)
}

/// Decode a payload back into a full grid.
///
/// Width and height default to the payload shape when the metadata omits them.
pub fn decode(payload: &TransferPayload) -> Result<RasterGrid, CodecError> {
    let data = decode_data(payload)?;
    let meta = &payload.metadata;

    let transform: [f64; 6] = meta
        .transform
        .as_slice()
        .try_into()
        .map_err(|_| CodecError::Transform(meta.transform.len()))?;

    let [rows, cols] = payload.shape;
    let profile = RasterProfile {
        crs: meta.crs.clone(),
        transform,
        dtype: data.dtype(),
        nodata: meta.nodata,
        driver: meta.driver.clone(),
        count: meta.count.max(1),
        width: if meta.width == 0 { cols } else { meta.width },
        height: if meta.height == 0 { rows } else { meta.height },
    };

    Ok(RasterGrid::new(data, profile)?)
}

fn declared_dtype(meta: &PayloadMetadata) -> Result<Dtype, CodecError> {
    let name = meta.dtype.as_deref().ok_or(CodecError::MissingDtype)?;
    Dtype::parse(name).ok_or_else(|| CodecError::UnknownDtype(name.to_string()))
}
