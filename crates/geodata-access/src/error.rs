use std::path::Path;

use geodata_common::raster::RasterShapeError;
use geodata_common::GeoDataError;
use thiserror::Error;

/// Errors raised while opening or decoding a dataset file.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("unsupported band type {dtype} in {path}")]
    UnsupportedDtype { path: String, dtype: String },

    #[error("raster shape error: {0}")]
    Shape(#[from] RasterShapeError),
}

impl AccessError {
    pub(crate) fn not_found(path: &Path) -> Self {
        AccessError::NotFound(path.display().to_string())
    }

    pub(crate) fn read(path: &Path, err: impl std::fmt::Display) -> Self {
        AccessError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessError::NotFound(_))
    }
}

impl From<AccessError> for GeoDataError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound(path) => GeoDataError::FileNotFound(path),
            other => GeoDataError::DataReadError(other.to_string()),
        }
    }
}
