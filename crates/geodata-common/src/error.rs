//! Error types for the geodata services.

use thiserror::Error;

/// Result type alias using GeoDataError.
pub type GeoDataResult<T> = Result<T, GeoDataError>;

/// Primary error type surfaced at request/screen boundaries.
#[derive(Debug, Error)]
pub enum GeoDataError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    // === Data Errors ===
    /// Relative path of the file that does not exist.
    #[error("No se encontró {0}")]
    FileNotFound(String),

    #[error("Failed to read data: {0}")]
    DataReadError(String),

    #[error("Failed to decode payload: {0}")]
    DecodeError(String),

    // === Remote Errors ===
    #[error("Could not reach {url}: {message}")]
    NetworkError { url: String, message: String },

    #[error("Remote query failed: {0}")]
    RemoteQueryError(String),

    // === Infrastructure Errors ===
    #[error("Rendering failed: {0}")]
    RenderError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Request timeout")]
    Timeout,
}

impl GeoDataError {
    /// Get the HTTP status code for this error.
    ///
    /// Data-layer failures (missing file, unreadable file) are reported in
    /// the body of a 200 response by the data service, so they map to 200
    /// here as well.
    pub fn http_status_code(&self) -> u16 {
        match self {
            GeoDataError::MissingParameter(_) | GeoDataError::InvalidParameter { .. } => 400,

            GeoDataError::UnknownDataset(_) => 404,

            GeoDataError::FileNotFound(_)
            | GeoDataError::DataReadError(_)
            | GeoDataError::DecodeError(_) => 200,

            GeoDataError::NetworkError { .. } | GeoDataError::RemoteQueryError(_) => 502,
            GeoDataError::Timeout => 504,

            _ => 500,
        }
    }

    /// True when the failure should be shown as a warning rather than an error.
    pub fn is_warning(&self) -> bool {
        matches!(self, GeoDataError::FileNotFound(_))
    }
}

impl From<std::io::Error> for GeoDataError {
    fn from(err: std::io::Error) -> Self {
        GeoDataError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for GeoDataError {
    fn from(err: serde_json::Error) -> Self {
        GeoDataError::InternalError(format!("JSON error: {}", err))
    }
}

impl From<crate::codec::CodecError> for GeoDataError {
    fn from(err: crate::codec::CodecError) -> Self {
        GeoDataError::DecodeError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_message() {
        let err = GeoDataError::FileNotFound("Admin_layers/Assaba_Districts_layer.shp".into());
        assert_eq!(
            err.to_string(),
            "No se encontró Admin_layers/Assaba_Districts_layer.shp"
        );
        assert_eq!(err.http_status_code(), 200);
        assert!(err.is_warning());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(GeoDataError::MissingParameter("year".into()).http_status_code(), 400);
        assert_eq!(GeoDataError::UnknownDataset("lakes".into()).http_status_code(), 404);
        assert_eq!(GeoDataError::Timeout.http_status_code(), 504);
        assert_eq!(
            GeoDataError::RemoteQueryError("boom".into()).http_status_code(),
            502
        );
        assert!(!GeoDataError::DataReadError("corrupt".into()).is_warning());
    }
}
