//! Error types for the ROI tool.

use thiserror::Error;

/// Failures of the analysis platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("platform returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected platform response: {0}")]
    Response(String),
}

#[derive(Debug, Error)]
pub enum RoiError {
    #[error("La fecha de inicio debe ser anterior a la fecha de fin.")]
    InvalidDateRange,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    #[error("Invalid ROI geometry: {0}")]
    InvalidGeometry(String),

    #[error("At most {max} variables can be compared, got {got}")]
    TooManyVariables { max: usize, got: usize },

    #[error("Error en el análisis. Revisa los logs.")]
    Platform(#[from] PlatformError),

    #[error("Export failed: {0}")]
    Export(String),
}

impl RoiError {
    pub fn http_status_code(&self) -> u16 {
        match self {
            RoiError::SessionNotFound(_) => 404,
            RoiError::Platform(_) => 502,
            RoiError::Export(_) => 500,
            _ => 400,
        }
    }
}

impl From<geodata_common::time::TimeParseError> for RoiError {
    fn from(err: geodata_common::time::TimeParseError) -> Self {
        use geodata_common::time::TimeParseError;
        match err {
            TimeParseError::Inverted { .. } => RoiError::InvalidDateRange,
            TimeParseError::InvalidFormat(s) => RoiError::InvalidDate(s),
        }
    }
}
