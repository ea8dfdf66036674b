//! Environmental variables available for time-series analysis.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RoiError;

/// Pixel limit passed to every regional reduction.
pub const MAX_PIXELS: f64 = 1e9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    Gpp,
    Ndvi,
    Precipitation,
}

impl Variable {
    pub const ALL: [Variable; 3] = [Variable::Gpp, Variable::Ndvi, Variable::Precipitation];

    /// Accepts the short name or the display label.
    pub fn parse(s: &str) -> Result<Self, RoiError> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(trimmed) || v.label() == trimmed)
            .ok_or_else(|| RoiError::UnknownVariable(s.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Variable::Gpp => "gpp",
            Variable::Ndvi => "ndvi",
            Variable::Precipitation => "precipitation",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Variable::Gpp => "GPP (MODIS)",
            Variable::Ndvi => "NDVI (MODIS)",
            Variable::Precipitation => "Precipitación (CHIRPS)",
        }
    }

    /// Image collection identifier on the analysis platform.
    pub fn collection(&self) -> &'static str {
        match self {
            Variable::Gpp => "MODIS/006/MOD17A2H",
            Variable::Ndvi => "MODIS/006/MOD13A2",
            Variable::Precipitation => "UCSB-CHG/CHIRPS/DAILY",
        }
    }

    /// Band whose regional mean forms the series.
    pub fn band(&self) -> &'static str {
        match self {
            Variable::Gpp => "Gpp",
            Variable::Ndvi => "NDVI",
            Variable::Precipitation => "precipitation",
        }
    }

    /// Reduction scale in metres.
    pub fn scale(&self) -> f64 {
        match self {
            Variable::Gpp | Variable::Ndvi => 500.0,
            Variable::Precipitation => 5000.0,
        }
    }

    /// Stem of exported file names: the label with spaces as underscores.
    pub fn file_stem(&self) -> String {
        format!("{}_timeseries", self.label().replace(' ', "_"))
    }

    pub fn csv_file_name(&self) -> String {
        format!("{}.csv", self.file_stem())
    }

    pub fn png_file_name(&self) -> String {
        format!("{}.png", self.file_stem())
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
