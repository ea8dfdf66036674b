//! The remote analysis platform seam.

use async_trait::async_trait;

use geodata_common::DateRange;

use crate::error::PlatformError;
use crate::roi::RoiPolygon;
use crate::variables::Variable;

/// One regional-mean query: every image of the variable's collection in the
/// date range, reduced to its mean over the ROI.
#[derive(Debug, Clone)]
pub struct SeriesQuery {
    pub variable: Variable,
    pub range: DateRange,
    pub roi: RoiPolygon,
}

/// One reduced image as returned by the platform, before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    /// `system:time_start` in epoch milliseconds.
    pub time_start_ms: Option<i64>,
    pub value: Option<f64>,
}

impl RawObservation {
    pub fn new(time_start_ms: i64, value: Option<f64>) -> Self {
        Self {
            time_start_ms: Some(time_start_ms),
            value,
        }
    }
}

#[async_trait]
pub trait AnalysisPlatform: Send + Sync {
    /// Run the reduction. Order of the returned observations is unspecified.
    async fn regional_means(&self, query: &SeriesQuery) -> Result<Vec<RawObservation>, PlatformError>;

    fn name(&self) -> String;
}
