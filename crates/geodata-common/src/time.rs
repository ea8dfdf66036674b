//! Date handling for time-series queries.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Date format used on every user-facing surface ("2010-01-01").
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Textual form of date/time attribute values in GeoJSON output.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TimeParseError> {
        if start > end {
            return Err(TimeParseError::Inverted {
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse two "YYYY-MM-DD" strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, TimeParseError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }

    /// Start of the range as a UTC instant (midnight).
    pub fn start_utc(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start.and_hms_opt(0, 0, 0).unwrap_or_default())
    }

    /// End of the range as a UTC instant (midnight, exclusive like the
    /// platform's `filterDate`).
    pub fn end_utc(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.end.and_hms_opt(0, 0, 0).unwrap_or_default())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Parse a "YYYY-MM-DD" date.
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeParseError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| TimeParseError::InvalidFormat(s.to_string()))
}

/// Convert a millisecond epoch timestamp (as returned by the analysis
/// platform's `system:time_start`) to a UTC instant.
pub fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid date format: {0}. Expected YYYY-MM-DD")]
    InvalidFormat(String),

    #[error("Start date {start} is after end date {end}")]
    Inverted { start: String, end: String },
}
