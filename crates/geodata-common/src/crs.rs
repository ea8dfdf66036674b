//! Coordinate Reference System codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of the geographic CRS every vector layer is normalised to.
pub const WEB_MAP_EPSG: u32 = 4326;

/// CRS identifiers seen in the Assaba datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    #[default]
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// WGS84 / UTM zone 28N, used by the national district layers
    Epsg32628,
    /// WGS84 / UTM zone 29N
    Epsg32629,
    /// Any other EPSG code
    Epsg(u32),
}

impl CrsCode {
    /// Build from a numeric EPSG code.
    pub fn from_epsg(code: u32) -> Self {
        match code {
            4326 => CrsCode::Epsg4326,
            3857 | 900913 => CrsCode::Epsg3857,
            32628 => CrsCode::Epsg32628,
            32629 => CrsCode::Epsg32629,
            other => CrsCode::Epsg(other),
        }
    }

    /// Parse a CRS string.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:32628"
    /// - "CRS:84" (equivalent to EPSG:4326 with lon/lat axis order)
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        if normalized == "CRS:84" || normalized == "OGC:CRS84" {
            return Ok(CrsCode::Epsg4326);
        }

        let code = normalized
            .strip_prefix("EPSG:")
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;

        code.parse::<u32>()
            .map(CrsCode::from_epsg)
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg32628 => 32628,
            CrsCode::Epsg32629 => 32629,
            CrsCode::Epsg(code) => *code,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(CrsCode::parse("EPSG:4326").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("epsg:3857").unwrap(), CrsCode::Epsg3857);
        assert_eq!(CrsCode::parse("CRS:84").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("EPSG:32628").unwrap(), CrsCode::Epsg32628);
        assert_eq!(CrsCode::parse("EPSG:2056").unwrap(), CrsCode::Epsg(2056));
        assert!(CrsCode::parse("EPSG:abc").is_err());
        assert!(CrsCode::parse("WGS84").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for code in [CrsCode::Epsg4326, CrsCode::Epsg32628, CrsCode::Epsg(2056)] {
            assert_eq!(CrsCode::parse(&code.to_string()).unwrap(), code);
        }
        assert_eq!(CrsCode::default().to_string(), "EPSG:4326");
    }
}
