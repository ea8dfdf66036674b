//! Test support for the Assaba workspace.
//!
//! - `TempDataRoot`: a throwaway data directory laid out like production
//!   (`Admin_layers/`, `Modis_Land_Cover_Data/`, `Climate_Precipitation_Data/`, ...)
//! - GeoTIFF, GeoJSON and WKT-CSV writers backed by GDAL
//! - synthetic band generators with predictable cell values
//! - `assert_approx_eq!` / `assert_coords_approx_eq!`
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, RasterFixture, TempDataRoot};
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// Assert `|left - right| <= epsilon`, comparing as `f64`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: {} is not within {} of {} (diff {})",
                left, epsilon, right, diff
            );
        }
    }};
}

/// Assert two `(lon, lat)` pairs match within `epsilon`.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (x1, y1) = $left;
        let (x2, y2) = $right;
        $crate::assert_approx_eq!(x1, x2, $epsilon);
        $crate::assert_approx_eq!(y1, y2, $epsilon);
    }};
}
