//! Image rendering for the Assaba dashboards.
//!
//! - False-colour heatmaps of raster bands (Viridis ramp)
//! - PNG encoding (indexed or RGBA)
//! - Histograms and time-series line charts as SVG
//! - SVG rasterisation to PNG

pub mod axis;
pub mod chart;
pub mod gradient;
pub mod histogram;
pub mod png;
pub mod raster;

pub use chart::{LineStyle, Marker, Series, TimeSeriesChart};
pub use gradient::{render_heatmap, Color, ColorRamp, Heatmap};
pub use histogram::{Histogram, DEFAULT_BINS, MAX_BINS};
pub use raster::svg_to_png;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("SVG error: {0}")]
    Svg(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Render a heatmap and encode it as PNG, upscaling small bands by `scale`.
pub fn heatmap_png(heatmap: &Heatmap, scale: usize) -> Result<Vec<u8>, RenderError> {
    if heatmap.width == 0 || heatmap.height == 0 {
        return Err(RenderError::InvalidDimensions {
            width: heatmap.width,
            height: heatmap.height,
        });
    }
    let scale = scale.max(1);
    let pixels = gradient::upscale_nearest(&heatmap.pixels, heatmap.width, heatmap.height, scale);
    png::create_png_auto(&pixels, heatmap.width * scale, heatmap.height * scale)
        .map_err(RenderError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heatmap_png_dimensions() {
        let values: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let heatmap = render_heatmap(&values, 4, 3, f64::is_finite, &ColorRamp::viridis());
        let png = heatmap_png(&heatmap, 2).unwrap();
        assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 8);
        assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 6);
    }

    #[test]
    fn test_empty_heatmap_rejected() {
        let heatmap = render_heatmap(&[], 0, 0, f64::is_finite, &ColorRamp::viridis());
        assert!(heatmap_png(&heatmap, 1).is_err());
    }
}
