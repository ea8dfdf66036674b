//! PNG output of heatmaps and charts.

use renderer::png::{create_png, create_png_auto};
use renderer::{heatmap_png, render_heatmap, svg_to_png, ColorRamp, Series, TimeSeriesChart};

use chrono::NaiveDate;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

fn dimensions(png: &[u8]) -> (u32, u32) {
    (
        u32::from_be_bytes([png[16], png[17], png[18], png[19]]),
        u32::from_be_bytes([png[20], png[21], png[22], png[23]]),
    )
}

fn color_type(png: &[u8]) -> u8 {
    png[25]
}

fn has_chunk(png: &[u8], name: &[u8; 4]) -> bool {
    png.windows(4).any(|w| w == name)
}

#[test]
fn test_few_colours_become_indexed() {
    // 2x2: red, green, transparent, red
    let pixels = [
        255, 0, 0, 255, 0, 255, 0, 255, //
        0, 0, 0, 0, 255, 0, 0, 255,
    ];
    let png = create_png_auto(&pixels, 2, 2).unwrap();
    assert_eq!(&png[..8], &SIGNATURE);
    assert_eq!(color_type(&png), 3);
    assert!(has_chunk(&png, b"PLTE"));
    assert!(has_chunk(&png, b"tRNS"));
    assert!(has_chunk(&png, b"IEND"));
}

#[test]
fn test_many_colours_stay_rgba() {
    let width = 300;
    let pixels: Vec<u8> = (0..width)
        .flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 7, 255])
        .collect();
    let png = create_png_auto(&pixels, width, 1).unwrap();
    assert_eq!(color_type(&png), 6);
    assert!(!has_chunk(&png, b"PLTE"));
}

#[test]
fn test_buffer_length_checked() {
    assert!(create_png(&[0u8; 12], 2, 2).is_err());
    assert!(create_png_auto(&[0u8; 15], 2, 2).is_err());
}

#[test]
fn test_landcover_heatmap_is_indexed_and_upscaled() {
    // four land cover classes plus a nodata cell
    let values = [7.0, 10.0, 12.0, 16.0, 255.0, 7.0];
    let heatmap = render_heatmap(&values, 3, 2, |v| v != 255.0, &ColorRamp::viridis());
    let png = heatmap_png(&heatmap, 4).unwrap();

    assert_eq!(dimensions(&png), (12, 8));
    assert_eq!(color_type(&png), 3);
    assert!(has_chunk(&png, b"tRNS"));
}

#[test]
fn test_chart_rasterised() {
    let points = vec![
        (NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(), 1.0),
        (NaiveDate::from_ymd_opt(2010, 6, 1).unwrap(), 3.0),
    ];
    let svg = TimeSeriesChart::new("Serie de Tiempo: NDVI (MODIS)", "Fecha", "NDVI (MODIS)")
        .add_series(Series::new("NDVI (MODIS)", points))
        .to_svg();
    let png = svg_to_png(&svg).unwrap();
    assert_eq!(&png[..8], &SIGNATURE);
    let (w, h) = dimensions(&png);
    assert!(w > 0 && h > 0);
}
