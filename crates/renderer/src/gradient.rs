//! Colour ramps and false-colour heatmap rendering for raster bands.

use rayon::prelude::*;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Parse "#rrggbb" (or "rrggbb") into an opaque colour.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::new(r, g, b, 255))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)).round() as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)).round() as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)).round() as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)).round() as u8,
    )
}

/// Evenly spaced colour stops, interpolated linearly.
#[derive(Debug, Clone)]
pub struct ColorRamp {
    stops: Vec<Color>,
}

/// Viridis, sampled at ten evenly spaced positions.
const VIRIDIS: [&str; 10] = [
    "#440154", "#482878", "#3e4989", "#31688e", "#26828e", "#1f9e89", "#35b779", "#6ece58",
    "#b5de2b", "#fde725",
];

impl ColorRamp {
    /// Build a ramp from at least one stop.
    pub fn new(stops: Vec<Color>) -> Option<Self> {
        if stops.is_empty() {
            None
        } else {
            Some(Self { stops })
        }
    }

    pub fn viridis() -> Self {
        Self {
            stops: VIRIDIS.iter().filter_map(|h| Color::from_hex(h)).collect(),
        }
    }

    /// Colour at normalised position `t` (clamped to 0..=1).
    pub fn color_at(&self, t: f32) -> Color {
        let n = self.stops.len();
        if n == 1 {
            return self.stops[0];
        }
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (n - 1) as f32;
        let i = (scaled.floor() as usize).min(n - 2);
        interpolate_color(self.stops[i], self.stops[i + 1], scaled - i as f32)
    }

    pub fn stops(&self) -> &[Color] {
        &self.stops
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self::viridis()
    }
}

/// RGBA pixels of a rendered band together with the value range used.
#[derive(Debug, Clone)]
pub struct Heatmap {
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// `None` when the band has no valid cell.
    pub range: Option<(f64, f64)>,
}

/// Render a band as a false-colour heatmap.
///
/// `values` is row-major with `width * height` entries. Array row 0 becomes
/// the top scanline, so a north-up raster appears north-up. Cells for which
/// `is_valid` is false are fully transparent.
pub fn render_heatmap<F>(
    values: &[f64],
    width: usize,
    height: usize,
    is_valid: F,
    ramp: &ColorRamp,
) -> Heatmap
where
    F: Fn(f64) -> bool + Sync,
{
    let range = values
        .iter()
        .copied()
        .filter(|v| is_valid(*v))
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });

    let mut pixels = vec![0u8; width * height * 4];
    if let Some((min_val, max_val)) = range {
        let span = max_val - min_val;
        let span = if span.abs() < f64::EPSILON { 1.0 } else { span };

        pixels
            .par_chunks_mut(width.max(1) * 4)
            .enumerate()
            .for_each(|(row, out)| {
                for col in 0..width {
                    let Some(&value) = values.get(row * width + col) else {
                        continue;
                    };
                    if !is_valid(value) {
                        continue;
                    }
                    let color = ramp.color_at(((value - min_val) / span) as f32);
                    let px = col * 4;
                    out[px] = color.r;
                    out[px + 1] = color.g;
                    out[px + 2] = color.b;
                    out[px + 3] = color.a;
                }
            });
    }

    Heatmap {
        pixels,
        width,
        height,
        range,
    }
}

/// Upscale RGBA pixels by an integer factor (nearest neighbour).
pub fn upscale_nearest(pixels: &[u8], width: usize, height: usize, factor: usize) -> Vec<u8> {
    if factor <= 1 {
        return pixels.to_vec();
    }
    let out_width = width * factor;
    let mut out = Vec::with_capacity(out_width * height * factor * 4);
    for row in 0..height {
        let mut line = Vec::with_capacity(out_width * 4);
        for col in 0..width {
            let px = (row * width + col) * 4;
            for _ in 0..factor {
                line.extend_from_slice(&pixels[px..px + 4]);
            }
        }
        for _ in 0..factor {
            out.extend_from_slice(&line);
        }
    }
    out
}
