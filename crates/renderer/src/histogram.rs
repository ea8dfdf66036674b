//! Value-distribution histograms of raster bands.

use serde::Serialize;

use crate::axis::{self, Frame};

/// Bin count used when the caller does not ask for one.
pub const DEFAULT_BINS: usize = 50;

/// Upper bound on the bin count; larger requests are clamped.
pub const MAX_BINS: usize = 1000;

/// Equal-width histogram over the finite values of a band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges, ascending.
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins spanning their min..max.
    ///
    /// `bins` is clamped to `1..=MAX_BINS`. Non-finite values are skipped.
    /// The last bin includes the maximum.
    /// With no values the bins span 0..1 and are all empty; a constant band
    /// is centred in a unit-wide range.
    pub fn compute<I>(values: I, bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let bins = bins.clamp(1, MAX_BINS);
        let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();

        let (lo, hi) = finite
            .iter()
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .map(|(lo, hi)| if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) })
            .unwrap_or((0.0, 1.0));

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + i as f64 * width).collect();

        let mut counts = vec![0u64; bins];
        for v in finite {
            let i = (((v - lo) / width) as usize).min(bins - 1);
            counts[i] += 1;
        }

        Self { edges, counts }
    }

    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Render as an SVG bar chart.
    pub fn to_svg(&self, title: &str, x_label: &str) -> String {
        let frame = Frame::default();
        let (lo, hi) = (self.edges[0], self.edges[self.edges.len() - 1]);
        let max_count = self.counts.iter().copied().max().unwrap_or(0) as f64;
        let y_ticks = axis::nice_ticks(0.0, max_count.max(1.0), 5);
        let y_hi = y_ticks[y_ticks.len() - 1];

        let mut svg = axis::svg_open(&frame);
        svg.push_str(&axis::svg_y_axis(&frame, &y_ticks, true));

        for (i, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let x0 = frame.x(self.edges[i], lo, hi);
            let x1 = frame.x(self.edges[i + 1], lo, hi);
            let y = frame.y(count as f64, 0.0, y_hi);
            svg.push_str(&format!(
                r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="#636efa" stroke="white" stroke-width="0.5"/>"##,
                x0,
                y,
                (x1 - x0).max(0.5),
                frame.top + frame.plot_height() - y
            ));
        }

        for t in axis::nice_ticks(lo, hi, 6) {
            if t < lo || t > hi {
                continue;
            }
            svg.push_str(&format!(
                r#"<text x="{:.2}" y="{}" font-size="12" text-anchor="middle">{}</text>"#,
                frame.x(t, lo, hi),
                frame.top + frame.plot_height() + 18.0,
                axis::escape(&axis::format_tick(t))
            ));
        }

        svg.push_str(&axis::svg_labels(&frame, title, x_label, "count"));
        svg.push_str("</svg>");
        svg
    }
}
