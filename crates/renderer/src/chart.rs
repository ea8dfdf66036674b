//! Time-series line charts rendered as SVG.

use chrono::{Datelike, NaiveDate};

use crate::axis::{self, Frame};

/// Point marker drawn at each observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// One plotted line.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub points: Vec<(NaiveDate, f64)>,
    pub marker: Marker,
    pub line: LineStyle,
    pub color: String,
}

impl Series {
    pub fn new(label: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
            marker: Marker::Circle,
            line: LineStyle::Solid,
            color: "#1f77b4".to_string(),
        }
    }

    pub fn with_style(mut self, marker: Marker, line: LineStyle, color: &str) -> Self {
        self.marker = marker;
        self.line = line;
        self.color = color.to_string();
        self
    }
}

/// A date-axis line chart with optional legend.
#[derive(Debug, Clone)]
pub struct TimeSeriesChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    pub legend: bool,
}

impl TimeSeriesChart {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            series: Vec::new(),
            legend: false,
        }
    }

    pub fn add_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_legend(mut self) -> Self {
        self.legend = true;
        self
    }

    fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.series.iter().flat_map(|s| s.points.iter().map(|(d, _)| *d));
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }

    /// Render the chart. Non-finite values are skipped; each series is drawn
    /// in the order its points were given.
    pub fn to_svg(&self) -> String {
        let frame = Frame::default();
        let mut svg = axis::svg_open(&frame);

        let values = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|(_, v)| *v))
            .filter(|v| v.is_finite());
        let (y_min, y_max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let y_ticks = if y_min.is_finite() {
            axis::nice_ticks(y_min, y_max, 6)
        } else {
            vec![0.0, 1.0]
        };
        let (y_lo, y_hi) = (y_ticks[0], y_ticks[y_ticks.len() - 1]);
        svg.push_str(&axis::svg_y_axis(&frame, &y_ticks, true));

        if let Some((start, end)) = self.date_range() {
            let (x_lo, x_hi) = (day_number(start), day_number(end));
            svg.push_str(&date_ticks(&frame, start, end));

            for series in &self.series {
                let pts: Vec<(f64, f64)> = series
                    .points
                    .iter()
                    .filter(|(_, v)| v.is_finite())
                    .map(|(d, v)| (frame.x(day_number(*d), x_lo, x_hi), frame.y(*v, y_lo, y_hi)))
                    .collect();
                svg.push_str(&polyline(&pts, series));
                for &(x, y) in &pts {
                    svg.push_str(&marker(x, y, series));
                }
            }

            if self.legend {
                svg.push_str(&self.legend_svg(&frame));
            }
        }

        svg.push_str(&axis::svg_labels(&frame, &self.title, &self.x_label, &self.y_label));
        svg.push_str("</svg>");
        svg
    }

    fn legend_svg(&self, frame: &Frame) -> String {
        let x = frame.left + frame.plot_width() - 150.0;
        let mut out = String::new();
        for (i, series) in self.series.iter().enumerate() {
            let y = frame.top + 20.0 + i as f64 * 20.0;
            out.push_str(&format!(
                r#"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="{}" stroke-width="2"{}/>"#,
                x,
                x + 30.0,
                series.color,
                dash_attr(series.line)
            ));
            out.push_str(&marker(x + 15.0, y, series));
            out.push_str(&format!(
                r#"<text x="{}" y="{}" font-size="12">{}</text>"#,
                x + 38.0,
                y + 4.0,
                axis::escape(&series.label)
            ));
        }
        out
    }
}

fn day_number(d: NaiveDate) -> f64 {
    d.num_days_from_ce() as f64
}

fn dash_attr(line: LineStyle) -> &'static str {
    match line {
        LineStyle::Solid => "",
        LineStyle::Dashed => r#" stroke-dasharray="8 5""#,
    }
}

fn polyline(pts: &[(f64, f64)], series: &Series) -> String {
    if pts.len() < 2 {
        return String::new();
    }
    let coords: Vec<String> = pts.iter().map(|(x, y)| format!("{:.2},{:.2}", x, y)).collect();
    format!(
        r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="1.5"{}/>"#,
        coords.join(" "),
        series.color,
        dash_attr(series.line)
    )
}

fn marker(x: f64, y: f64, series: &Series) -> String {
    match series.marker {
        Marker::Circle => format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="3.5" fill="{}"/>"#,
            x, y, series.color
        ),
        Marker::Square => format!(
            r#"<rect x="{:.2}" y="{:.2}" width="7" height="7" fill="{}"/>"#,
            x - 3.5,
            y - 3.5,
            series.color
        ),
    }
}

/// Month-aligned tick labels along the date axis.
fn date_ticks(frame: &Frame, start: NaiveDate, end: NaiveDate) -> String {
    let (x_lo, x_hi) = (day_number(start), day_number(end));
    let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    let step = [1, 2, 3, 6, 12, 24, 60]
        .into_iter()
        .find(|s| months / s <= 8)
        .unwrap_or(120);

    let mut out = String::new();
    let (mut year, mut month) = (start.year(), start.month() as i32);
    // first tick on a multiple of step months
    let offset = (month - 1) % step;
    if offset != 0 {
        month += step - offset;
    }
    loop {
        while month > 12 {
            month -= 12;
            year += 1;
        }
        let Some(date) = NaiveDate::from_ymd_opt(year, month as u32, 1) else {
            break;
        };
        if date > end {
            break;
        }
        if date >= start {
            let x = frame.x(day_number(date), x_lo, x_hi);
            let label = if step >= 12 {
                date.format("%Y").to_string()
            } else {
                date.format("%Y-%m").to_string()
            };
            out.push_str(&format!(
                r#"<text x="{:.2}" y="{}" font-size="12" text-anchor="middle">{}</text>"#,
                x,
                frame.top + frame.plot_height() + 18.0,
                label
            ));
        }
        month += step;
    }
    out
}
