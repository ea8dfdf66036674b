//! Shared pieces for SVG charts: tick selection, number formatting, text escaping.

/// Chart canvas size and margins in SVG user units (pixels).
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for Frame {
    fn default() -> Self {
        // 10x6 inch figure at 80 dpi
        Self {
            width: 800.0,
            height: 480.0,
            left: 80.0,
            right: 30.0,
            top: 50.0,
            bottom: 70.0,
        }
    }
}

impl Frame {
    pub fn plot_width(&self) -> f64 {
        self.width - self.left - self.right
    }

    pub fn plot_height(&self) -> f64 {
        self.height - self.top - self.bottom
    }

    /// Map a data value in `[lo, hi]` to an x pixel.
    pub fn x(&self, v: f64, lo: f64, hi: f64) -> f64 {
        self.left + scale(v, lo, hi) * self.plot_width()
    }

    /// Map a data value in `[lo, hi]` to a y pixel (up is larger).
    pub fn y(&self, v: f64, lo: f64, hi: f64) -> f64 {
        self.top + (1.0 - scale(v, lo, hi)) * self.plot_height()
    }
}

fn scale(v: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        (v - lo) / (hi - lo)
    } else {
        0.5
    }
}

/// Round tick positions covering `[lo, hi]`, about `target` of them.
///
/// The returned range (first, last tick) always contains `lo` and `hi`.
pub fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    if !lo.is_finite() || !hi.is_finite() {
        return vec![0.0, 1.0];
    }
    let (lo, hi) = if hi - lo < f64::EPSILON {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        (lo - pad, hi + pad)
    } else {
        (lo, hi)
    };

    let raw = (hi - lo) / target.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let start = (lo / step).floor() * step;
    let end = (hi / step).ceil() * step;
    let count = ((end - start) / step).round() as usize;
    (0..=count).map(|i| start + i as f64 * step).collect()
}

/// Compact label for a tick value.
pub fn format_tick(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && (a >= 1e6 || a < 1e-3) {
        format!("{:.1e}", v)
    } else if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        let s = format!("{:.3}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Escape text for inclusion in SVG/XML.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Opening `<svg>` element with a white background.
pub(crate) fn svg_open(frame: &Frame) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="DejaVu Sans, Arial, sans-serif"><rect x="0" y="0" width="{w}" height="{h}" fill="white"/>"#,
        w = frame.width,
        h = frame.height
    )
}

/// Title and axis labels.
pub(crate) fn svg_labels(frame: &Frame, title: &str, x_label: &str, y_label: &str) -> String {
    let cx = frame.left + frame.plot_width() / 2.0;
    let cy = frame.top + frame.plot_height() / 2.0;
    format!(
        concat!(
            r#"<text x="{cx}" y="{ty}" font-size="18" text-anchor="middle">{title}</text>"#,
            r#"<text x="{cx}" y="{xy}" font-size="14" text-anchor="middle">{xl}</text>"#,
            r#"<text x="20" y="{cy}" font-size="14" text-anchor="middle" transform="rotate(-90 20 {cy})">{yl}</text>"#,
        ),
        cx = cx,
        cy = cy,
        ty = frame.top - 20.0,
        xy = frame.height - 15.0,
        title = escape(title),
        xl = escape(x_label),
        yl = escape(y_label),
    )
}

/// Horizontal grid lines and y tick labels.
pub(crate) fn svg_y_axis(frame: &Frame, ticks: &[f64], grid: bool) -> String {
    let (lo, hi) = (ticks[0], ticks[ticks.len() - 1]);
    let mut out = String::new();
    for &t in ticks {
        let y = frame.y(t, lo, hi);
        if grid {
            out.push_str(&format!(
                r##"<line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="#dddddd" stroke-width="1"/>"##,
                frame.left,
                frame.left + frame.plot_width(),
            ));
        }
        out.push_str(&format!(
            r#"<text x="{}" y="{}" font-size="12" text-anchor="end">{}</text>"#,
            frame.left - 8.0,
            y + 4.0,
            escape(&format_tick(t)),
        ));
    }
    out.push_str(&format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="black" stroke-width="1"/>"#,
        frame.left,
        frame.top,
        frame.plot_width(),
        frame.plot_height()
    ));
    out
}
