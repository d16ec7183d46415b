// Color palettes for series and color-encoded grids

use plotters::style::RGBColor;

/// Default color for single-series charts
pub const DEFAULT_SERIES_COLOR: &str = "#1f77b4";

/// Piecewise-linear diverging color scale
#[derive(Debug, Clone, PartialEq)]
pub struct DivergingPalette {
    /// (position in [0, 1], color), sorted by position
    stops: Vec<(f64, RGBColor)>,
}

impl DivergingPalette {
    /// Blue to red through a light neutral gray at the midpoint
    pub fn coolwarm() -> Self {
        Self {
            stops: vec![
                (0.0, RGBColor(59, 76, 192)),
                (0.25, RGBColor(141, 176, 254)),
                (0.5, RGBColor(221, 220, 220)),
                (0.75, RGBColor(244, 154, 123)),
                (1.0, RGBColor(180, 4, 38)),
            ],
        }
    }

    /// Color at position `t`, clamped to [0, 1]
    pub fn at(&self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };

        for pair in self.stops.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if t <= p1 {
                let w = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };
                return RGBColor(lerp(c0.0, c1.0, w), lerp(c0.1, c1.1, w), lerp(c0.2, c1.2, w));
            }
        }
        self.stops.last().map(|s| s.1).unwrap_or(RGBColor(0, 0, 0))
    }

    /// Color for `value` on a scale spanning `vmin..=vmax`
    pub fn map(&self, value: f64, vmin: f64, vmax: f64) -> RGBColor {
        if vmax <= vmin {
            return self.at(0.5);
        }
        self.at((value - vmin) / (vmax - vmin))
    }
}

fn lerp(a: u8, b: u8, w: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * w).round() as u8
}

/// Format a color as `#rrggbb`
pub fn to_hex(color: RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

/// Relative luminance in [0, 1], used to pick readable annotation text
pub fn luminance(color: RGBColor) -> f64 {
    (0.299 * color.0 as f64 + 0.587 * color.1 as f64 + 0.114 * color.2 as f64) / 255.0
}
