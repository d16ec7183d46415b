use crate::graph::{BarStyle, LabelStyle, LineStyle, PointStyle};
use crate::ir::{BoxStats, ChartKind, ColorBar, CorrelationMatrix, DrawCommand, Marks, PanelScales, RenderData, RenderPlan, SceneGraph};
use crate::palette::{self, DivergingPalette, DEFAULT_SERIES_COLOR};
use crate::RenderOptions;

/// Color limits of the correlation grid
pub const HEATMAP_VMIN: f64 = -1.0;
pub const HEATMAP_VMAX: f64 = 1.0;

const BOX_WIDTH: f64 = 0.8;

// =============================================================================
// Boxplot Geometry Helpers
// =============================================================================

/// Computed geometry for a single boxplot, expressed as primitive shapes
struct BoxplotGeometry {
    lower_whisker: Vec<(f64, f64)>,
    upper_whisker: Vec<(f64, f64)>,
    min_cap: Vec<(f64, f64)>,
    max_cap: Vec<(f64, f64)>,
    box_tl: (f64, f64),
    box_br: (f64, f64),
    median_line: Vec<(f64, f64)>,
    outlier_points: Vec<(f64, f64)>,
}

/// Calculates primitive geometry for one vertical box
fn compute_boxplot_geometry(stats: &BoxStats, width: f64) -> BoxplotGeometry {
    let x = stats.x;
    let half_width = width / 2.0;
    let cap_half = width * 0.4 / 2.0;

    BoxplotGeometry {
        lower_whisker: vec![(x, stats.lower_whisker), (x, stats.q1)],
        upper_whisker: vec![(x, stats.q3), (x, stats.upper_whisker)],
        min_cap: vec![(x - cap_half, stats.lower_whisker), (x + cap_half, stats.lower_whisker)],
        max_cap: vec![(x - cap_half, stats.upper_whisker), (x + cap_half, stats.upper_whisker)],
        box_tl: (x - half_width, stats.q3),
        box_br: (x + half_width, stats.q1),
        median_line: vec![(x - half_width, stats.median), (x + half_width, stats.median)],
        outlier_points: stats.outliers.iter().map(|&v| (x, v)).collect(),
    }
}

/// Component styles for boxplot primitives: whiskers, box, median, outliers
fn boxplot_component_styles() -> (LineStyle, BarStyle, LineStyle, PointStyle) {
    let whisker_style = LineStyle {
        color: Some("#3f3f3f".to_string()),
        width: Some(1.5),
        alpha: None,
    };

    let box_style = BarStyle {
        color: Some(DEFAULT_SERIES_COLOR.to_string()),
        alpha: Some(0.8),
        border: Some("#3f3f3f".to_string()),
    };

    let median_style = LineStyle {
        color: Some("#3f3f3f".to_string()),
        width: Some(2.0),
        alpha: None,
    };

    let outlier_style = PointStyle {
        color: Some("#3f3f3f".to_string()),
        size: Some(3.0),
        alpha: Some(0.8),
    };

    (whisker_style, box_style, median_style, outlier_style)
}

fn series_line_style() -> LineStyle {
    LineStyle {
        color: Some(DEFAULT_SERIES_COLOR.to_string()),
        width: Some(2.0),
        alpha: None,
    }
}

// =============================================================================
// Mark Compilation
// =============================================================================

fn compile_boxes(boxes: &[BoxStats], commands: &mut Vec<DrawCommand>) {
    let (whisker_style, box_style, median_style, outlier_style) = boxplot_component_styles();

    for stats in boxes {
        let geom = compute_boxplot_geometry(stats, BOX_WIDTH);

        // Emit primitive commands in z-order
        for points in [geom.lower_whisker, geom.upper_whisker, geom.min_cap, geom.max_cap] {
            commands.push(DrawCommand::DrawLine { points, style: whisker_style.clone() });
        }
        commands.push(DrawCommand::DrawRect {
            tl: geom.box_tl,
            br: geom.box_br,
            style: box_style.clone(),
        });
        commands.push(DrawCommand::DrawLine {
            points: geom.median_line,
            style: median_style.clone(),
        });
        if !geom.outlier_points.is_empty() {
            commands.push(DrawCommand::DrawPoint {
                points: geom.outlier_points,
                style: outlier_style.clone(),
            });
        }
    }
}

/// One colored cell per matrix entry with its value written on top.
/// Row 0 is drawn at the top of the grid. Undefined entries stay blank.
fn compile_cells(matrix: &CorrelationMatrix, palette: &DivergingPalette, commands: &mut Vec<DrawCommand>) {
    let n = matrix.size();
    let text_size = if n <= 8 { 12.0 } else { 8.0 };

    for row in 0..n {
        let y = (n - 1 - row) as f64;
        for col in 0..n {
            let value = matrix.get(row, col);
            if value.is_nan() {
                continue;
            }
            let x = col as f64;
            let color = palette.map(value, HEATMAP_VMIN, HEATMAP_VMAX);

            commands.push(DrawCommand::DrawRect {
                tl: (x - 0.5, y + 0.5),
                br: (x + 0.5, y - 0.5),
                style: BarStyle {
                    color: Some(palette::to_hex(color)),
                    alpha: None,
                    border: Some("white".to_string()),
                },
            });

            let text_color = if palette::luminance(color) < 0.5 { "white" } else { "black" };
            commands.push(DrawCommand::DrawText {
                pos: (x, y),
                text: format_general(value, 2),
                style: LabelStyle {
                    color: Some(text_color.to_string()),
                    size: Some(text_size),
                },
            });
        }
    }
}

/// `%g`-style formatting: `precision` significant digits, scientific
/// notation outside [1e-4, 10^precision), trailing zeros removed
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let precision = precision.max(1);

    // Exponent after rounding to the requested digits
    let sci = format!("{:.*e}", precision - 1, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };

    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(&mantissa), sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value))
    }
}

fn trim_zeros(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}

/// Compile data and scales into a SceneGraph of drawing commands
pub fn compile_geometry(
    data: RenderData,
    scales: PanelScales,
    plan: &RenderPlan,
    options: &RenderOptions,
) -> SceneGraph {
    let mut commands = Vec::new();
    let mut color_bar = None;

    match data.marks {
        Marks::Points(points) => {
            commands.push(DrawCommand::DrawPoint {
                points,
                style: PointStyle {
                    color: Some(DEFAULT_SERIES_COLOR.to_string()),
                    size: Some(3.0),
                    alpha: Some(0.8),
                },
            });
        }
        Marks::Path(points) => {
            commands.push(DrawCommand::DrawLine { points, style: series_line_style() });
        }
        Marks::Bars { bars, overlay } => {
            // Histogram bins are translucent so the density curve reads on top
            let is_histogram = plan.kind == ChartKind::Histogram;
            let style = BarStyle {
                color: Some(DEFAULT_SERIES_COLOR.to_string()),
                alpha: Some(if is_histogram { 0.5 } else { 0.9 }),
                border: if is_histogram { Some("white".to_string()) } else { None },
            };
            for bar in &bars {
                let half_width = bar.width / 2.0;
                commands.push(DrawCommand::DrawRect {
                    tl: (bar.center - half_width, bar.height.max(0.0)),
                    br: (bar.center + half_width, bar.height.min(0.0)),
                    style: style.clone(),
                });
            }
            if !overlay.is_empty() {
                commands.push(DrawCommand::DrawLine { points: overlay, style: series_line_style() });
            }
        }
        Marks::Boxes(boxes) => compile_boxes(&boxes, &mut commands),
        Marks::Cells(matrix) => {
            let palette = DivergingPalette::coolwarm();
            compile_cells(&matrix, &palette, &mut commands);
            color_bar = Some(ColorBar {
                vmin: HEATMAP_VMIN,
                vmax: HEATMAP_VMAX,
                palette,
            });
        }
    }

    SceneGraph {
        width: options.width,
        height: options.height,
        title: plan.labels.title.clone(),
        x_label: plan.labels.x.clone(),
        y_label: plan.labels.y.clone(),
        x_scale: scales.x,
        y_scale: scales.y,
        show_grid: color_bar.is_none(),
        commands,
        color_bar,
    }
}
