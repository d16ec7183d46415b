use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::ir::{ColorBar, DrawCommand, Scale, SceneGraph};
use crate::palette::DEFAULT_SERIES_COLOR;
use crate::{OutputFormat, MAX_DIMENSION};

const COLOR_BAR_WIDTH: u32 = 90;
const COLOR_BAR_STEPS: usize = 100;

/// Style configuration for line primitives
#[derive(Debug, Clone, Default)]
pub struct LineStyle {
    pub color: Option<String>,
    pub width: Option<f64>,
    pub alpha: Option<f64>,
}

/// Style configuration for point primitives
#[derive(Debug, Clone, Default)]
pub struct PointStyle {
    pub color: Option<String>,
    pub size: Option<f64>,
    pub alpha: Option<f64>,
}

/// Style configuration for filled rectangles (bars, boxes, grid cells)
#[derive(Debug, Clone, Default)]
pub struct BarStyle {
    pub color: Option<String>,
    pub alpha: Option<f64>,
    pub border: Option<String>,
}

/// Style configuration for text annotations
#[derive(Debug, Clone, Default)]
pub struct LabelStyle {
    pub color: Option<String>,
    pub size: Option<f64>,
}

/// Execute a scene graph and encode the result
pub fn render_scene(scene: &SceneGraph, format: &OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Png => render_png(scene),
        OutputFormat::Svg => render_svg(scene),
    }
}

/// Byte length of an RGB buffer for the given size
fn rgb_buffer_len(width: u32, height: u32) -> Result<usize> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        anyhow::bail!(
            "Image size {}x{} exceeds the {}px limit",
            width,
            height,
            MAX_DIMENSION
        );
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .with_context(|| format!("Image size {}x{} is too large", width, height))
}

fn render_png(scene: &SceneGraph) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; rgb_buffer_len(scene.width, scene.height)?];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height))
            .into_drawing_area();
        draw_scene(&root, scene)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, scene.width, scene.height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

fn render_svg(scene: &SceneGraph) -> Result<Vec<u8>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (scene.width, scene.height))
            .into_drawing_area();
        draw_scene(&root, scene)?;
        root.present().context("Failed to present drawing")?;
    }
    Ok(svg.into_bytes())
}

/// Draw a scene onto any plotters drawing surface
pub fn draw_scene<DB>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    match &scene.color_bar {
        Some(bar) => {
            let split = scene.width.saturating_sub(COLOR_BAR_WIDTH) as i32;
            let (plot_area, bar_area) = root.split_horizontally(split);
            draw_chart(&plot_area, scene)?;
            draw_color_bar(&bar_area, bar)?;
        }
        None => draw_chart(root, scene)?,
    }

    Ok(())
}

fn draw_chart<DB>(area: &DrawingArea<DB, Shift>, scene: &SceneGraph) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut builder = ChartBuilder::on(area);
    builder.margin(10).x_label_area_size(40).y_label_area_size(60);
    if let Some(title) = &scene.title {
        builder.caption(title, ("sans-serif", 20));
    }

    let mut chart = builder
        .build_cartesian_2d(
            scene.x_scale.range.0..scene.x_scale.range.1,
            scene.y_scale.range.0..scene.y_scale.range.1,
        )
        .context("Failed to build chart")?;

    let x_formatter = |v: &f64| format_tick(&scene.x_scale, *v);
    let y_formatter = |v: &f64| format_tick(&scene.y_scale, *v);

    let mut mesh = chart.configure_mesh();
    mesh.x_label_formatter(&x_formatter).y_label_formatter(&y_formatter);
    if scene.x_scale.is_categorical {
        mesh.x_labels(scene.x_scale.categories.len().max(1));
    }
    if scene.y_scale.is_categorical {
        mesh.y_labels(scene.y_scale.categories.len().max(1));
    }
    if let Some(label) = &scene.x_label {
        mesh.x_desc(label.as_str());
    }
    if let Some(label) = &scene.y_label {
        mesh.y_desc(label.as_str());
    }
    if !scene.show_grid {
        mesh.disable_x_mesh().disable_y_mesh();
    }
    mesh.draw().context("Failed to draw mesh")?;

    for command in &scene.commands {
        match command {
            DrawCommand::DrawLine { points, style } => {
                let color = parse_color(&style.color).mix(style.alpha.unwrap_or(1.0));
                let width = style.width.unwrap_or(1.0).round().max(1.0) as u32;
                chart
                    .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(width)))
                    .context("Failed to draw line series")?;
            }
            DrawCommand::DrawPoint { points, style } => {
                let color = parse_color(&style.color).mix(style.alpha.unwrap_or(1.0));
                let size = style.size.unwrap_or(3.0).round() as i32;
                chart
                    .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), size, color.filled())))
                    .context("Failed to draw point series")?;
            }
            DrawCommand::DrawRect { tl, br, style } => {
                let color = parse_color(&style.color).mix(style.alpha.unwrap_or(1.0));
                chart
                    .draw_series(std::iter::once(Rectangle::new([*tl, *br], color.filled())))
                    .context("Failed to draw rectangle")?;
                if let Some(border) = &style.border {
                    let border_color = parse_color(&Some(border.clone()));
                    chart
                        .draw_series(std::iter::once(Rectangle::new([*tl, *br], border_color.stroke_width(1))))
                        .context("Failed to draw rectangle border")?;
                }
            }
            DrawCommand::DrawText { pos, text, style } => {
                let color = parse_color(&style.color);
                let font = ("sans-serif", style.size.unwrap_or(12.0))
                    .into_font()
                    .color(&color)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                chart
                    .draw_series(std::iter::once(Text::new(text.clone(), *pos, font)))
                    .context("Failed to draw text")?;
            }
        }
    }

    Ok(())
}

/// Vertical gradient legend for a color-encoded grid
fn draw_color_bar<DB>(area: &DrawingArea<DB, Shift>, bar: &ColorBar) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut chart = ChartBuilder::on(area)
        .margin_top(40)
        .margin_bottom(50)
        .margin_right(20)
        .y_label_area_size(40)
        .build_cartesian_2d(0.0..1.0, bar.vmin..bar.vmax)
        .context("Failed to build color bar")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_labels(5)
        .y_label_formatter(&|v| format!("{:.1}", v))
        .draw()
        .context("Failed to draw color bar axis")?;

    let step = (bar.vmax - bar.vmin) / COLOR_BAR_STEPS as f64;
    chart
        .draw_series((0..COLOR_BAR_STEPS).map(|i| {
            let lo = bar.vmin + step * i as f64;
            let hi = lo + step;
            let color = bar.palette.map((lo + hi) / 2.0, bar.vmin, bar.vmax);
            Rectangle::new([(0.0, lo), (1.0, hi)], color.filled())
        }))
        .context("Failed to draw color bar")?;

    Ok(())
}

/// Tick label for a position on an axis. Categorical axes only label
/// integer positions that map to a category.
fn format_tick(scale: &Scale, value: f64) -> String {
    if scale.is_categorical {
        let idx = value.round();
        if (value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        return scale.categories.get(idx as usize).cloned().unwrap_or_default();
    }
    format_number(value)
}

/// Compact number formatting for axis ticks
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if !(1e-3..1e6).contains(&magnitude) {
        return format!("{:.1e}", value);
    }
    let text = format!("{:.3}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Parse a named or `#rrggbb` color string to RGBColor
pub fn parse_color(color_str: &Option<String>) -> RGBColor {
    match color_str.as_deref() {
        Some("red") => RED,
        Some("green") => GREEN,
        Some("blue") => BLUE,
        Some("black") => BLACK,
        Some("yellow") => YELLOW,
        Some("cyan") => CYAN,
        Some("magenta") => MAGENTA,
        Some("white") => WHITE,
        Some(hex) if hex.starts_with('#') && hex.len() == 7 => {
            parse_hex(&hex[1..]).unwrap_or_else(default_color)
        }
        _ => default_color(),
    }
}

fn parse_hex(digits: &str) -> Option<RGBColor> {
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

fn default_color() -> RGBColor {
    parse_hex(&DEFAULT_SERIES_COLOR[1..]).unwrap_or(BLUE)
}
