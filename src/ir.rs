use std::fmt;
use std::str::FromStr;

use crate::error::ChartError;
use crate::graph::{BarStyle, LabelStyle, LineStyle, PointStyle};
use crate::palette::DivergingPalette;

// =============================================================================
// Phase 0: Chart Request
// =============================================================================

/// The six supported visualization types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Scatter,
    Line,
    Bar,
    Histogram,
    Boxplot,
    Heatmap,
}

/// What a selected column is used for by a given chart kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRole {
    /// Categorical or continuous position (scatter)
    Position,
    /// Ordered axis, drawn in row order (line)
    Ordered,
    /// Category axis (bar)
    Category,
    /// Grouping axis, one box per group (boxplot)
    Grouping,
    /// The plotted values
    Value,
    /// Accepted but never read or validated
    Ignored,
}

/// Row of the dispatch table: roles of the x and y selections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindShape {
    pub x: AxisRole,
    pub y: AxisRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Scatter,
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Histogram,
        ChartKind::Boxplot,
        ChartKind::Heatmap,
    ];

    /// Dispatch table. Histogram ignores y and heatmap ignores both
    /// selections; neither is an error when supplied.
    pub fn shape(self) -> KindShape {
        use AxisRole::*;
        match self {
            ChartKind::Scatter => KindShape { x: Position, y: Position },
            ChartKind::Line => KindShape { x: Ordered, y: Value },
            ChartKind::Bar => KindShape { x: Category, y: Value },
            ChartKind::Histogram => KindShape { x: Value, y: Ignored },
            ChartKind::Boxplot => KindShape { x: Grouping, y: Value },
            ChartKind::Heatmap => KindShape { x: Ignored, y: Ignored },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChartKind::Scatter => "scatter",
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Histogram => "histogram",
            ChartKind::Boxplot => "boxplot",
            ChartKind::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChartKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ChartKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ChartError::UnknownChartKind {
                kind: wanted.to_string(),
            })
    }
}

/// A user's selection: two columns and a chart kind.
/// Replaced, never mutated, on every interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub x_column: Option<String>,
    pub y_column: Option<String>,
    pub chart_kind: ChartKind,
}

impl ChartRequest {
    pub fn new(chart_kind: ChartKind) -> Self {
        Self {
            x_column: None,
            y_column: None,
            chart_kind,
        }
    }

    pub fn x(mut self, column: impl Into<String>) -> Self {
        self.x_column = Some(column.into());
        self
    }

    pub fn y(mut self, column: impl Into<String>) -> Self {
        self.y_column = Some(column.into());
        self
    }
}

// =============================================================================
// Phase 1: Resolution
// =============================================================================

/// Values of one dataset column
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValues {
    /// Missing or unparseable cells are NaN
    Numeric(Vec<f64>),
    /// Missing cells are None
    Categorical(Vec<Option<String>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: SeriesValues,
}

impl Series {
    pub fn len(&self) -> usize {
        match &self.values {
            SeriesValues::Numeric(v) => v.len(),
            SeriesValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.values, SeriesValues::Numeric(_))
    }

    pub fn numeric(&self) -> Option<&[f64]> {
        match &self.values {
            SeriesValues::Numeric(v) => Some(v),
            SeriesValues::Categorical(_) => None,
        }
    }

    /// Every value as a category label. Numbers use their shortest
    /// display form; missing values map to None.
    pub fn category_keys(&self) -> Vec<Option<String>> {
        match &self.values {
            SeriesValues::Numeric(v) => v
                .iter()
                .map(|x| if x.is_nan() { None } else { Some(x.to_string()) })
                .collect(),
            SeriesValues::Categorical(v) => v.clone(),
        }
    }

    /// Every value as a number. Text that does not parse maps to NaN.
    pub fn as_numbers(&self) -> Vec<f64> {
        match &self.values {
            SeriesValues::Numeric(v) => v.clone(),
            SeriesValues::Categorical(v) => v
                .iter()
                .map(|s| {
                    s.as_deref()
                        .and_then(|s| s.trim().parse::<f64>().ok())
                        .unwrap_or(f64::NAN)
                })
                .collect(),
        }
    }
}

/// Pairwise Pearson correlation between the numeric columns of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` squared entries
    pub values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn size(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.columns.len() + col]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotLabels {
    pub title: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Fully resolved, ready-to-draw description of a chart
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub kind: ChartKind,
    /// x-role values (the value column for histograms)
    pub primary: Option<Series>,
    /// y-role values
    pub secondary: Option<Series>,
    /// Heatmap only
    pub matrix: Option<CorrelationMatrix>,
    pub labels: PlotLabels,
}

// =============================================================================
// Phase 2: Statistics
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum AxisData {
    Continuous,
    /// Category i is drawn at position i
    Categorical(Vec<String>),
}

/// Statistics-applied data, in data coordinates
#[derive(Debug, Clone)]
pub struct RenderData {
    pub x_axis: AxisData,
    pub y_axis: AxisData,
    pub marks: Marks,
}

#[derive(Debug, Clone)]
pub enum Marks {
    Points(Vec<(f64, f64)>),
    Path(Vec<(f64, f64)>),
    Bars {
        bars: Vec<Bar>,
        /// Smoothed density curve drawn over the bars (histograms)
        overlay: Vec<(f64, f64)>,
    },
    Boxes(Vec<BoxStats>),
    Cells(CorrelationMatrix),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub center: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub x: f64,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

// =============================================================================
// Phase 3: Scaling
// =============================================================================

#[derive(Debug, Clone)]
pub struct PanelScales {
    pub x: Scale,
    pub y: Scale,
}

#[derive(Debug, Clone)]
pub struct Scale {
    pub domain: (f64, f64), // Data min/max
    pub range: (f64, f64),  // Drawn coordinate min/max
    pub is_categorical: bool,
    pub categories: Vec<String>, // If categorical, maps index -> label
}

// =============================================================================
// Phase 4: Compilation (Scene Graph)
// =============================================================================

/// A list of primitive drawing commands.
/// The Backend just executes these blindly.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_scale: Scale,
    pub y_scale: Scale,
    pub show_grid: bool,
    pub commands: Vec<DrawCommand>,
    pub color_bar: Option<ColorBar>,
}

#[derive(Debug, Clone)]
pub enum DrawCommand {
    DrawLine {
        points: Vec<(f64, f64)>,
        style: LineStyle,
    },
    DrawPoint {
        points: Vec<(f64, f64)>,
        style: PointStyle,
    },
    DrawRect {
        // Top-Left, Bottom-Right
        tl: (f64, f64),
        br: (f64, f64),
        style: BarStyle,
    },
    DrawText {
        pos: (f64, f64),
        text: String,
        style: LabelStyle,
    },
}

/// Legend for a color-encoded grid
#[derive(Debug, Clone)]
pub struct ColorBar {
    pub vmin: f64,
    pub vmax: f64,
    pub palette: DivergingPalette,
}
