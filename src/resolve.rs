use tracing::debug;

use crate::data::Dataset;
use crate::error::{ChartError, ChartResult};
use crate::ir::{Axis, AxisRole, ChartKind, ChartRequest, PlotLabels, RenderPlan, Series};

pub const HEATMAP_TITLE: &str = "Heatmap of correlations between numeric columns";

/// Turn a chart request into a render plan, or reject it.
///
/// Validation is limited to "the selected column exists" for every role the
/// chart kind uses. Ignored selections are never looked at, so they may name
/// anything. Data types are never checked against the chart kind.
pub fn resolve_chart(request: &ChartRequest, data: &Dataset) -> ChartResult<RenderPlan> {
    let kind = request.chart_kind;
    let shape = kind.shape();

    let primary = resolve_role(kind, Axis::X, shape.x, request.x_column.as_deref(), data)?;
    let secondary = resolve_role(kind, Axis::Y, shape.y, request.y_column.as_deref(), data)?;

    let matrix = match kind {
        ChartKind::Heatmap => Some(data.correlation_matrix()),
        _ => None,
    };

    let labels = resolve_labels(kind, primary.as_ref(), secondary.as_ref());

    debug!(
        %kind,
        x = primary.as_ref().map(|s| s.name.as_str()),
        y = secondary.as_ref().map(|s| s.name.as_str()),
        matrix = matrix.as_ref().map(|m| m.size()),
        "resolved chart request"
    );

    Ok(RenderPlan {
        kind,
        primary,
        secondary,
        matrix,
        labels,
    })
}

/// Resolve a single selection against its role in the dispatch table
fn resolve_role(
    kind: ChartKind,
    axis: Axis,
    role: AxisRole,
    selection: Option<&str>,
    data: &Dataset,
) -> ChartResult<Option<Series>> {
    if role == AxisRole::Ignored {
        return Ok(None);
    }
    let column = selection.ok_or(ChartError::MissingSelection { kind, axis })?;
    data.series(column).map(Some)
}

fn resolve_labels(kind: ChartKind, x: Option<&Series>, y: Option<&Series>) -> PlotLabels {
    match kind {
        ChartKind::Heatmap => PlotLabels {
            title: Some(HEATMAP_TITLE.to_string()),
            x: None,
            y: None,
        },
        ChartKind::Histogram => PlotLabels {
            title: None,
            x: x.map(|s| s.name.clone()),
            y: Some("Count".to_string()),
        },
        _ => PlotLabels {
            title: None,
            x: x.map(|s| s.name.clone()),
            y: y.map(|s| s.name.clone()),
        },
    }
}
