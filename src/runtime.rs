// Runtime executor for resolved chart plans

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::compiler;
use crate::graph;
use crate::ir::RenderPlan;
use crate::scale;
use crate::transform;
use crate::{Figure, RenderOptions};

/// Render a resolved plan to an encoded figure.
///
/// Pipeline: statistics -> scales -> scene graph -> backend.
pub fn render_plan(plan: &RenderPlan, options: &RenderOptions) -> Result<Figure> {
    let data = transform::apply_statistics(plan)
        .with_context(|| format!("Failed to compute {} statistics", plan.kind))?;

    let scales = scale::build_scales(&data);
    debug!(
        kind = %plan.kind,
        x_range = ?scales.x.range,
        y_range = ?scales.y.range,
        "built scales"
    );

    let scene = compiler::compile_geometry(data, scales, plan, options);
    debug!(commands = scene.commands.len(), "compiled scene graph");

    let bytes = graph::render_scene(&scene, &options.format)
        .with_context(|| format!("Failed to render {} chart", plan.kind))?;

    info!(
        kind = %plan.kind,
        format = ?options.format,
        bytes = bytes.len(),
        "rendered chart"
    );

    Ok(Figure {
        format: options.format,
        width: options.width,
        height: options.height,
        bytes,
    })
}
