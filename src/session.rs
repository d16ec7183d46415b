use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::data::Dataset;
use crate::error::ChartResult;
use crate::ir::{ChartRequest, RenderPlan};
use crate::resolve::resolve_chart;
use crate::runtime::render_plan;
use crate::{Figure, RenderOptions};

/// One uploaded dataset plus the options every chart is rendered with.
///
/// A session never changes its dataset. Uploading new content builds a new
/// session; the caller keeps the old one when the upload fails.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Dataset,
    options: RenderOptions,
}

impl Session {
    /// Parse uploaded CSV content into a fresh session
    pub fn upload(content: &[u8], options: RenderOptions) -> ChartResult<Self> {
        let dataset = Dataset::from_csv_bytes(content)?;
        info!(
            columns = dataset.columns().len(),
            rows = dataset.rows(),
            "dataset uploaded"
        );
        Ok(Self { dataset, options })
    }

    /// Read a CSV file and upload it
    pub fn open(path: impl AsRef<Path>, options: RenderOptions) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Session::upload(&content, options)
            .with_context(|| format!("Failed to load {}", path.display()))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Validate a request against this session's dataset
    pub fn resolve(&self, request: &ChartRequest) -> ChartResult<RenderPlan> {
        resolve_chart(request, &self.dataset)
    }

    /// Resolve and render in one step
    pub fn render(&self, request: &ChartRequest) -> Result<Figure> {
        let plan = self.resolve(request)?;
        debug!(kind = %plan.kind, "rendering plan");
        render_plan(&plan, &self.options)
    }
}
