// Library exports for dashplot

pub mod data;
pub mod error;
pub mod graph;
pub mod palette;
pub mod parser;
pub mod report;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod telemetry;

// Rendering pipeline
pub mod ir;
pub mod resolve;
pub mod transform;
pub mod scale;
pub mod compiler;

use anyhow::{Context, Result};
use serde::Deserialize;

pub use data::Dataset;
pub use error::{ChartError, ChartResult};
pub use ir::{ChartKind, ChartRequest, RenderPlan};
pub use session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Svg => "image/svg+xml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

/// Largest accepted width or height, in pixels
pub const MAX_DIMENSION: u32 = 16_384;

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 500 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}

impl RenderOptions {
    /// Parse options such as `{"width": 640, "type": "svg"}`
    pub fn from_json(text: &str) -> Result<Self> {
        let options: RenderOptions =
            serde_json::from_str(text).context("Invalid render options")?;
        if options.width == 0 || options.height == 0 {
            anyhow::bail!("Render options need a non-zero width and height");
        }
        if options.width > MAX_DIMENSION || options.height > MAX_DIMENSION {
            anyhow::bail!(
                "Render options width and height must be at most {}",
                MAX_DIMENSION
            );
        }
        Ok(options)
    }
}

/// An encoded chart image
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}
