use thiserror::Error;

use crate::ir::{Axis, ChartKind};

pub type ChartResult<T> = Result<T, ChartError>;

/// Failures scoped to a single interaction (upload or chart request).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("parse error: {message}")]
    Parse { message: String },

    #[error("column '{column}' not found in dataset")]
    UnknownColumn { column: String },

    #[error("unknown chart kind '{kind}' (expected one of: scatter, line, bar, histogram, boxplot, heatmap)")]
    UnknownChartKind { kind: String },

    #[error("{kind} chart requires a {axis} column")]
    MissingSelection { kind: ChartKind, axis: Axis },
}

impl ChartError {
    pub fn parse(message: impl Into<String>) -> Self {
        ChartError::Parse {
            message: message.into(),
        }
    }

    pub fn unknown_column(column: impl Into<String>) -> Self {
        ChartError::UnknownColumn {
            column: column.into(),
        }
    }
}

impl From<csv::Error> for ChartError {
    fn from(err: csv::Error) -> Self {
        ChartError::parse(err.to_string())
    }
}
