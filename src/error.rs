//! Error types for Synheart Motion

use crate::schema::SchemaError;
use thiserror::Error;

/// Errors that abort a pipeline run
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Input schema violation: {0}")]
    InputSchema(#[from] SchemaError),

    #[error("Filter instability: {0}")]
    FilterInstability(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Conditions that are reported but do not abort a run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineWarning {
    #[error("Insufficient data: {samples} samples is shorter than one window of {window} samples; no windows produced")]
    InsufficientData { samples: usize, window: usize },
}
