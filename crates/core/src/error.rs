//! Error types for the lifecycle pipeline.

use lifecycle_sheet::SheetError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort a pipeline run.
///
/// Unparsable dates and unmatched keys are data conditions, not errors; they
/// show up as blank cells and in the run report.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required table is absent from the store. Raised before any write.
    #[error("Required table not found: {name}")]
    MissingTable { name: String },

    /// Invalid pipeline configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure in the underlying table store.
    #[error("Table store error: {0}")]
    Sheet(#[from] SheetError),

    /// Configuration file could not be decoded.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
