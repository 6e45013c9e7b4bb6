//! Error types for the rental pipeline
//!
//! Every failure is fatal to the stage that hits it. Variants carry enough
//! context (artifact reference, column name, path) to identify the failing
//! operation from a single log line.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum Error {
    /// Registry backend cannot be reached or opened
    #[error("Registry connection failed: {0}")]
    ConnectionError(String),

    /// Credentials rejected by the registry
    #[error("Registry authentication failed: {0}")]
    AuthError(String),

    /// Artifact name, version, or alias does not exist
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// Artifact content could not be materialized locally
    #[error("Artifact download failed: {0}")]
    DownloadError(String),

    /// Artifact reference string is malformed
    #[error("Invalid artifact reference '{0}'")]
    InvalidReference(String),

    /// Malformed dataset or model bundle
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Dataset is structurally incompatible with the stage
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A required column is absent
    #[error("Schema error: missing required column '{column}'")]
    MissingColumn {
        /// Name of the absent column
        column: String,
    },

    /// Output artifact could not be registered or uploaded
    #[error("Publish failed: {0}")]
    PublishError(String),

    /// Model rejected the features it was given
    #[error("Prediction failed: {0}")]
    PredictionError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for [`Error::MissingColumn`].
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// True for the errors that mean the input data does not fit the stage.
    #[must_use]
    pub const fn is_schema_error(&self) -> bool {
        matches!(self, Self::SchemaError(_) | Self::MissingColumn { .. })
    }
}
