//! Custom error types for the cleaning and report pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. The five
//! domain variants (`UnsupportedFormat`, `EmptyDataset`, `LoadFailure`,
//! `ImputationImpossible`, `ReportGenerationFailure`) are terminal for the
//! current run; the remaining variants wrap lower-level failures.
//!
//! Errors are serializable so a front end can receive a stable
//! `{code, message}` pair instead of formatting errors itself.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum EdaError {
    /// The upload's extension is not one the loader understands.
    #[error("Unsupported file format for '{0}': expected a .csv or .xlsx file")]
    UnsupportedFormat(String),

    /// The upload parsed but contains no rows (or no columns).
    #[error("Dataset '{0}' is empty")]
    EmptyDataset(String),

    /// Parsing the upload failed.
    #[error("Failed to load '{file}': {source}")]
    LoadFailure {
        file: String,
        #[source]
        source: anyhow::Error,
    },

    /// A column has no observed values to derive a fill value from.
    #[error("Cannot impute column '{column}': it contains no non-missing values")]
    ImputationImpossible { column: String },

    /// The output directory could not be created or a report step failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailure(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EdaError>,
    },
}

impl EdaError {
    /// Build a [`EdaError::LoadFailure`] from any error cause.
    pub fn load_failure(file: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        EdaError::LoadFailure {
            file: file.into(),
            source: source.into(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EdaError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::EmptyDataset(_) => "EMPTY_DATASET",
            Self::LoadFailure { .. } => "LOAD_FAILURE",
            Self::ImputationImpossible { .. } => "IMPUTATION_IMPOSSIBLE",
            Self::ReportGenerationFailure(_) => "REPORT_GENERATION_FAILURE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error came from the loading stage.
    pub fn is_load_error(&self) -> bool {
        match self {
            Self::UnsupportedFormat(_) | Self::EmptyDataset(_) | Self::LoadFailure { .. } => true,
            Self::WithContext { source, .. } => source.is_load_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for EdaError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EdaError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, EdaError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EdaError::Polars(e).with_context(context))
    }
}
