//! Custom error types for the analysis toolset.
//!
//! Input-validation failures are reported immediately with a descriptive
//! message. The external driver reads that message (and its stable code)
//! and adjusts its next call; nothing in this crate retries on its own.
//!
//! Errors are serializable so they can be handed back to the driver as a
//! structured observation.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the analysis toolset.
#[derive(Error, Debug)]
pub enum InsightError {
    /// The input table does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The input is not parseable as a delimited table.
    #[error("Failed to parse table: {0}")]
    Parse(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// The column exists but has the wrong kind for the requested operation.
    #[error("Column '{column}' is {actual}, expected {expected}")]
    InvalidColumnKind {
        column: String,
        expected: String,
        actual: String,
    },

    /// Writing or drawing a chart failed.
    #[error("Failed to render chart: {0}")]
    Render(String),

    /// A tool was invoked with missing or malformed arguments.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The requested tool is not part of the registry.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InsightError>,
    },
}

impl InsightError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InsightError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for [`InsightError::InvalidColumnKind`].
    pub fn invalid_kind(
        column: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        InsightError::InvalidColumnKind {
            column: column.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Get a stable error code for the calling driver.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::Parse(_) => "PARSE_ERROR",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidColumnKind { .. } => "INVALID_COLUMN_KIND",
            Self::Render(_) => "RENDER_ERROR",
            Self::InvalidArguments(_) => "INVALID_ARGUMENTS",
            Self::UnknownTool(_) => "UNKNOWN_TOOL",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the caller can fix this by changing its arguments.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::FileNotFound(_)
            | Self::Parse(_)
            | Self::ColumnNotFound(_)
            | Self::InvalidColumnKind { .. }
            | Self::InvalidArguments(_)
            | Self::UnknownTool(_) => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for InsightError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for InsightError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        InsightError::Render(err.to_string())
    }
}

/// Result type alias for toolset operations.
pub type Result<T> = std::result::Result<T, InsightError>;

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
        self.map_err(|e| InsightError::Polars(e).with_context(context))
    }
}
