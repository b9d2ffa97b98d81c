//! Error types for the analytics engine.
//!
//! Every fallible operation in the crate returns [`AnalyticsError`]. Failures are
//! never retried internally; they propagate to the immediate caller, which decides
//! whether to skip a report section or abort the run.
//!
//! Errors are serializable as `{code, message}` so a downstream report layer can
//! embed them next to the partial results it did receive.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analytics engine.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// File extension is not in the ingestion table.
    #[error("Unsupported file format: '{0}'")]
    UnsupportedFormat(String),

    /// A logical dataset name was referenced before being loaded.
    #[error("Dataset '{0}' not loaded")]
    DatasetNotLoaded(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Malformed ranking, selection or cleaning request.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation that needs numeric data found none.
    #[error("No numeric columns available for {0}")]
    NoNumericColumns(String),

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

    /// Spreadsheet (xlsx/xls) reader error.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalyticsError>,
    },
}

impl AnalyticsError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalyticsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable code for consumers that branch on the failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::DatasetNotLoaded(_) => "DATASET_NOT_LOADED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::NoNumericColumns(_) => "NO_NUMERIC_COLUMNS",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Spreadsheet(_) => "SPREADSHEET_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Errors scoped to a single metric; the rest of a KPI batch keeps running.
    pub fn is_metric_scoped(&self) -> bool {
        match self {
            Self::ColumnNotFound(_) | Self::InvalidArgument(_) | Self::NoNumericColumns(_) => {
                true
            }
            Self::WithContext { source, .. } => source.is_metric_scoped(),
            _ => false,
        }
    }
}

impl Serialize for AnalyticsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalyticsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

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
        self.map_err(|e| AnalyticsError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            AnalyticsError::UnsupportedFormat("txt".to_string()).error_code(),
            "UNSUPPORTED_FORMAT"
        );
        assert_eq!(
            AnalyticsError::DatasetNotLoaded("main".to_string()).error_code(),
            "DATASET_NOT_LOADED"
        );
    }

    #[test]
    fn test_unsupported_format_names_extension() {
        let error = AnalyticsError::UnsupportedFormat("txt".to_string());
        assert!(error.to_string().contains("txt"));
    }

    #[test]
    fn test_metric_scoped() {
        assert!(AnalyticsError::ColumnNotFound("clicks".to_string()).is_metric_scoped());
        assert!(
            AnalyticsError::ColumnNotFound("clicks".to_string())
                .with_context("metric 'ctr'")
                .is_metric_scoped()
        );
        assert!(!AnalyticsError::DatasetNotLoaded("main".to_string()).is_metric_scoped());
    }

    #[test]
    fn test_error_serialization() {
        let error = AnalyticsError::ColumnNotFound("impressions".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("impressions"));
    }

    #[test]
    fn test_with_context_preserves_code() {
        let error =
            AnalyticsError::DatasetNotLoaded("items".to_string()).with_context("During merge");
        assert!(error.to_string().contains("During merge"));
        assert_eq!(error.error_code(), "DATASET_NOT_LOADED");
    }
}
