//! Format-dispatching dataset ingestion.
//!
//! A file's format is resolved from its extension, then the matching
//! [`FormatLoader`] reads it into a DataFrame. Each loader keeps the source's
//! column order and native typing; no extra coercion happens here.
//!
//! | Extension        | Format        | Reader          |
//! |------------------|---------------|-----------------|
//! | `csv`            | Delimited     | polars CSV      |
//! | `xlsx`, `xls`    | Spreadsheet   | calamine        |
//! | `json`           | Records       | polars JSON     |
//! | `parquet`        | Columnar      | polars Parquet  |

mod formats;
mod spreadsheet;

pub use formats::{ColumnarLoader, DelimitedLoader, RecordsLoader};
pub use spreadsheet::{SheetSelector, SpreadsheetLoader};

use crate::error::{AnalyticsError, Result, ResultExt};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Source formats the engine can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Delimited,
    Spreadsheet,
    Records,
    Columnar,
}

impl FileFormat {
    /// Resolve a format from a bare extension (case-insensitive, no leading dot).
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Delimited),
            "xlsx" | "xls" => Ok(Self::Spreadsheet),
            "json" => Ok(Self::Records),
            "parquet" => Ok(Self::Columnar),
            _ => Err(AnalyticsError::UnsupportedFormat(extension.to_string())),
        }
    }

    /// Resolve a format from a file path. A path without an extension is unsupported.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Delimited => write!(f, "delimited text"),
            FileFormat::Spreadsheet => write!(f, "spreadsheet"),
            FileFormat::Records => write!(f, "structured records"),
            FileFormat::Columnar => write!(f, "columnar"),
        }
    }
}

/// Per-call ingestion options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Worksheet to read; ignored by non-spreadsheet formats.
    pub sheet: SheetSelector,
}

impl LoadOptions {
    pub fn with_sheet(mut self, sheet: SheetSelector) -> Self {
        self.sheet = sheet;
        self
    }
}

/// Reads one source format into a DataFrame.
pub trait FormatLoader: Send + Sync {
    /// The format this loader handles.
    fn format(&self) -> FileFormat;

    /// Read the file at `path`.
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<DataFrame>;
}

/// Stateless loader registry keyed by [`FileFormat`].
///
/// # Example
///
/// ```rust,ignore
/// use insight_engine::ingest::Ingester;
///
/// let df = Ingester::new().load("data/impressions.csv")?;
/// ```
pub struct Ingester {
    loaders: HashMap<FileFormat, Box<dyn FormatLoader>>,
}

impl Default for Ingester {
    fn default() -> Self {
        Self::new()
    }
}

impl Ingester {
    /// Create an ingester with a loader registered for every supported format.
    pub fn new() -> Self {
        let mut ingester = Self {
            loaders: HashMap::new(),
        };
        ingester.register(Box::new(DelimitedLoader));
        ingester.register(Box::new(SpreadsheetLoader));
        ingester.register(Box::new(RecordsLoader));
        ingester.register(Box::new(ColumnarLoader));
        ingester
    }

    /// Register a loader, replacing any loader for the same format.
    pub fn register(&mut self, loader: Box<dyn FormatLoader>) {
        self.loaders.insert(loader.format(), loader);
    }

    /// Load a file with default options (first worksheet for spreadsheets).
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        self.load_with(path, &LoadOptions::default())
    }

    /// Load a file with explicit options.
    pub fn load_with(&self, path: impl AsRef<Path>, options: &LoadOptions) -> Result<DataFrame> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;
        debug!("Resolved {} as {}", path.display(), format);

        let loader = self
            .loaders
            .get(&format)
            .ok_or_else(|| AnalyticsError::UnsupportedFormat(format.to_string()))?;

        std::fs::metadata(path)
            .map_err(AnalyticsError::from)
            .context(format!("Failed to open {}", path.display()))?;

        let df = loader
            .load(path, options)
            .context(format!("Failed to read {} as {}", path.display(), format))?;

        info!(
            "Loaded {}: {} rows x {} columns",
            path.display(),
            df.height(),
            df.width()
        );
        Ok(df)
    }
}
