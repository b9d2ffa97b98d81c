//! Loaders backed by polars' own readers.

use super::{FileFormat, FormatLoader, LoadOptions};
use crate::error::Result;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Rows sampled for CSV schema inference.
const INFER_SCHEMA_ROWS: usize = 100;

/// Comma-delimited text with a header row.
pub struct DelimitedLoader;

impl FormatLoader for DelimitedLoader {
    fn format(&self) -> FileFormat {
        FileFormat::Delimited
    }

    fn load(&self, path: &Path, _options: &LoadOptions) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        Ok(df)
    }
}

/// A JSON array of flat objects, one object per row.
pub struct RecordsLoader;

impl FormatLoader for RecordsLoader {
    fn format(&self) -> FileFormat {
        FileFormat::Records
    }

    fn load(&self, path: &Path, _options: &LoadOptions) -> Result<DataFrame> {
        let file = File::open(path)?;
        Ok(JsonReader::new(file).finish()?)
    }
}

/// Apache Parquet.
pub struct ColumnarLoader;

impl FormatLoader for ColumnarLoader {
    fn format(&self) -> FileFormat {
        FileFormat::Columnar
    }

    fn load(&self, path: &Path, _options: &LoadOptions) -> Result<DataFrame> {
        let file = File::open(path)?;
        Ok(ParquetReader::new(file).finish()?)
    }
}
