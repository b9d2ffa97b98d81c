use crate::error::Result;
use crate::types::{MissingPattern, MissingPatterns, QualityReport};
use crate::utils::{categorical_column_names, distinct_rows, numeric_column_names};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub struct DataValidator;

impl DataValidator {
    /// Take a quality snapshot of `df`. Never mutates the dataset.
    pub fn assess(df: &DataFrame) -> Result<QualityReport> {
        let (rows, cols) = df.shape();
        let missing_values: usize = df.get_columns().iter().map(|c| c.null_count()).sum();
        let total_cells = rows * cols;
        let missing_percentage = if total_cells == 0 {
            0.0
        } else {
            missing_values as f64 / total_cells as f64 * 100.0
        };

        let duplicates = rows - distinct_rows(df, &[])?.height();

        let dtypes: BTreeMap<String, String> = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.dtype().to_string()))
            .collect();

        let report = QualityReport {
            shape: (rows, cols),
            missing_values,
            missing_percentage,
            duplicates,
            dtypes,
            numeric_columns: numeric_column_names(df),
            categorical_columns: categorical_column_names(df),
            memory_usage_mb: df.estimated_size() as f64 / BYTES_PER_MB,
        };

        debug!(
            "Quality snapshot: {} rows, {} columns, {} missing cells, {} duplicate rows",
            rows, cols, missing_values, duplicates
        );
        Ok(report)
    }

    /// Per-column missing count and percentage, for columns with at least one gap.
    pub fn detect_missing_patterns(df: &DataFrame) -> MissingPatterns {
        let rows = df.height();
        df.get_columns()
            .iter()
            .filter(|c| c.null_count() > 0)
            .map(|c| {
                let count = c.null_count();
                let pattern = MissingPattern {
                    count,
                    percentage: count as f64 / rows as f64 * 100.0,
                };
                (c.name().to_string(), pattern)
            })
            .collect()
    }
}
