//! Dataset cleaning.
//!
//! This module provides:
//! - Duplicate row removal (first occurrence kept, optional column subset)
//! - Missing value resolution (drop, forward fill, mean, keep)
//! - Column name normalization (lower case, spaces to underscores)
//!
//! Every operation consumes a DataFrame and returns the new canonical copy.

use crate::config::{CleaningOptions, MissingStrategy};
use crate::error::{AnalyticsError, Result};
use crate::quality::DataValidator;
use crate::types::QualityRecord;
use crate::utils::{distinct_rows, is_numeric_dtype, numeric_values};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// Stateless dataset cleaner.
pub struct DataCleaner;

impl DataCleaner {
    /// Run the standard cleaning sequence and capture before/after quality.
    ///
    /// 1. Assess quality
    /// 2. Remove duplicates (if enabled)
    /// 3. Resolve missing values
    /// 4. Normalize column names (if enabled)
    /// 5. Assess quality again and detect missing patterns on the result
    pub fn clean(df: DataFrame, options: &CleaningOptions) -> Result<(DataFrame, QualityRecord)> {
        let before = DataValidator::assess(&df)?;
        let mut df = df;

        if options.remove_duplicates {
            df = Self::remove_duplicates(df, options.duplicate_subset.as_deref())?;
        }
        df = Self::resolve_missing(df, options.missing_strategy)?;
        if options.normalize_column_names {
            df = Self::normalize_column_names(df)?;
        }

        let after = DataValidator::assess(&df)?;
        let missing_patterns = DataValidator::detect_missing_patterns(&df);

        info!(
            "Cleaned dataset: {} -> {} rows, {} -> {} missing cells",
            before.row_count(),
            after.row_count(),
            before.missing_values,
            after.missing_values
        );

        Ok((
            df,
            QualityRecord {
                before,
                after,
                missing_patterns,
            },
        ))
    }

    /// Drop repeated rows, keeping the first occurrence in original order.
    ///
    /// With `subset`, rows are compared on those columns only.
    pub fn remove_duplicates(df: DataFrame, subset: Option<&[String]>) -> Result<DataFrame> {
        let deduplicated = distinct_rows(&df, subset.unwrap_or_default())?;
        let removed = df.height() - deduplicated.height();
        if removed == 0 {
            debug!("No duplicate rows found");
            return Ok(df);
        }

        debug!("Removed {} duplicate rows", removed);
        Ok(deduplicated)
    }

    /// Resolve missing cells with the given strategy.
    pub fn resolve_missing(df: DataFrame, strategy: MissingStrategy) -> Result<DataFrame> {
        match strategy {
            MissingStrategy::Drop => Self::drop_incomplete_rows(df),
            MissingStrategy::ForwardFill => Self::forward_fill(df),
            MissingStrategy::Mean => Self::mean_fill(df),
            MissingStrategy::Keep => Ok(df),
        }
    }

    /// Lower-case every column name and replace spaces with underscores.
    pub fn normalize_column_names(mut df: DataFrame) -> Result<DataFrame> {
        let normalized: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_lowercase().replace(' ', "_"))
            .collect();

        let mut seen = HashSet::with_capacity(normalized.len());
        for name in &normalized {
            if !seen.insert(name.as_str()) {
                return Err(AnalyticsError::InvalidArgument(format!(
                    "column names collide after normalization: '{}'",
                    name
                )));
            }
        }

        df.set_column_names(normalized)?;
        Ok(df)
    }

    fn drop_incomplete_rows(df: DataFrame) -> Result<DataFrame> {
        let before = df.height();
        let df = df.drop_nulls::<String>(None)?;
        debug!("Dropped {} rows with missing values", before - df.height());
        Ok(df)
    }

    fn forward_fill(mut df: DataFrame) -> Result<DataFrame> {
        let targets: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|c| c.null_count() > 0)
            .map(|c| c.name().to_string())
            .collect();

        for name in targets {
            let series = df.column(&name)?.as_materialized_series().clone();
            let before = series.null_count();
            let filled = series.fill_null(FillNullStrategy::Forward(None))?;
            debug!("Forward filled {} cells in '{}'", before - filled.null_count(), name);
            df.replace(&name, filled)?;
        }
        Ok(df)
    }

    fn mean_fill(mut df: DataFrame) -> Result<DataFrame> {
        let numeric: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|c| is_numeric_dtype(c.dtype()))
            .map(|c| c.name().to_string())
            .collect();

        for name in numeric {
            let values = numeric_values(df.column(&name)?.as_materialized_series())?;
            let missing = values.iter().filter(|v| v.is_none()).count();
            if missing == 0 {
                continue;
            }

            let present: Vec<f64> = values.iter().flatten().copied().collect();
            if present.is_empty() {
                debug!("Column '{}' has no values to average; left unchanged", name);
                continue;
            }
            let mean = present.iter().sum::<f64>() / present.len() as f64;

            let filled: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(mean)).collect();
            df.replace(&name, Series::new(name.as_str().into(), filled))?;
            debug!("Filled {} cells in '{}' with mean {:.4}", missing, name, mean);
        }
        Ok(df)
    }
}
