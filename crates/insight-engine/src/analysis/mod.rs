//! Statistical analysis of cleaned datasets.
//!
//! This module provides:
//! - Summary statistics per numeric column (computed in parallel)
//! - IQR outlier detection, with identifier and binary columns excluded
//! - Pearson correlation matrices
//! - Grouped sum/mean/count breakdowns
//!
//! Sections whose preconditions are not met are not computed. [`AnalysisReport`]
//! leaves them as `None` and records why in `skipped`.

mod grouped;
mod outliers;
mod stats;

pub use grouped::grouped_breakdown;
pub use outliers::detect_outliers_iqr;
pub use stats::{column_statistics, pearson};

use crate::config::AnalysisConfig;
use crate::error::{AnalyticsError, Result};
use crate::types::{
    AnalysisReport, CorrelationMatrix, OutlierReport, SkippedSection, SummaryStatistics,
};
use crate::utils::{is_numeric_dtype, numeric_values};
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Knobs for a single [`StatisticalAnalyzer::analyze`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub group_by: Option<String>,
    pub enable_outliers: bool,
    pub outlier_multiplier: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            group_by: None,
            enable_outliers: true,
            outlier_multiplier: 1.5,
        }
    }
}

impl From<&AnalysisConfig> for AnalysisOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            group_by: config.group_by.clone(),
            enable_outliers: config.enable_outliers,
            outlier_multiplier: config.outlier_multiplier,
        }
    }
}

/// Numeric columns extracted once as `f64`, in column order.
type NumericColumns = Vec<(String, Vec<Option<f64>>)>;

fn extract_numeric(df: &DataFrame) -> Result<NumericColumns> {
    df.get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| {
            let values = numeric_values(c.as_materialized_series())?;
            Ok((c.name().to_string(), values))
        })
        .collect()
}

/// Stateless statistical analyzer.
pub struct StatisticalAnalyzer;

impl StatisticalAnalyzer {
    /// Mean, median, sample std, min, max and quartiles for every numeric column,
    /// in column order.
    pub fn summary_statistics(df: &DataFrame) -> Result<SummaryStatistics> {
        let columns = extract_numeric(df)?;
        Ok(Self::summarize(columns))
    }

    fn summarize(columns: NumericColumns) -> SummaryStatistics {
        let computed: Vec<_> = columns
            .into_par_iter()
            .map(|(name, values)| {
                let stats = column_statistics(&values);
                (name, stats)
            })
            .collect();
        computed.into_iter().collect()
    }

    /// Pearson correlation between every pair of numeric columns.
    pub fn correlations(df: &DataFrame) -> Result<CorrelationMatrix> {
        let columns = extract_numeric(df)?;
        if columns.is_empty() {
            return Err(AnalyticsError::NoNumericColumns("correlation".to_string()));
        }
        Ok(Self::correlate(&columns))
    }

    fn correlate(columns: &NumericColumns) -> CorrelationMatrix {
        let k = columns.len();
        let values: Vec<Vec<f64>> = (0..k)
            .into_par_iter()
            .map(|i| {
                (0..k)
                    .map(|j| {
                        if i == j {
                            stats::self_correlation(&columns[i].1)
                        } else {
                            pearson(&columns[i].1, &columns[j].1)
                        }
                    })
                    .collect()
            })
            .collect();

        CorrelationMatrix {
            columns: columns.iter().map(|(name, _)| name.clone()).collect(),
            values,
        }
    }

    /// IQR outliers for every eligible numeric column.
    ///
    /// Returns the per-column reports plus the names of numeric columns that
    /// were excluded as identifiers or binary flags.
    pub fn filtered_outliers(
        df: &DataFrame,
        multiplier: f64,
    ) -> Result<(BTreeMap<String, OutlierReport>, Vec<String>)> {
        let columns = extract_numeric(df)?;
        Ok(Self::outliers_for(&columns, multiplier))
    }

    fn outliers_for(
        columns: &NumericColumns,
        multiplier: f64,
    ) -> (BTreeMap<String, OutlierReport>, Vec<String>) {
        let (eligible, excluded): (Vec<_>, Vec<_>) = columns
            .iter()
            .partition(|(name, values)| outliers::is_outlier_candidate(name, values));

        let reports = eligible
            .into_par_iter()
            .map(|(name, values)| {
                (name.clone(), outliers::outliers_in_values(values, multiplier))
            })
            .collect();
        let excluded = excluded.into_iter().map(|(name, _)| name.clone()).collect();
        (reports, excluded)
    }

    /// Full analysis of one dataset.
    ///
    /// Summary statistics always run. Outliers run when enabled and at least one
    /// column qualifies; correlations need two numeric columns; the grouped
    /// breakdown needs `group_by` to name an existing column.
    pub fn analyze(
        df: &DataFrame,
        dataset: &str,
        options: &AnalysisOptions,
    ) -> Result<AnalysisReport> {
        if !options.outlier_multiplier.is_finite() || options.outlier_multiplier < 0.0 {
            return Err(AnalyticsError::InvalidArgument(format!(
                "IQR multiplier must be a non-negative number, got {}",
                options.outlier_multiplier
            )));
        }

        info!("Analyzing dataset '{}' ({} rows)", dataset, df.height());
        let columns = extract_numeric(df)?;
        let mut skipped = Vec::new();

        let summary_stats = Self::summarize(columns.clone());
        debug!("Computed summary statistics for {} columns", summary_stats.len());

        let (outliers, outlier_excluded_columns) = if !options.enable_outliers {
            skipped.push(SkippedSection::new("outliers", "outlier detection disabled"));
            (None, Vec::new())
        } else {
            let (reports, excluded) = Self::outliers_for(&columns, options.outlier_multiplier);
            if reports.is_empty() {
                skipped.push(SkippedSection::new(
                    "outliers",
                    "no numeric columns eligible for IQR detection",
                ));
                (None, excluded)
            } else {
                let flagged: usize = reports.values().map(|r| r.stats.outlier_count).sum();
                debug!("Flagged {} outliers across {} columns", flagged, reports.len());
                (Some(reports), excluded)
            }
        };

        let correlations = if columns.len() >= 2 {
            Some(Self::correlate(&columns))
        } else {
            skipped.push(SkippedSection::new(
                "correlations",
                format!("needs at least two numeric columns, found {}", columns.len()),
            ));
            None
        };

        let grouped = match options.group_by.as_deref() {
            None => None,
            Some(by) if df.column(by).is_err() => {
                skipped.push(SkippedSection::new(
                    "grouped",
                    format!("group column '{}' not found", by),
                ));
                None
            }
            Some(by) => Some(grouped_breakdown(df, by)?),
        };

        for section in &skipped {
            warn!("Skipped {} for '{}': {}", section.section, dataset, section.reason);
        }

        Ok(AnalysisReport {
            dataset: dataset.to_string(),
            row_count: df.height(),
            summary_stats,
            outliers,
            outlier_excluded_columns,
            correlations,
            grouped,
            skipped,
        })
    }
}
