//! IQR outlier detection.

use crate::error::{AnalyticsError, Result};
use crate::types::{OutlierBounds, OutlierReport};
use crate::utils::{is_numeric_dtype, numeric_values, quantile_sorted, sorted_present};
use polars::prelude::*;

/// Flag every value strictly outside `[Q1 - k*IQR, Q3 + k*IQR]`.
///
/// Indices are row positions in `series`, ascending. Missing values are never
/// flagged. An all-missing column returns no indices and NaN bounds.
pub fn detect_outliers_iqr(series: &Series, multiplier: f64) -> Result<OutlierReport> {
    if !is_numeric_dtype(series.dtype()) {
        return Err(AnalyticsError::NoNumericColumns(format!(
            "outlier detection on '{}' ({})",
            series.name(),
            series.dtype()
        )));
    }
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(AnalyticsError::InvalidArgument(format!(
            "IQR multiplier must be a non-negative number, got {}",
            multiplier
        )));
    }

    let values = numeric_values(series)?;
    Ok(outliers_in_values(&values, multiplier))
}

pub(crate) fn outliers_in_values(values: &[Option<f64>], multiplier: f64) -> OutlierReport {
    let sorted = sorted_present(values);
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower_bound = q1 - multiplier * iqr;
    let upper_bound = q3 + multiplier * iqr;

    let indices: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(idx, v)| match v {
            Some(x) if *x < lower_bound || *x > upper_bound => Some(idx),
            _ => None,
        })
        .collect();

    OutlierReport {
        stats: OutlierBounds {
            q1,
            q3,
            iqr,
            lower_bound,
            upper_bound,
            outlier_count: indices.len(),
        },
        indices,
    }
}

/// Whether IQR detection is meaningful for a column.
///
/// Identifier-like names (containing "id", any case) and columns with two or
/// fewer distinct values are excluded.
pub(crate) fn is_outlier_candidate(name: &str, values: &[Option<f64>]) -> bool {
    if name.to_lowercase().contains("id") {
        return false;
    }
    let mut sorted = sorted_present(values);
    sorted.dedup();
    sorted.len() > 2
}
