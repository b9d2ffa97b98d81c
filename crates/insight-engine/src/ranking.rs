//! Leaderboard and percentile bucketing helpers.

use crate::error::{AnalyticsError, Result};
use crate::utils::{numeric_column_values, quantile_sorted, sorted_present};
use polars::prelude::*;
use std::cmp::Ordering;

/// Stateless ranking functions over a single numeric column.
pub struct DataFrameHelper;

impl DataFrameHelper {
    /// The `n` rows with the largest values in `column`, ties kept in row order.
    ///
    /// Rows where `column` is missing are never selected.
    pub fn top_performers(df: &DataFrame, column: &str, n: usize) -> Result<DataFrame> {
        Self::ranked(df, column, n, |a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal))
    }

    /// The `n` rows with the smallest values in `column`, ties kept in row order.
    pub fn bottom_performers(df: &DataFrame, column: &str, n: usize) -> Result<DataFrame> {
        Self::ranked(df, column, n, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }

    fn ranked<F>(df: &DataFrame, column: &str, n: usize, order: F) -> Result<DataFrame>
    where
        F: Fn(&f64, &f64) -> Ordering,
    {
        let values = ranking_values(df, column)?;
        let mut present: Vec<(IdxSize, f64)> = values
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| v.map(|x| (idx as IdxSize, x)))
            .collect();
        present.sort_by(|(_, a), (_, b)| order(a, b));
        present.truncate(n);

        let indices: Vec<IdxSize> = present.into_iter().map(|(idx, _)| idx).collect();
        Ok(df.take(&IdxCa::from_vec("idx".into(), indices))?)
    }

    /// Assign every row to one of `segments` equal-frequency buckets by `column`.
    ///
    /// Bucket edges are the `k / segments` quantiles; each bucket is closed on the
    /// right and the first also includes the minimum. Rows with a missing value
    /// get `None`. Repeated edges (too few distinct values) are rejected.
    pub fn segment_by_percentile(
        df: &DataFrame,
        column: &str,
        segments: usize,
    ) -> Result<Vec<Option<usize>>> {
        if segments == 0 {
            return Err(AnalyticsError::InvalidArgument(
                "segment count must be at least 1".to_string(),
            ));
        }

        let values = ranking_values(df, column)?;
        let sorted = sorted_present(&values);
        if sorted.is_empty() {
            return Ok(vec![None; values.len()]);
        }

        let edges: Vec<f64> = (0..=segments)
            .map(|k| quantile_sorted(&sorted, k as f64 / segments as f64))
            .collect();
        if edges.windows(2).any(|w| w[0] == w[1]) {
            return Err(AnalyticsError::InvalidArgument(format!(
                "'{}' has too few distinct values for {} segments",
                column, segments
            )));
        }

        Ok(values
            .iter()
            .map(|v| {
                v.map(|x| {
                    edges[1..]
                        .iter()
                        .position(|edge| x <= *edge)
                        .unwrap_or(segments - 1)
                })
            })
            .collect())
    }
}

fn ranking_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    numeric_column_values(df, column).map_err(|e| match e {
        AnalyticsError::ColumnNotFound(name) => {
            AnalyticsError::InvalidArgument(format!("ranking column '{}' does not exist", name))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sellers() -> DataFrame {
        df!(
            "seller" => &["a", "b", "c", "d", "e"],
            "revenue" => &[Some(10.0), Some(30.0), None, Some(30.0), Some(5.0)],
        )
        .unwrap()
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.column("seller")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|s| s.unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_top_performers_stable() {
        let top = DataFrameHelper::top_performers(&sellers(), "revenue", 3).unwrap();
        assert_eq!(names(&top), vec!["b", "d", "a"]);
    }

    #[test]
    fn test_bottom_performers_skip_missing() {
        let bottom = DataFrameHelper::bottom_performers(&sellers(), "revenue", 10).unwrap();
        assert_eq!(names(&bottom), vec!["e", "a", "b", "d"]);
    }

    #[test]
    fn test_invalid_ranking_column() {
        let err = DataFrameHelper::top_performers(&sellers(), "profit", 3).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
        let err = DataFrameHelper::top_performers(&sellers(), "seller", 3).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_segment_by_percentile() {
        let df = df!(
            "value" => &[Some(1.0), Some(2.0), Some(3.0), Some(4.0), None, Some(5.0), Some(6.0), Some(7.0), Some(8.0)],
        )
        .unwrap();
        let labels = DataFrameHelper::segment_by_percentile(&df, "value", 4).unwrap();
        assert_eq!(
            labels,
            vec![Some(0), Some(0), Some(1), Some(1), None, Some(2), Some(2), Some(3), Some(3)]
        );
    }

    #[test]
    fn test_segment_rejects_duplicate_edges() {
        let df = df!("value" => &[1.0, 1.0, 1.0, 2.0]).unwrap();
        assert!(DataFrameHelper::segment_by_percentile(&df, "value", 4).is_err());
        assert!(DataFrameHelper::segment_by_percentile(&df, "value", 0).is_err());
    }
}
