//! Descriptive statistics and pairwise correlation over extracted column values.

use crate::types::ColumnStatistics;
use crate::utils::{quantile_sorted, sorted_present};

/// Statistics over one column's values; missing entries are skipped.
///
/// An all-missing column yields NaN everywhere. With a single value the
/// standard deviation is NaN and every other statistic equals that value.
pub fn column_statistics(values: &[Option<f64>]) -> ColumnStatistics {
    let sorted = sorted_present(values);
    let count = sorted.len();
    if count == 0 {
        return ColumnStatistics {
            count,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p25: f64::NAN,
            p75: f64::NAN,
        };
    }

    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count < 2 {
        f64::NAN
    } else {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count as f64 - 1.0)).sqrt()
    };

    ColumnStatistics {
        count,
        mean,
        median: quantile_sorted(&sorted, 0.5),
        std,
        min: sorted[0],
        max: sorted[count - 1],
        p25: quantile_sorted(&sorted, 0.25),
        p75: quantile_sorted(&sorted, 0.75),
    }
}

/// Pearson coefficient over rows where both values are present.
///
/// NaN when fewer than two complete pairs exist or either side has zero variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Self-correlation: exactly 1.0 unless the column has no variance.
pub fn self_correlation(values: &[Option<f64>]) -> f64 {
    let present = sorted_present(values);
    match (present.first(), present.last()) {
        (Some(lo), Some(hi)) if present.len() >= 2 && lo != hi => 1.0,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_column_statistics() {
        let stats = column_statistics(&some(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]));
        assert_eq!(stats.count, 6);
        assert!((stats.mean - 19.1666666).abs() < 1e-6);
        assert_eq!(stats.median, 3.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 100.0);
        assert_eq!(stats.p25, 2.25);
        assert_eq!(stats.p75, 4.75);
    }

    #[test]
    fn test_sample_standard_deviation() {
        let stats = column_statistics(&some(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]));
        assert!((stats.std - 2.138089935).abs() < 1e-6);
    }

    #[test]
    fn test_single_value_has_nan_std() {
        let stats = column_statistics(&[Some(42.0)]);
        assert!(stats.std.is_nan());
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.p75, 42.0);
    }

    #[test]
    fn test_all_missing_is_nan() {
        let stats = column_statistics(&[None, None]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.max.is_nan());
    }

    #[test]
    fn test_pearson() {
        let x = some(&[1.0, 2.0, 3.0, 4.0]);
        let y = some(&[2.0, 4.0, 6.0, 8.0]);
        let z = some(&[8.0, 6.0, 4.0, 2.0]);
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_uses_complete_pairs() {
        let x = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let y = vec![Some(1.0), Some(50.0), Some(3.0), None];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_is_nan() {
        let flat = some(&[5.0, 5.0, 5.0]);
        let x = some(&[1.0, 2.0, 3.0]);
        assert!(pearson(&flat, &x).is_nan());
        assert!(self_correlation(&flat).is_nan());
        assert_eq!(self_correlation(&x), 1.0);
    }
}
