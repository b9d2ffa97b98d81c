//! Shared utilities for the analytics engine.
//!
//! Helpers used across ingestion, cleaning, analysis and KPI computation so that
//! "what counts as numeric" and "what counts as missing" are decided in one place.

use crate::error::{AnalyticsError, Result};
use polars::prelude::*;
use serde_json::Value;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Coarse classification of a column's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Text or categorical values
    Categorical,
    /// Boolean flags
    Boolean,
    /// Date, datetime and anything else
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        DtypeCategory::Categorical
    } else {
        DtypeCategory::Other
    }
}

/// Names of all numeric columns, in column order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

/// Names of all text/categorical columns, in column order.
pub fn categorical_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| get_dtype_category(col.dtype()) == DtypeCategory::Categorical)
        .map(|col| col.name().to_string())
        .collect()
}

/// Look up a column, mapping polars' lookup failure to [`AnalyticsError::ColumnNotFound`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| AnalyticsError::ColumnNotFound(name.to_string()))
}

/// Keep the first occurrence of every distinct row, in original order.
///
/// Rows are compared on `columns` only, or on every column when `columns` is empty.
/// Missing cells compare equal to each other.
pub fn distinct_rows(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    for name in columns {
        require_column(df, name)?;
    }
    if df.width() == 0 || df.height() == 0 {
        return Ok(df.clone());
    }

    let subset = (!columns.is_empty()).then_some(columns);
    Ok(df.unique_stable(subset, UniqueKeepStrategy::First, None)?)
}

// =============================================================================
// Numeric Extraction
// =============================================================================

/// Read a numeric series as `f64`, one entry per row.
///
/// Nulls and NaN both come back as `None`.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    let values = float_series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Read a numeric column as `f64`, failing if the column is not numeric.
pub fn numeric_column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = require_column(df, name)?;
    if !is_numeric_dtype(column.dtype()) {
        return Err(AnalyticsError::InvalidArgument(format!(
            "column '{}' is {} and not numeric",
            name,
            column.dtype()
        )));
    }
    numeric_values(column.as_materialized_series())
}

/// Like [`numeric_column_values`], but Boolean flags are accepted and read as 1/0.
pub fn summable_column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = require_column(df, name)?;
    if column.dtype() == &DataType::Boolean {
        return numeric_values(column.as_materialized_series());
    }
    numeric_column_values(df, name)
}

/// Non-missing values of a numeric series, sorted ascending.
pub fn sorted_present(values: &[Option<f64>]) -> Vec<f64> {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    present
}

/// Quantile of already-sorted values using linear interpolation between closest ranks.
///
/// Returns NaN for an empty slice.
pub fn quantile_sorted(values: &[f64], quantile: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let pos = quantile.clamp(0.0, 1.0) * (values.len() as f64 - 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return values[lower];
    }
    let weight = pos - lower as f64;
    values[lower] + (values[upper] - values[lower]) * weight
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// =============================================================================
// Value Conversion
// =============================================================================

/// Convert a polars cell into a plain JSON scalar.
///
/// Every integer and float width becomes a JSON number, so consumers never see
/// engine-specific boxed numeric types. Non-finite floats become `null`.
pub fn any_value_to_json(value: &AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String((*s).to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => Value::from(f64::from(*v)),
        AnyValue::Float64(v) => Value::from(*v),
        other => Value::String(other.to_string()),
    }
}

/// Serialize an `f64` so that NaN and infinities become `null`.
pub(crate) fn serialize_float<S>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

/// Serialize a name-to-float map, writing non-finite values as `null`.
pub(crate) fn serialize_float_map<S>(
    map: &std::collections::BTreeMap<String, f64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_map(
        map.iter()
            .map(|(k, v)| (k, Some(*v).filter(|x| x.is_finite()))),
    )
}

/// Serialize a float matrix row by row, writing non-finite values as `null`.
pub(crate) fn serialize_float_matrix<S>(
    rows: &[Vec<f64>],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(rows.iter().map(|row| {
        row.iter()
            .map(|v| Some(*v).filter(|x| x.is_finite()))
            .collect::<Vec<_>>()
    }))
}

/// Render every row of a dataset as a JSON object keyed by column name.
pub fn dataframe_to_records(df: &DataFrame) -> Result<Vec<serde_json::Map<String, Value>>> {
    let columns = df.get_columns();
    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let mut record = serde_json::Map::with_capacity(columns.len());
        for column in columns {
            let value = column.get(row)?;
            record.insert(column.name().to_string(), any_value_to_json(&value));
        }
        records.push(record);
    }
    Ok(records)
}

// =============================================================================
// Text Formatting
// =============================================================================

/// Format a number with thousands separators and fixed decimals (`1234.5` -> `1,234.50`).
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (formatted.clone(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Format a percentage value (`12.345` -> `12.35%`).
pub fn format_percentage(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    format!("{:.*}%", decimals, value)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float32));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_dtype_category() {
        assert_eq!(get_dtype_category(&DataType::UInt32), DtypeCategory::Numeric);
        assert_eq!(get_dtype_category(&DataType::String), DtypeCategory::Categorical);
        assert_eq!(get_dtype_category(&DataType::Boolean), DtypeCategory::Boolean);
        assert_eq!(get_dtype_category(&DataType::Date), DtypeCategory::Other);
    }

    #[test]
    fn test_distinct_rows() {
        let df = df!(
            "id" => &[1i64, 1, 2, 1],
            "tag" => &[Some("a"), Some("a"), None, Some("b")],
        )
        .unwrap();

        let all = distinct_rows(&df, &[]).unwrap();
        let tags: Vec<Option<&str>> = all.column("tag").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(tags, vec![Some("a"), None, Some("b")]);

        let by_id = distinct_rows(&df, &["id".to_string()]).unwrap();
        let ids: Vec<Option<i64>> = by_id.column("id").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);

        let err = distinct_rows(&df, &["nope".to_string()]).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_distinct_rows_compares_full_float_precision() {
        let df = df!("revenue" => &[0.12345671, 0.12345672, 1234567.1, 1234567.2, 1234567.2]).unwrap();
        let result = distinct_rows(&df, &[]).unwrap();

        let revenue: Vec<Option<f64>> =
            result.column("revenue").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(
            revenue,
            vec![Some(0.12345671), Some(0.12345672), Some(1234567.1), Some(1234567.2)]
        );
    }

    #[test]
    fn test_numeric_values_treats_nan_as_missing() {
        let series = Series::new("x".into(), &[Some(1.0), None, Some(f64::NAN), Some(4.0)]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(1.0), None, None, Some(4.0)]);
    }

    #[test]
    fn test_numeric_column_values_rejects_text() {
        let df = df!("name" => &["a", "b"]).unwrap();
        let err = numeric_column_values(&df, "name").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");

        let err = numeric_column_values(&df, "missing").unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_summable_column_values_reads_flags() {
        let df = df!(
            "is_click" => &[Some(true), Some(false), None],
            "name" => &["a", "b", "c"],
        )
        .unwrap();
        assert_eq!(
            summable_column_values(&df, "is_click").unwrap(),
            vec![Some(1.0), Some(0.0), None]
        );
        let err = summable_column_values(&df, "name").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_quantile_sorted_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        assert!((quantile_sorted(&values, 0.25) - 2.25).abs() < 1e-12);
        assert!((quantile_sorted(&values, 0.75) - 4.75).abs() < 1e-12);
        assert!((quantile_sorted(&values, 0.5) - 3.5).abs() < 1e-12);
        assert!(quantile_sorted(&[], 0.5).is_nan());
        assert_eq!(quantile_sorted(&[7.0], 0.9), 7.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(33.33333, 2), 33.33);
        assert_eq!(round_to(66.666, 2), 66.67);
    }

    #[test]
    fn test_any_value_to_json() {
        assert_eq!(any_value_to_json(&AnyValue::Int64(3)), serde_json::json!(3));
        assert_eq!(any_value_to_json(&AnyValue::UInt32(7)), serde_json::json!(7));
        assert_eq!(any_value_to_json(&AnyValue::Float64(1.5)), serde_json::json!(1.5));
        assert_eq!(any_value_to_json(&AnyValue::String("web")), serde_json::json!("web"));
        assert_eq!(any_value_to_json(&AnyValue::Null), Value::Null);
        assert_eq!(any_value_to_json(&AnyValue::Float64(f64::NAN)), Value::Null);
    }

    #[test]
    fn test_dataframe_to_records() {
        let df = df!(
            "platform" => &["web", "ios"],
            "clicks" => &[3i64, 5],
        )
        .unwrap();
        let records = dataframe_to_records(&df).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["platform"], serde_json::json!("ios"));
        assert_eq!(records[1]["clicks"], serde_json::json!(5));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1234.5, 1), "-1,234.5");
        assert_eq!(format_number(12.0, 0), "12");
        assert_eq!(format_number(f64::NAN, 2), "n/a");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(12.346, 2), "12.35%");
        assert_eq!(format_percentage(50.0, 1), "50.0%");
    }
}
