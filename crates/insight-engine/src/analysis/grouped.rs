//! Per-group aggregates of numeric columns.

use crate::error::{Result, ResultExt};
use crate::types::{GroupRow, GroupStats, GroupedBreakdown};
use crate::utils::{any_value_to_json, numeric_column_names, numeric_values, require_column};
use polars::prelude::*;
use std::collections::BTreeMap;

fn agg_name(column: &str, stat: &str) -> String {
    format!("{}__{}", column, stat)
}

/// Sum, mean and count of every numeric column for each distinct value of `by`.
///
/// Groups appear in order of first appearance. Rows with a missing key are left
/// out. The group column itself is not aggregated.
pub fn grouped_breakdown(df: &DataFrame, by: &str) -> Result<GroupedBreakdown> {
    require_column(df, by)?;
    let targets: Vec<String> = numeric_column_names(df)
        .into_iter()
        .filter(|name| name != by)
        .collect();

    let mut exprs = Vec::with_capacity(targets.len() * 3);
    for name in &targets {
        let value = col(name.as_str()).cast(DataType::Float64);
        exprs.push(value.clone().sum().alias(agg_name(name, "sum")));
        exprs.push(value.clone().mean().alias(agg_name(name, "mean")));
        exprs.push(value.count().alias(agg_name(name, "count")));
    }

    let aggregated = df
        .clone()
        .lazy()
        .filter(col(by).is_not_null())
        .group_by_stable([col(by)])
        .agg(exprs)
        .collect()
        .context(format!("Failed to group by '{}'", by))?;

    let keys = aggregated.column(by)?;
    let mut stats_by_column: BTreeMap<&str, [Vec<Option<f64>>; 3]> = BTreeMap::new();
    for name in &targets {
        let read = |stat: &str| -> Result<Vec<Option<f64>>> {
            numeric_values(
                aggregated
                    .column(&agg_name(name, stat))?
                    .as_materialized_series(),
            )
        };
        stats_by_column.insert(name.as_str(), [read("sum")?, read("mean")?, read("count")?]);
    }

    let mut groups = Vec::with_capacity(aggregated.height());
    for row in 0..aggregated.height() {
        let columns = stats_by_column
            .iter()
            .map(|(name, [sum, mean, count])| {
                let stats = GroupStats {
                    sum: sum[row].unwrap_or(0.0),
                    mean: mean[row].unwrap_or(f64::NAN),
                    count: count[row].unwrap_or(0.0) as usize,
                };
                (name.to_string(), stats)
            })
            .collect();
        groups.push(GroupRow {
            key: any_value_to_json(&keys.get(row)?),
            columns,
        });
    }

    Ok(GroupedBreakdown {
        group_column: by.to_string(),
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grouped_breakdown() {
        let df = df!(
            "app_code" => &["b", "a", "b", "a", "c"],
            "clicks" => &[Some(1i64), Some(0), Some(1), None, Some(1)],
            "cost" => &[2.0, 1.0, 4.0, 3.0, 5.0],
        )
        .unwrap();
        let breakdown = grouped_breakdown(&df, "app_code").unwrap();

        assert_eq!(breakdown.group_column, "app_code");
        let keys: Vec<_> = breakdown.groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(keys, vec![json!("b"), json!("a"), json!("c")]);

        let b = &breakdown.groups[0].columns;
        assert_eq!(b["clicks"].sum, 2.0);
        assert_eq!(b["cost"].mean, 3.0);
        assert_eq!(b["cost"].count, 2);

        let a = &breakdown.groups[1].columns;
        assert_eq!(a["clicks"].count, 1);
        assert_eq!(a["clicks"].mean, 0.0);
    }

    #[test]
    fn test_numeric_group_column_is_not_aggregated() {
        let df = df!("tier" => &[1i64, 2, 1], "value" => &[1.0, 2.0, 3.0]).unwrap();
        let breakdown = grouped_breakdown(&df, "tier").unwrap();
        assert!(!breakdown.groups[0].columns.contains_key("tier"));
        assert_eq!(breakdown.groups[0].key, json!(1));
        assert_eq!(breakdown.groups[0].columns["value"].sum, 4.0);
    }

    #[test]
    fn test_missing_group_keys_are_left_out() {
        let df = df!(
            "app_code" => &[Some("a"), None, Some("a"), None],
            "cost" => &[1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        let breakdown = grouped_breakdown(&df, "app_code").unwrap();

        let keys: Vec<_> = breakdown.groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(keys, vec![json!("a")]);
        assert_eq!(breakdown.groups[0].columns["cost"].sum, 4.0);
    }

    #[test]
    fn test_unknown_group_column() {
        let df = df!("value" => &[1.0]).unwrap();
        let err = grouped_breakdown(&df, "region").unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }
}
