use super::{AggregationOp, MetricConfig, MetricKind};
use crate::error::{AnalyticsError, Result, ResultExt};
use crate::types::{CtrGroup, CtrResult, KpiReport, KpiValue, MetricFailure};
use crate::utils::{
    any_value_to_json, numeric_column_names, numeric_column_values, require_column, round_to,
    summable_column_values,
};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Evaluates metric definitions against a dataset.
pub struct KpiCalculator;

impl KpiCalculator {
    /// Evaluate a batch of metrics.
    ///
    /// A metric that references a missing or unsuitable column is recorded in
    /// [`KpiReport::failures`] and the rest of the batch still runs. Any other
    /// error aborts the batch.
    pub fn calculate(df: &DataFrame, metrics: &[MetricConfig]) -> Result<KpiReport> {
        let mut report = KpiReport::default();
        for metric in metrics {
            match Self::evaluate(df, metric) {
                Ok(value) => {
                    report.metrics.insert(metric.name.clone(), value);
                }
                Err(e) if e.is_metric_scoped() => {
                    warn!("Metric '{}' failed: {}", metric.name, e);
                    report
                        .failures
                        .insert(metric.name.clone(), MetricFailure::from(&e));
                }
                Err(e) => return Err(e.with_context(format!("Metric '{}'", metric.name))),
            }
        }

        info!(
            "Calculated {} KPIs ({} failed)",
            report.metrics.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Evaluate a single metric.
    pub fn evaluate(df: &DataFrame, metric: &MetricConfig) -> Result<KpiValue> {
        debug!("Evaluating metric '{}'", metric.name);
        match &metric.kind {
            MetricKind::Ctr {
                click_col,
                impression_col,
            } => Ok(KpiValue::Ctr(Self::ctr(df, click_col, impression_col)?)),
            MetricKind::Aggregation { operation } => Self::aggregate(df, *operation),
            MetricKind::Ratio {
                numerator,
                denominator,
            } => Ok(KpiValue::Scalar(Self::ratio(df, numerator, denominator)?)),
        }
    }

    /// Click-through ratio grouped by the dataset's first column.
    ///
    /// Per group: `sum(click_col) / count(impression_col) * 100`, rounded to two
    /// decimals. Overall: `sum(click_col) / rows * 100`. Rows with a missing
    /// group key are left out of the breakdown but count towards the overall.
    pub fn ctr(df: &DataFrame, click_col: &str, impression_col: &str) -> Result<CtrResult> {
        let clicks = summable_column_values(df, click_col)?;
        require_column(df, impression_col)?;
        let group_col = df
            .get_columns()
            .first()
            .map(|c| c.name().to_string())
            .ok_or_else(|| {
                AnalyticsError::InvalidArgument("CTR needs at least one column".to_string())
            })?;

        let total_clicks: f64 = clicks.iter().flatten().sum();
        let overall_ctr = if df.height() == 0 {
            f64::NAN
        } else {
            total_clicks / df.height() as f64 * 100.0
        };

        let grouped = df
            .clone()
            .lazy()
            .filter(col(group_col.as_str()).is_not_null())
            .group_by_stable([col(group_col.as_str())])
            .agg([
                col(click_col).cast(DataType::Float64).sum().alias("__events"),
                col(impression_col).count().alias("__total"),
            ])
            .collect()
            .context(format!("Failed to group by '{}'", group_col))?;

        let keys = grouped.column(&group_col)?;
        let event_sums = grouped.column("__events")?.cast(&DataType::Float64)?;
        let total_counts = grouped.column("__total")?.cast(&DataType::UInt64)?;
        let event_sums = event_sums.f64()?;
        let total_counts = total_counts.u64()?;

        let mut groups = Vec::with_capacity(grouped.height());
        for row in 0..grouped.height() {
            let events = event_sums.get(row).unwrap_or(0.0);
            let total = total_counts.get(row).unwrap_or(0) as usize;
            let ctr = if total == 0 {
                f64::NAN
            } else {
                round_to(events / total as f64 * 100.0, 2)
            };
            groups.push(CtrGroup {
                key: any_value_to_json(&keys.get(row)?),
                events,
                total,
                ctr,
            });
        }

        Ok(CtrResult {
            overall_ctr,
            groups,
        })
    }

    /// `sum`/`mean` per numeric column, or the row count for `count`.
    pub fn aggregate(df: &DataFrame, operation: AggregationOp) -> Result<KpiValue> {
        if operation == AggregationOp::Count {
            return Ok(KpiValue::Count(df.height()));
        }

        let mut per_column = BTreeMap::new();
        for name in numeric_column_names(df) {
            let values = numeric_column_values(df, &name)?;
            let present: Vec<f64> = values.into_iter().flatten().collect();
            let sum: f64 = present.iter().sum();
            let value = match operation {
                AggregationOp::Sum => sum,
                _ if present.is_empty() => f64::NAN,
                _ => sum / present.len() as f64,
            };
            per_column.insert(name, value);
        }
        Ok(KpiValue::PerColumn(per_column))
    }

    /// `sum(numerator) / sum(denominator)`.
    pub fn ratio(df: &DataFrame, numerator: &str, denominator: &str) -> Result<f64> {
        require_column(df, numerator)?;
        require_column(df, denominator)?;
        let num: f64 = summable_column_values(df, numerator)?.into_iter().flatten().sum();
        let den: f64 = summable_column_values(df, denominator)?.into_iter().flatten().sum();
        Ok(num / den)
    }
}
