//! KPI computation.
//!
//! Metrics are configured as `{name, type, params}` objects and dispatched over
//! the closed [`MetricKind`] set:
//!
//! - `ctr`: per-group click-through ratio keyed on the dataset's first column
//! - `aggregation`: `sum` / `mean` per numeric column, or `count` of rows
//! - `ratio`: sum of one column over the sum of another

mod metrics;

pub use metrics::KpiCalculator;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Aggregation applied by [`MetricKind::Aggregation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AggregationOp {
    #[default]
    Sum,
    Count,
    Mean,
}

/// What a metric computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum MetricKind {
    Ctr {
        click_col: String,
        impression_col: String,
    },
    Aggregation {
        #[serde(default)]
        operation: AggregationOp,
    },
    Ratio {
        numerator: String,
        denominator: String,
    },
}

/// A named metric definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMetricConfig", into = "RawMetricConfig")]
pub struct MetricConfig {
    pub name: String,
    pub kind: MetricKind,
}

impl MetricConfig {
    pub fn new(name: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Row count plus per-column sums, used when no metrics are configured.
    pub fn defaults() -> Vec<MetricConfig> {
        vec![
            MetricConfig::new(
                "total_volume",
                MetricKind::Aggregation {
                    operation: AggregationOp::Count,
                },
            ),
            MetricConfig::new(
                "total_value",
                MetricKind::Aggregation {
                    operation: AggregationOp::Sum,
                },
            ),
        ]
    }
}

/// Wire shape of a metric: `{"name": .., "type": .., "params": {..}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawMetricConfig {
    name: String,
    #[serde(rename = "type")]
    metric_type: String,
    #[serde(default)]
    params: Value,
}

impl TryFrom<RawMetricConfig> for MetricConfig {
    type Error = String;

    fn try_from(raw: RawMetricConfig) -> Result<Self, Self::Error> {
        let params = if raw.params.is_null() {
            json!({})
        } else {
            raw.params
        };
        let kind: MetricKind =
            serde_json::from_value(json!({"type": raw.metric_type, "params": params}))
                .map_err(|e| format!("metric '{}': {}", raw.name, e))?;
        Ok(MetricConfig {
            name: raw.name,
            kind,
        })
    }
}

impl From<MetricConfig> for RawMetricConfig {
    fn from(config: MetricConfig) -> Self {
        let (metric_type, params) = match config.kind {
            MetricKind::Ctr {
                click_col,
                impression_col,
            } => (
                "ctr",
                json!({"click_col": click_col, "impression_col": impression_col}),
            ),
            MetricKind::Aggregation { operation } => {
                ("aggregation", json!({"operation": operation}))
            }
            MetricKind::Ratio {
                numerator,
                denominator,
            } => (
                "ratio",
                json!({"numerator": numerator, "denominator": denominator}),
            ),
        };
        RawMetricConfig {
            name: config.name,
            metric_type: metric_type.to_string(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_metric_config_from_json() {
        let metrics: Vec<MetricConfig> = serde_json::from_str(
            r#"[
                {"name": "ctr_analysis", "type": "ctr",
                 "params": {"click_col": "is_click", "impression_col": "impression_id"}},
                {"name": "avg", "type": "aggregation", "params": {"operation": "mean"}},
                {"name": "total", "type": "aggregation"},
                {"name": "cpc", "type": "ratio",
                 "params": {"numerator": "cost", "denominator": "clicks"}}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            metrics[0].kind,
            MetricKind::Ctr {
                click_col: "is_click".to_string(),
                impression_col: "impression_id".to_string(),
            }
        );
        assert_eq!(
            metrics[1].kind,
            MetricKind::Aggregation {
                operation: AggregationOp::Mean
            }
        );
        assert_eq!(
            metrics[2].kind,
            MetricKind::Aggregation {
                operation: AggregationOp::Sum
            }
        );
        assert_eq!(metrics[3].name, "cpc");
    }

    #[test]
    fn test_unknown_metric_type_is_rejected() {
        let result: Result<MetricConfig, _> =
            serde_json::from_str(r#"{"name": "x", "type": "median", "params": {}}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("metric 'x'"));
    }

    #[test]
    fn test_metric_config_serializes_to_wire_shape() {
        let metric = MetricConfig::new(
            "cpc",
            MetricKind::Ratio {
                numerator: "cost".to_string(),
                denominator: "clicks".to_string(),
            },
        );
        let value = serde_json::to_value(&metric).unwrap();
        assert_eq!(
            value,
            json!({"name": "cpc", "type": "ratio",
                   "params": {"numerator": "cost", "denominator": "clicks"}})
        );
        let back: MetricConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back, metric);
    }

    #[test]
    fn test_default_metrics() {
        let names: Vec<String> = MetricConfig::defaults().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["total_volume", "total_value"]);
    }
}
