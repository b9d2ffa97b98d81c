//! Configuration types for the analytics engine.
//!
//! Options follow the builder pattern and can also be loaded from a JSON file,
//! which is how the CLI accepts metric definitions.

use crate::error::{AnalyticsError, Result};
use crate::kpi::MetricConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Strategy for resolving missing cells during cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Drop every row that contains at least one missing cell
    #[default]
    Drop,
    /// Propagate the nearest preceding value, per column
    ForwardFill,
    /// Fill numeric columns with their mean; other columns keep their gaps
    Mean,
    /// Leave missing cells untouched
    Keep,
}

impl MissingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::ForwardFill => "forward_fill",
            Self::Mean => "mean",
            Self::Keep => "keep",
        }
    }
}

impl fmt::Display for MissingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingStrategy {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "forward_fill" | "ffill" => Ok(Self::ForwardFill),
            "mean" => Ok(Self::Mean),
            "keep" | "none" => Ok(Self::Keep),
            other => Err(AnalyticsError::InvalidArgument(format!(
                "unknown missing-value strategy '{}' (expected drop, forward_fill, mean or keep)",
                other
            ))),
        }
    }
}

/// Join semantics for merging two datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JoinHow {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
}

impl FromStr for JoinHow {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(Self::Inner),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "outer" | "full" => Ok(Self::Outer),
            other => Err(AnalyticsError::InvalidArgument(format!(
                "unknown join type '{}' (expected inner, left, right or outer)",
                other
            ))),
        }
    }
}

/// Which datasets to merge and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    pub left: String,
    pub right: String,
    pub on: String,
    #[serde(default)]
    pub how: JoinHow,
}

/// Options for the standard cleaning sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningOptions {
    /// Remove duplicate rows, keeping the first occurrence.
    /// Default: true
    pub remove_duplicates: bool,

    /// Columns that define a duplicate. `None` compares whole rows.
    /// Default: None
    pub duplicate_subset: Option<Vec<String>>,

    /// How missing cells are resolved.
    /// Default: Drop
    pub missing_strategy: MissingStrategy,

    /// Lower-case column names and replace spaces with underscores.
    /// Default: true
    pub normalize_column_names: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            duplicate_subset: None,
            missing_strategy: MissingStrategy::default(),
            normalize_column_names: true,
        }
    }
}

/// Configuration for an analysis run.
///
/// Use [`AnalysisConfig::builder()`] for a fluent setup or
/// [`AnalysisConfig::from_json_file`] to read one from disk.
///
/// # Example
///
/// ```rust,ignore
/// use insight_engine::config::{AnalysisConfig, MissingStrategy};
///
/// let config = AnalysisConfig::builder()
///     .missing_strategy(MissingStrategy::Mean)
///     .group_by("app_code")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Cleaning applied to every loaded dataset.
    pub cleaning: CleaningOptions,

    /// Column whose distinct values drive the grouped breakdown.
    /// Default: None
    pub group_by: Option<String>,

    /// Whether IQR outlier detection runs.
    /// Default: true
    pub enable_outliers: bool,

    /// Fence multiplier for IQR outlier detection.
    /// Default: 1.5
    pub outlier_multiplier: f64,

    /// KPI definitions. `None` uses the default row-count and numeric-sum metrics.
    /// Default: None
    pub metrics: Option<Vec<MetricConfig>>,

    /// Column used for top/bottom leaderboards. `None` skips them.
    /// Default: None
    pub ranking_column: Option<String>,

    /// Leaderboard size.
    /// Default: 10
    pub top_n: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cleaning: CleaningOptions::default(),
            group_by: None,
            enable_outliers: true,
            outlier_multiplier: 1.5,
            metrics: None,
            ranking_column: None,
            top_n: 10,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Read and validate a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.outlier_multiplier.is_finite() || self.outlier_multiplier <= 0.0 {
            return Err(AnalyticsError::InvalidConfig(format!(
                "outlier_multiplier must be a positive number, got {}",
                self.outlier_multiplier
            )));
        }

        if self.top_n == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "top_n must be at least 1".to_string(),
            ));
        }

        if let Some(metrics) = &self.metrics {
            let mut seen = std::collections::HashSet::new();
            for metric in metrics {
                if metric.name.trim().is_empty() {
                    return Err(AnalyticsError::InvalidConfig(
                        "metric names must not be empty".to_string(),
                    ));
                }
                if !seen.insert(metric.name.as_str()) {
                    return Err(AnalyticsError::InvalidConfig(format!(
                        "duplicate metric name '{}'",
                        metric.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    remove_duplicates: Option<bool>,
    duplicate_subset: Option<Vec<String>>,
    missing_strategy: Option<MissingStrategy>,
    normalize_column_names: Option<bool>,
    group_by: Option<String>,
    enable_outliers: Option<bool>,
    outlier_multiplier: Option<f64>,
    metrics: Option<Vec<MetricConfig>>,
    ranking_column: Option<String>,
    top_n: Option<usize>,
}

impl AnalysisConfigBuilder {
    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Restrict duplicate detection to a subset of columns.
    pub fn duplicate_subset<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.duplicate_subset = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the missing-value strategy.
    pub fn missing_strategy(mut self, strategy: MissingStrategy) -> Self {
        self.missing_strategy = Some(strategy);
        self
    }

    /// Enable or disable column-name normalization.
    pub fn normalize_column_names(mut self, normalize: bool) -> Self {
        self.normalize_column_names = Some(normalize);
        self
    }

    /// Set the column used for grouped breakdowns.
    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by = Some(column.into());
        self
    }

    /// Enable or disable IQR outlier detection.
    pub fn enable_outliers(mut self, enable: bool) -> Self {
        self.enable_outliers = Some(enable);
        self
    }

    /// Set the IQR fence multiplier.
    pub fn outlier_multiplier(mut self, multiplier: f64) -> Self {
        self.outlier_multiplier = Some(multiplier);
        self
    }

    /// Replace the default KPI set.
    pub fn metrics(mut self, metrics: Vec<MetricConfig>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Produce top/bottom leaderboards ranked by this column.
    pub fn ranking_column(mut self, column: impl Into<String>) -> Self {
        self.ranking_column = Some(column.into());
        self
    }

    /// Set the leaderboard size.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<AnalysisConfig> {
        let defaults = CleaningOptions::default();
        let config = AnalysisConfig {
            cleaning: CleaningOptions {
                remove_duplicates: self.remove_duplicates.unwrap_or(defaults.remove_duplicates),
                duplicate_subset: self.duplicate_subset,
                missing_strategy: self.missing_strategy.unwrap_or_default(),
                normalize_column_names: self
                    .normalize_column_names
                    .unwrap_or(defaults.normalize_column_names),
            },
            group_by: self.group_by,
            enable_outliers: self.enable_outliers.unwrap_or(true),
            outlier_multiplier: self.outlier_multiplier.unwrap_or(1.5),
            metrics: self.metrics,
            ranking_column: self.ranking_column,
            top_n: self.top_n.unwrap_or(10),
        };

        config.validate()?;
        Ok(config)
    }
}
