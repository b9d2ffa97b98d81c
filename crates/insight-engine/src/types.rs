//! Result types shared between the engine and its downstream consumers.
//!
//! Everything here serializes to plain JSON: integer and float cells are emitted
//! as JSON numbers, and NaN or infinite statistics are emitted as `null`.

use crate::utils::{serialize_float, serialize_float_map, serialize_float_matrix};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Quality Types
// ============================================================================

/// Point-in-time structural and missingness summary of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// `(rows, columns)`
    pub shape: (usize, usize),
    /// Total count of missing cells.
    pub missing_values: usize,
    /// Missing cells as a percentage of all cells (0 for an empty dataset).
    pub missing_percentage: f64,
    /// Number of rows that repeat an earlier row exactly.
    pub duplicates: usize,
    /// Declared type per column.
    pub dtypes: BTreeMap<String, String>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    /// Estimated in-memory footprint in megabytes.
    pub memory_usage_mb: f64,
}

impl QualityReport {
    pub fn row_count(&self) -> usize {
        self.shape.0
    }

    pub fn column_count(&self) -> usize {
        self.shape.1
    }
}

/// Missing-cell count and share for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissingPattern {
    pub count: usize,
    pub percentage: f64,
}

/// Missing patterns keyed by column; columns without gaps are absent.
pub type MissingPatterns = BTreeMap<String, MissingPattern>;

/// Before/after quality snapshots for one cleaning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRecord {
    pub before: QualityReport,
    pub after: QualityReport,
    /// Computed on the cleaned dataset.
    pub missing_patterns: MissingPatterns,
}

// ============================================================================
// Statistics Types
// ============================================================================

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStatistics {
    /// Number of non-missing values the statistics were computed from.
    pub count: usize,
    #[serde(serialize_with = "serialize_float")]
    pub mean: f64,
    #[serde(serialize_with = "serialize_float")]
    pub median: f64,
    /// Sample standard deviation; NaN with fewer than two values.
    #[serde(serialize_with = "serialize_float")]
    pub std: f64,
    #[serde(serialize_with = "serialize_float")]
    pub min: f64,
    #[serde(serialize_with = "serialize_float")]
    pub max: f64,
    #[serde(rename = "25%", serialize_with = "serialize_float")]
    pub p25: f64,
    #[serde(rename = "75%", serialize_with = "serialize_float")]
    pub p75: f64,
}

/// Per-column statistics in dataset column order. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStatistics(Vec<(String, ColumnStatistics)>);

impl SummaryStatistics {
    pub fn get(&self, column: &str) -> Option<&ColumnStatistics> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, stats)| stats)
    }

    pub fn contains_key(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnStatistics)> {
        self.0.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ColumnStatistics)> for SummaryStatistics {
    fn from_iter<I: IntoIterator<Item = (String, ColumnStatistics)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::ops::Index<&str> for SummaryStatistics {
    type Output = ColumnStatistics;

    fn index(&self, column: &str) -> &ColumnStatistics {
        match self.get(column) {
            Some(stats) => stats,
            None => panic!("no summary statistics for column '{}'", column),
        }
    }
}

impl Serialize for SummaryStatistics {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Fence parameters used for IQR outlier detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierBounds {
    #[serde(serialize_with = "serialize_float")]
    pub q1: f64,
    #[serde(serialize_with = "serialize_float")]
    pub q3: f64,
    #[serde(serialize_with = "serialize_float")]
    pub iqr: f64,
    #[serde(serialize_with = "serialize_float")]
    pub lower_bound: f64,
    #[serde(serialize_with = "serialize_float")]
    pub upper_bound: f64,
    pub outlier_count: usize,
}

/// Flagged rows for one column, in ascending row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub indices: Vec<usize>,
    pub stats: OutlierBounds,
}

/// Symmetric matrix of pairwise Pearson coefficients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    #[serde(serialize_with = "serialize_float_matrix")]
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Coefficient between two columns, `None` if either is not in the matrix.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

/// Sum, mean and non-missing count of one numeric column inside one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupStats {
    #[serde(serialize_with = "serialize_float")]
    pub sum: f64,
    #[serde(serialize_with = "serialize_float")]
    pub mean: f64,
    pub count: usize,
}

/// Aggregates for one distinct value of the group column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: Value,
    pub columns: BTreeMap<String, GroupStats>,
}

/// Per-group breakdown of every numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedBreakdown {
    pub group_column: String,
    /// Groups in order of first appearance.
    pub groups: Vec<GroupRow>,
}

/// An analysis section that was deliberately not computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSection {
    pub section: String,
    pub reason: String,
}

impl SkippedSection {
    pub fn new(section: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            reason: reason.into(),
        }
    }
}

/// Statistical analysis of one dataset.
///
/// `outliers`, `correlations` and `grouped` are `None` when the section did not
/// run; the reason is recorded in `skipped`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub dataset: String,
    pub row_count: usize,
    pub summary_stats: SummaryStatistics,
    pub outliers: Option<BTreeMap<String, OutlierReport>>,
    pub outlier_excluded_columns: Vec<String>,
    pub correlations: Option<CorrelationMatrix>,
    pub grouped: Option<GroupedBreakdown>,
    pub skipped: Vec<SkippedSection>,
}

impl AnalysisReport {
    pub fn was_skipped(&self, section: &str) -> bool {
        self.skipped.iter().any(|s| s.section == section)
    }
}

// ============================================================================
// KPI Types
// ============================================================================

/// One group of a click-through computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CtrGroup {
    pub key: Value,
    pub events: f64,
    pub total: usize,
    #[serde(serialize_with = "serialize_float")]
    pub ctr: f64,
}

/// Click-through result: one overall ratio plus a per-group breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CtrResult {
    #[serde(serialize_with = "serialize_float")]
    pub overall_ctr: f64,
    pub groups: Vec<CtrGroup>,
}

/// Value of a single KPI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KpiValue {
    /// Row count.
    Count(usize),
    Scalar(#[serde(serialize_with = "serialize_float")] f64),
    /// One value per numeric column.
    PerColumn(#[serde(serialize_with = "serialize_float_map")] BTreeMap<String, f64>),
    Ctr(CtrResult),
}

impl KpiValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Count(n) => Some(*n as f64),
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }
}

/// Why one metric in a batch produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFailure {
    pub code: String,
    pub message: String,
}

impl From<&crate::error::AnalyticsError> for MetricFailure {
    fn from(error: &crate::error::AnalyticsError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Outcome of a KPI batch: computed metrics and per-metric failures.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KpiReport {
    pub metrics: BTreeMap<String, KpiValue>,
    pub failures: BTreeMap<String, MetricFailure>,
}

impl KpiReport {
    pub fn get(&self, name: &str) -> Option<&KpiValue> {
        self.metrics.get(name)
    }
}

// ============================================================================
// Result Bundle
// ============================================================================

/// Top and bottom rows by one ranking column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub ranked_by: String,
    pub top: Vec<serde_json::Map<String, Value>>,
    pub bottom: Vec<serde_json::Map<String, Value>>,
}

/// Results accumulated by a processor. Each section is replaced whole.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalysisResults {
    pub kpis: Option<KpiReport>,
    pub analysis: Option<AnalysisReport>,
    pub leaderboard: Option<Leaderboard>,
}

/// Everything handed to the report layer, by value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightBundle {
    pub kpis: Option<KpiReport>,
    pub analysis: Option<AnalysisReport>,
    pub leaderboard: Option<Leaderboard>,
    pub quality: BTreeMap<String, QualityRecord>,
}

// ============================================================================
// Tests
// ============================================================================
