//! Dataset orchestration.
//!
//! [`DataProcessor`] owns a set of named datasets together with the results
//! computed from them. It sequences ingestion, cleaning, merging, KPI
//! computation and analysis, and hands the finished [`InsightBundle`] off by
//! value.
//!
//! # Active dataset
//!
//! Downstream steps run on the *active* dataset. It starts as `"main"`, becomes
//! `"merged"` after a successful merge, and can be set explicitly with
//! [`DataProcessor::set_active_dataset`].

mod merge;

pub use merge::{RIGHT_SUFFIX, join_datasets};

use crate::analysis::{AnalysisOptions, StatisticalAnalyzer};
use crate::cleaner::DataCleaner;
use crate::config::{CleaningOptions, JoinHow};
use crate::error::{AnalyticsError, Result};
use crate::ingest::{Ingester, LoadOptions};
use crate::kpi::{KpiCalculator, MetricConfig};
use crate::ranking::DataFrameHelper;
use crate::types::{
    AnalysisReport, AnalysisResults, InsightBundle, KpiReport, Leaderboard, QualityRecord,
};
use crate::utils::dataframe_to_records;
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Default name for the primary dataset.
pub const MAIN_DATASET: &str = "main";

/// Reserved name for the result of [`DataProcessor::merge`].
pub const MERGED_DATASET: &str = "merged";

/// Owns named datasets and the results computed from them.
///
/// # Example
///
/// ```rust,ignore
/// use insight_engine::{DataProcessor, CleaningOptions};
///
/// let mut processor = DataProcessor::new();
/// processor.load("data/impressions.csv", "main")?;
/// processor.clean("main", &CleaningOptions::default())?;
/// let kpis = processor.calculate_kpis("main", None)?;
/// ```
pub struct DataProcessor {
    ingester: Ingester,
    datasets: BTreeMap<String, DataFrame>,
    active: String,
    results: AnalysisResults,
    quality: BTreeMap<String, QualityRecord>,
}

static_assertions::assert_impl_all!(DataProcessor: Send);

impl Default for DataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProcessor {
    pub fn new() -> Self {
        Self::with_ingester(Ingester::new())
    }

    /// Use a custom loader registry.
    pub fn with_ingester(ingester: Ingester) -> Self {
        Self {
            ingester,
            datasets: BTreeMap::new(),
            active: MAIN_DATASET.to_string(),
            results: AnalysisResults::default(),
            quality: BTreeMap::new(),
        }
    }

    // ========================================================================
    // Datasets
    // ========================================================================

    /// Load a file and store it under `name`, replacing any dataset of that name.
    pub fn load(&mut self, path: impl AsRef<Path>, name: &str) -> Result<&DataFrame> {
        self.load_with(path, name, &LoadOptions::default())
    }

    /// Load a file with explicit ingestion options.
    pub fn load_with(
        &mut self,
        path: impl AsRef<Path>,
        name: &str,
        options: &LoadOptions,
    ) -> Result<&DataFrame> {
        let df = self.ingester.load_with(path, options)?;
        Ok(self.insert_dataset(name, df))
    }

    /// Store an in-memory dataset under `name`, replacing any dataset of that name.
    pub fn insert_dataset(&mut self, name: &str, df: DataFrame) -> &DataFrame {
        self.datasets.insert(name.to_string(), df);
        &self.datasets[name]
    }

    pub fn dataset(&self, name: &str) -> Option<&DataFrame> {
        self.datasets.get(name)
    }

    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets.keys().map(String::as_str).collect()
    }

    fn require(&self, name: &str) -> Result<&DataFrame> {
        self.datasets
            .get(name)
            .ok_or_else(|| AnalyticsError::DatasetNotLoaded(name.to_string()))
    }

    /// Name of the dataset downstream steps operate on.
    pub fn active_dataset(&self) -> &str {
        &self.active
    }

    /// Choose the active dataset explicitly. It must already be loaded.
    pub fn set_active_dataset(&mut self, name: &str) -> Result<()> {
        self.require(name)?;
        self.active = name.to_string();
        Ok(())
    }

    /// Join two loaded datasets into `"merged"` and make it the active dataset.
    pub fn merge(&mut self, left: &str, right: &str, on: &str, how: JoinHow) -> Result<&DataFrame> {
        let left_df = self.require(left)?;
        let right_df = self.require(right)?;
        let merged = join_datasets(left_df, right_df, on, how)?;

        info!(
            "Merged '{}' and '{}' on '{}' ({:?}): {} rows",
            left,
            right,
            on,
            how,
            merged.height()
        );
        self.active = MERGED_DATASET.to_string();
        Ok(self.insert_dataset(MERGED_DATASET, merged))
    }

    // ========================================================================
    // Cleaning
    // ========================================================================

    /// Run the standard cleaning sequence on `name` and record its quality.
    ///
    /// On failure the stored dataset is left as it was.
    pub fn clean(&mut self, name: &str, options: &CleaningOptions) -> Result<&QualityRecord> {
        let df = self.require(name)?.clone();
        info!("Cleaning dataset '{}'", name);
        let (cleaned, record) = DataCleaner::clean(df, options)?;

        self.datasets.insert(name.to_string(), cleaned);
        self.quality.insert(name.to_string(), record);
        Ok(&self.quality[name])
    }

    // ========================================================================
    // Analysis
    // ========================================================================

    /// Compute KPIs on `name`. `None` uses [`MetricConfig::defaults`].
    pub fn calculate_kpis(
        &mut self,
        name: &str,
        metrics: Option<&[MetricConfig]>,
    ) -> Result<&KpiReport> {
        let df = self.require(name)?;
        let report = match metrics {
            Some(metrics) => KpiCalculator::calculate(df, metrics)?,
            None => KpiCalculator::calculate(df, &MetricConfig::defaults())?,
        };
        Ok(self.results.kpis.insert(report))
    }

    /// Statistical analysis of `name`.
    pub fn analyze(&mut self, name: &str, options: &AnalysisOptions) -> Result<&AnalysisReport> {
        let df = self.require(name)?;
        let report = StatisticalAnalyzer::analyze(df, name, options)?;
        Ok(self.results.analysis.insert(report))
    }

    /// The `n` rows of `name` with the largest `column` values.
    pub fn top_performers(&self, name: &str, column: &str, n: usize) -> Result<DataFrame> {
        DataFrameHelper::top_performers(self.require_for_ranking(name)?, column, n)
    }

    /// The `n` rows of `name` with the smallest `column` values.
    pub fn bottom_performers(&self, name: &str, column: &str, n: usize) -> Result<DataFrame> {
        DataFrameHelper::bottom_performers(self.require_for_ranking(name)?, column, n)
    }

    /// Equal-frequency bucket label per row of `name`.
    pub fn segment_by_percentile(
        &self,
        name: &str,
        column: &str,
        segments: usize,
    ) -> Result<Vec<Option<usize>>> {
        DataFrameHelper::segment_by_percentile(self.require_for_ranking(name)?, column, segments)
    }

    /// Record top and bottom `n` rows of `name` by `column` in the results.
    pub fn leaderboard(&mut self, name: &str, column: &str, n: usize) -> Result<&Leaderboard> {
        let top = dataframe_to_records(&self.top_performers(name, column, n)?)?;
        let bottom = dataframe_to_records(&self.bottom_performers(name, column, n)?)?;
        let board = Leaderboard {
            ranked_by: column.to_string(),
            top,
            bottom,
        };
        Ok(self.results.leaderboard.insert(board))
    }

    fn require_for_ranking(&self, name: &str) -> Result<&DataFrame> {
        self.datasets.get(name).ok_or_else(|| {
            AnalyticsError::InvalidArgument(format!("dataset '{}' is not loaded", name))
        })
    }

    // ========================================================================
    // Results
    // ========================================================================

    pub fn results(&self) -> &AnalysisResults {
        &self.results
    }

    /// Quality records keyed by dataset name.
    pub fn quality_reports(&self) -> &BTreeMap<String, QualityRecord> {
        &self.quality
    }

    /// Hand the results and quality records off by value.
    pub fn into_bundle(self) -> InsightBundle {
        InsightBundle {
            kpis: self.results.kpis,
            analysis: self.results.analysis,
            leaderboard: self.results.leaderboard,
            quality: self.quality,
        }
    }
}
