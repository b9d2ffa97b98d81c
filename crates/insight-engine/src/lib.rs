//! Tabular Analytics Engine
//!
//! A batch analytics library built with Rust and Polars. It ingests tabular
//! datasets, cleans and validates them, computes KPIs and runs statistical
//! analysis, producing a structured result bundle for downstream report layers.
//!
//! # Overview
//!
//! - **Ingestion**: CSV, Excel (`.xlsx`/`.xls`), JSON records and Parquet, selected by extension
//! - **Quality**: Before/after snapshots with missing-value patterns
//! - **Cleaning**: Duplicate removal, missing-value strategies, column name normalization
//! - **KPIs**: Click-through ratios, aggregations and column ratios from JSON-configurable metrics
//! - **Analysis**: Summary statistics, IQR outliers, Pearson correlations, grouped breakdowns
//! - **Ranking**: Top/bottom performers and percentile segmentation
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use insight_engine::{AnalysisConfig, InsightPipeline, MergeConfig, JoinHow, PipelineInputs};
//!
//! let config = AnalysisConfig::builder()
//!     .group_by("app_code")
//!     .ranking_column("is_click")
//!     .build()?;
//!
//! let inputs = PipelineInputs::new()
//!     .dataset("main", "data/train.csv")
//!     .dataset("items", "data/item_data.csv")
//!     .merge(MergeConfig {
//!         left: "main".into(),
//!         right: "items".into(),
//!         on: "item_id".into(),
//!         how: JoinHow::Left,
//!     });
//!
//! let bundle = InsightPipeline::new(config).run(inputs)?;
//! println!("{}", serde_json::to_string_pretty(&bundle)?);
//! ```
//!
//! # Step by step
//!
//! [`DataProcessor`] exposes each stage on its own:
//!
//! ```rust,ignore
//! use insight_engine::{DataProcessor, CleaningOptions, AnalysisOptions};
//!
//! let mut processor = DataProcessor::new();
//! processor.load("data/train.csv", "main")?;
//! processor.clean("main", &CleaningOptions::default())?;
//! processor.calculate_kpis("main", None)?;
//! processor.analyze("main", &AnalysisOptions::default())?;
//! let bundle = processor.into_bundle();
//! ```
//!
//! # Errors
//!
//! All fallible operations return [`AnalyticsError`]. Failures are never retried;
//! inside a KPI batch, a metric that references a missing column is recorded as
//! a failure and the remaining metrics still run.

pub mod analysis;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod ingest;
pub mod kpi;
pub mod pipeline;
pub mod processor;
pub mod quality;
pub mod ranking;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use analysis::{AnalysisOptions, StatisticalAnalyzer};
pub use cleaner::DataCleaner;
pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, CleaningOptions, JoinHow, MergeConfig, MissingStrategy,
};
pub use error::{AnalyticsError, Result, ResultExt};
pub use ingest::{FileFormat, FormatLoader, Ingester, LoadOptions, SheetSelector};
pub use kpi::{AggregationOp, KpiCalculator, MetricConfig, MetricKind};
pub use pipeline::{InsightPipeline, PipelineInputs};
pub use processor::{DataProcessor, MAIN_DATASET, MERGED_DATASET};
pub use quality::DataValidator;
pub use ranking::DataFrameHelper;
pub use reporting::{InsightReport, ReportWriter, render_summary};
pub use types::{
    AnalysisReport, AnalysisResults, ColumnStatistics, CorrelationMatrix, CtrGroup, CtrResult,
    InsightBundle, KpiReport, KpiValue, Leaderboard, MissingPattern, OutlierBounds,
    OutlierReport, QualityRecord, QualityReport, SummaryStatistics,
};
