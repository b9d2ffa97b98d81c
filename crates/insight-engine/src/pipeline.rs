//! End-to-end analysis run.
//!
//! [`InsightPipeline`] drives a [`DataProcessor`] through the standard sequence:
//!
//! 1. Load every input dataset
//! 2. Clean every loaded dataset
//! 3. Merge two datasets (optional)
//! 4. Compute KPIs on the active dataset
//! 5. Analyze the active dataset
//! 6. Build top/bottom leaderboards (optional)

use crate::analysis::AnalysisOptions;
use crate::config::{AnalysisConfig, MergeConfig};
use crate::error::{AnalyticsError, Result, ResultExt};
use crate::ingest::LoadOptions;
use crate::processor::DataProcessor;
use crate::types::InsightBundle;
use std::path::PathBuf;
use tracing::info;

/// Datasets to load and how to combine them.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    /// `(name, path)` pairs, loaded in order.
    pub datasets: Vec<(String, PathBuf)>,
    pub merge: Option<MergeConfig>,
    /// Options applied to every load (e.g. the worksheet for spreadsheets).
    pub load_options: LoadOptions,
}

impl PipelineInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset to load.
    pub fn dataset(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.datasets.push((name.into(), path.into()));
        self
    }

    /// Merge two of the loaded datasets after cleaning.
    pub fn merge(mut self, merge: MergeConfig) -> Self {
        self.merge = Some(merge);
        self
    }

    pub fn load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }
}

/// Runs the full load, clean, merge, KPI and analysis sequence.
pub struct InsightPipeline {
    config: AnalysisConfig,
}

impl InsightPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the pipeline and hand back the results by value.
    pub fn run(&self, inputs: PipelineInputs) -> Result<InsightBundle> {
        let processor = self.run_with_processor(inputs)?;
        Ok(processor.into_bundle())
    }

    /// Run the pipeline and return the processor, so callers can inspect datasets.
    pub fn run_with_processor(&self, inputs: PipelineInputs) -> Result<DataProcessor> {
        if inputs.datasets.is_empty() {
            return Err(AnalyticsError::InvalidArgument(
                "at least one input dataset is required".to_string(),
            ));
        }
        for (_, path) in &inputs.datasets {
            std::fs::metadata(path)
                .map_err(AnalyticsError::from)
                .context(format!("Input file {}", path.display()))?;
        }

        let mut processor = DataProcessor::new();
        for (name, path) in &inputs.datasets {
            processor.load_with(path, name, &inputs.load_options)?;
        }

        let names: Vec<String> = processor
            .dataset_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in &names {
            processor.clean(name, &self.config.cleaning)?;
        }

        if let Some(merge) = &inputs.merge {
            processor.merge(&merge.left, &merge.right, &merge.on, merge.how)?;
        } else if !names.iter().any(|n| n == processor.active_dataset()) {
            let first = inputs.datasets[0].0.clone();
            processor.set_active_dataset(&first)?;
        }

        let active = processor.active_dataset().to_string();
        info!("Running analysis on '{}'", active);

        processor.calculate_kpis(&active, self.config.metrics.as_deref())?;
        processor.analyze(&active, &AnalysisOptions::from(&self.config))?;

        if let Some(column) = &self.config.ranking_column {
            processor.leaderboard(&active, column, self.config.top_n)?;
        }

        Ok(processor)
    }
}
