//! Report hand-off.
//!
//! Wraps an [`InsightBundle`] with run metadata, writes it as
//! `<stem>_insights.json`, and renders a short text summary for terminals.

use crate::error::Result;
use crate::types::{InsightBundle, KpiValue};
use crate::utils::{format_number, format_percentage};
use chrono::Local;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// An [`InsightBundle`] stamped with run metadata.
#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    /// RFC 3339 timestamp of report creation.
    pub generated_at: String,
    /// Input files, as given.
    pub inputs: Vec<String>,
    #[serde(flatten)]
    pub bundle: InsightBundle,
}

impl InsightReport {
    pub fn new(bundle: InsightBundle, inputs: &[PathBuf]) -> Self {
        Self {
            generated_at: Local::now().to_rfc3339(),
            inputs: inputs.iter().map(|p| p.display().to_string()).collect(),
            bundle,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Writes reports into an output directory.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// File name for a report derived from `input`, e.g. `train.csv` -> `train_insights.json`.
    pub fn report_file_name(input: &Path) -> String {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("dataset");
        format!("{}_insights.json", stem)
    }

    /// Write `report` and return the path written.
    pub fn write(&self, report: &InsightReport, input: &Path) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(Self::report_file_name(input));
        fs::write(&path, report.to_json_pretty()?)?;
        info!("Report saved: {}", path.display());
        Ok(path)
    }
}

/// Human-readable summary of a bundle.
pub fn render_summary(bundle: &InsightBundle) -> String {
    let mut out = String::new();

    for (name, record) in &bundle.quality {
        let _ = writeln!(
            out,
            "Dataset '{}': {} -> {} rows, {} duplicates removed, {} missing after cleaning",
            name,
            format_number(record.before.row_count() as f64, 0),
            format_number(record.after.row_count() as f64, 0),
            format_number(record.before.duplicates as f64, 0),
            format_percentage(record.after.missing_percentage, 2),
        );
    }

    if let Some(kpis) = &bundle.kpis {
        let _ = writeln!(out, "\nKPIs");
        for (name, value) in &kpis.metrics {
            match value {
                KpiValue::Count(n) => {
                    let _ = writeln!(out, "  {}: {}", name, format_number(*n as f64, 0));
                }
                KpiValue::Scalar(v) => {
                    let _ = writeln!(out, "  {}: {}", name, format_number(*v, 4));
                }
                KpiValue::PerColumn(columns) => {
                    let _ = writeln!(out, "  {}:", name);
                    for (column, v) in columns {
                        let _ = writeln!(out, "    {}: {}", column, format_number(*v, 2));
                    }
                }
                KpiValue::Ctr(ctr) => {
                    let _ = writeln!(
                        out,
                        "  {}: overall {} across {} groups",
                        name,
                        format_percentage(ctr.overall_ctr, 2),
                        ctr.groups.len()
                    );
                }
            }
        }
        for (name, failure) in &kpis.failures {
            let _ = writeln!(out, "  {}: failed ({})", name, failure.message);
        }
    }

    if let Some(analysis) = &bundle.analysis {
        let _ = writeln!(
            out,
            "\nAnalysis of '{}' ({} rows, {} numeric columns)",
            analysis.dataset,
            format_number(analysis.row_count as f64, 0),
            analysis.summary_stats.len()
        );
        if let Some(outliers) = &analysis.outliers {
            for (column, report) in outliers {
                let _ = writeln!(
                    out,
                    "  outliers in {}: {} (bounds {} to {})",
                    column,
                    report.stats.outlier_count,
                    format_number(report.stats.lower_bound, 2),
                    format_number(report.stats.upper_bound, 2)
                );
            }
        }
        if let Some(grouped) = &analysis.grouped {
            let _ = writeln!(
                out,
                "  grouped by {}: {} groups",
                grouped.group_column,
                grouped.groups.len()
            );
        }
        for skipped in &analysis.skipped {
            let _ = writeln!(out, "  skipped {}: {}", skipped.section, skipped.reason);
        }
    }

    if let Some(board) = &bundle.leaderboard {
        let _ = writeln!(
            out,
            "\nLeaderboard by {}: top {} / bottom {}",
            board.ranked_by,
            board.top.len(),
            board.bottom.len()
        );
    }

    out
}
