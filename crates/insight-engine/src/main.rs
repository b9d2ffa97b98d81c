//! CLI entry point for the tabular analytics engine.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use insight_engine::{
    AnalysisConfig, InsightPipeline, InsightReport, JoinHow, LoadOptions, MergeConfig,
    MetricConfig, MetricKind, MissingStrategy, PipelineInputs, ReportWriter, SheetSelector,
    render_summary,
};
use std::path::PathBuf;
use tracing::{error, info};

/// CLI-compatible missing value strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingStrategy {
    /// Drop rows with any missing value
    Drop,
    /// Carry the previous value forward, per column
    ForwardFill,
    /// Fill numeric columns with their mean
    Mean,
    /// Leave missing values in place
    Keep,
}

impl From<CliMissingStrategy> for MissingStrategy {
    fn from(cli: CliMissingStrategy) -> Self {
        match cli {
            CliMissingStrategy::Drop => MissingStrategy::Drop,
            CliMissingStrategy::ForwardFill => MissingStrategy::ForwardFill,
            CliMissingStrategy::Mean => MissingStrategy::Mean,
            CliMissingStrategy::Keep => MissingStrategy::Keep,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Tabular analytics engine: quality, cleaning, KPIs and statistics",
    long_about = "Loads one or more tabular datasets, cleans them, computes KPIs and \
                  runs statistical analysis.\n\n\
                  EXAMPLES:\n  \
                  # Analyze a single file\n  \
                  insight-engine -i data.csv\n\n  \
                  # Merge impressions with item metadata and compute CTR\n  \
                  insight-engine -i main=train.csv -i items=item_data.csv \\\n    \
                  --merge main,items,item_id,left --ctr is_click,impression_id\n\n  \
                  # Machine-readable output\n  \
                  insight-engine -i data.xlsx --sheet Campaigns --json"
)]
struct Args {
    /// Input dataset as NAME=PATH, or a bare PATH (named "main" for the first input)
    #[arg(short, long, required = true)]
    input: Vec<String>,

    /// Merge two datasets after cleaning: LEFT,RIGHT,ON[,HOW]
    ///
    /// HOW is one of inner, left, right, outer (default inner)
    #[arg(long)]
    merge: Option<String>,

    /// JSON analysis configuration file
    ///
    /// Command line flags override values from the file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Column for the grouped breakdown
    #[arg(short, long)]
    group_by: Option<String>,

    /// Disable IQR outlier detection
    #[arg(long)]
    no_outliers: bool,

    /// Strategy for missing values during cleaning
    #[arg(long, value_enum)]
    missing_strategy: Option<CliMissingStrategy>,

    /// Compute a click-through KPI: CLICK_COLUMN,IMPRESSION_COLUMN
    #[arg(long)]
    ctr: Option<String>,

    /// Column used for top/bottom leaderboards
    #[arg(long)]
    rank_by: Option<String>,

    /// Leaderboard size
    #[arg(long)]
    top_n: Option<usize>,

    /// Worksheet (index or name) for spreadsheet inputs
    #[arg(long)]
    sheet: Option<String>,

    /// Output directory for reports
    #[arg(short, long, default_value = "./outputs")]
    output: PathBuf,

    /// Write the JSON report to the output directory
    ///
    /// The report will be saved as <first_input_name>_insights.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Parse `NAME=PATH` or a bare path.
fn parse_input(raw: &str, position: usize) -> (String, PathBuf) {
    match raw.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            (name.to_string(), PathBuf::from(path))
        }
        _ if position == 0 => ("main".to_string(), PathBuf::from(raw)),
        _ => (format!("input_{}", position), PathBuf::from(raw)),
    }
}

/// Parse `LEFT,RIGHT,ON[,HOW]`.
fn parse_merge(raw: &str) -> Result<MergeConfig> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [left, right, on] => Ok(MergeConfig {
            left: left.to_string(),
            right: right.to_string(),
            on: on.to_string(),
            how: JoinHow::Inner,
        }),
        [left, right, on, how] => Ok(MergeConfig {
            left: left.to_string(),
            right: right.to_string(),
            on: on.to_string(),
            how: how.parse()?,
        }),
        _ => bail!("--merge expects LEFT,RIGHT,ON[,HOW], got '{}'", raw),
    }
}

/// Parse `CLICK_COLUMN,IMPRESSION_COLUMN` into a CTR metric.
fn parse_ctr(raw: &str) -> Result<MetricConfig> {
    let (click_col, impression_col) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("--ctr expects CLICK_COLUMN,IMPRESSION_COLUMN, got '{}'", raw))?;
    Ok(MetricConfig::new(
        "ctr_analysis",
        MetricKind::Ctr {
            click_col: click_col.trim().to_string(),
            impression_col: impression_col.trim().to_string(),
        },
    ))
}

/// Layer command line flags over the (optional) configuration file.
fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(strategy) = args.missing_strategy {
        config.cleaning.missing_strategy = strategy.into();
    }
    if let Some(column) = &args.group_by {
        config.group_by = Some(column.clone());
    }
    if args.no_outliers {
        config.enable_outliers = false;
    }
    if let Some(raw) = &args.ctr {
        let ctr = parse_ctr(raw)?;
        let metrics = config.metrics.get_or_insert_with(MetricConfig::defaults);
        metrics.retain(|m| m.name != ctr.name);
        metrics.push(ctr);
    }
    if let Some(column) = &args.rank_by {
        config.ranking_column = Some(column.clone());
    }
    if let Some(n) = args.top_n {
        config.top_n = n;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = build_config(args)?;

    let mut inputs = PipelineInputs::new();
    for (position, raw) in args.input.iter().enumerate() {
        let (name, path) = parse_input(raw, position);
        if !path.exists() {
            bail!("Input file not found: {}", path.display());
        }
        inputs = inputs.dataset(name, path);
    }
    if let Some(raw) = &args.merge {
        inputs = inputs.merge(parse_merge(raw)?);
    }
    if let Some(sheet) = &args.sheet {
        inputs = inputs.load_options(LoadOptions::default().with_sheet(sheet.parse::<SheetSelector>()?));
    }

    let paths: Vec<PathBuf> = inputs.datasets.iter().map(|(_, p)| p.clone()).collect();
    info!("Processing {} input file(s)", paths.len());

    let bundle = InsightPipeline::new(config).run(inputs)?;
    let report = InsightReport::new(bundle, &paths);

    if args.emit_report {
        let writer = ReportWriter::new(&args.output);
        let path = writer.write(&report, &paths[0])?;
        if !args.json {
            println!("Report written to {}", path.display());
        }
    }

    if args.json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print!("{}", render_summary(&report.bundle));
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if let Err(e) = run(&args) {
        error!("Analysis failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}
