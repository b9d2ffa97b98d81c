//! Integration tests for the analytics engine.
//!
//! These tests drive the public API end to end against the fixtures in
//! `tests/fixtures`.

use insight_engine::{
    AnalysisConfig, AnalysisOptions, CleaningOptions, DataCleaner, DataProcessor, InsightPipeline,
    JoinHow, KpiValue, MergeConfig, MetricConfig, MetricKind, MissingStrategy, PipelineInputs,
    StatisticalAnalyzer,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn temp_path(file_name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "insight_engine_it_{}_{}",
        std::process::id(),
        file_name
    ))
}

fn loaded_processor() -> DataProcessor {
    let mut processor = DataProcessor::new();
    processor
        .load(fixtures_path().join("train.csv"), "main")
        .expect("Failed to load train.csv");
    processor
        .load(fixtures_path().join("item_data.csv"), "items")
        .expect("Failed to load item_data.csv");
    processor
}

// ============================================================================
// Ingestion Tests
// ============================================================================

#[test]
fn test_load_delimited_fixture() {
    let processor = loaded_processor();
    let main = processor.dataset("main").unwrap();

    assert_eq!(main.shape(), (6, 5));
    assert_eq!(main.column("item_id").unwrap().null_count(), 1);
    assert_eq!(processor.dataset_names(), vec!["items", "main"]);
}

#[test]
fn test_load_records_fixture() {
    let mut processor = DataProcessor::new();
    let df = processor
        .load(fixtures_path().join("items.json"), "items")
        .unwrap();

    assert_eq!(df.height(), 3);
    assert!(df.column("category").is_ok());
    assert!(df.column("price").is_ok());
}

#[test]
fn test_load_columnar_file() {
    let path = temp_path("items.parquet");
    let mut df = df!(
        "item_id" => &[1i64, 2, 3],
        "price" => &[10.5, 8.0, 12.0],
    )
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    ParquetWriter::new(file).finish(&mut df).unwrap();

    let mut processor = DataProcessor::new();
    let loaded = processor.load(&path, "items").unwrap();
    assert!(loaded.equals_missing(&df));

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_unsupported_format() {
    let mut processor = DataProcessor::new();
    let err = processor.load("notes.txt", "main").unwrap_err();

    assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    assert!(err.to_string().contains("txt"));
    assert!(processor.dataset("main").is_none());
}

#[test]
fn test_missing_file_is_io_error() {
    let mut processor = DataProcessor::new();
    let err = processor
        .load(fixtures_path().join("absent.csv"), "main")
        .unwrap_err();
    assert_eq!(err.error_code(), "IO_ERROR");
}

// ============================================================================
// Cleaning Tests
// ============================================================================

#[test]
fn test_clean_fixture() {
    let mut processor = loaded_processor();
    let record = processor
        .clean("main", &CleaningOptions::default())
        .unwrap()
        .clone();

    assert_eq!(record.before.shape, (6, 5));
    assert_eq!(record.before.duplicates, 1);
    assert_eq!(record.before.missing_values, 1);
    assert_eq!(record.after.shape, (4, 5));
    assert_eq!(record.after.missing_values, 0);

    let main = processor.dataset("main").unwrap();
    assert!(main.column("session_time").is_ok());
}

#[test]
fn test_clean_keeps_first_occurrence() {
    let df = df!(
        "id" => &[1i64, 2, 1, 3],
        "value" => &["first", "b", "second", "c"],
    )
    .unwrap();
    let options = CleaningOptions {
        duplicate_subset: Some(vec!["id".to_string()]),
        ..CleaningOptions::default()
    };

    let (cleaned, _) = DataCleaner::clean(df, &options).unwrap();
    let values: Vec<Option<&str>> = cleaned
        .column("value")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(values, vec![Some("first"), Some("b"), Some("c")]);
}

#[test]
fn test_clean_is_idempotent() {
    let processor = loaded_processor();
    for strategy in [
        MissingStrategy::Drop,
        MissingStrategy::ForwardFill,
        MissingStrategy::Mean,
        MissingStrategy::Keep,
    ] {
        let options = CleaningOptions {
            missing_strategy: strategy,
            ..CleaningOptions::default()
        };
        let raw = processor.dataset("main").unwrap().clone();
        let (once, _) = DataCleaner::clean(raw, &options).unwrap();
        let (twice, record) = DataCleaner::clean(once.clone(), &options).unwrap();

        assert!(once.equals_missing(&twice), "{} is not idempotent", strategy);
        assert_eq!(record.before.duplicates, 0);
    }
}

// ============================================================================
// Merge Tests
// ============================================================================

#[test]
fn test_merge_fans_out_matches() {
    let mut processor = DataProcessor::new();
    processor.insert_dataset(
        "main",
        df!("key" => &[1i64, 2, 3], "clicks" => &[5i64, 6, 7]).unwrap(),
    );
    processor.insert_dataset(
        "items",
        df!("key" => &[1i64, 1, 2, 3], "label" => &["w", "x", "y", "z"]).unwrap(),
    );

    let merged = processor.merge("main", "items", "key", JoinHow::Inner).unwrap();
    assert_eq!(merged.height(), 4);
    assert_eq!(processor.active_dataset(), "merged");

    let merged = processor.merge("main", "items", "key", JoinHow::Left).unwrap();
    assert_eq!(merged.height(), 4);
}

#[test]
fn test_merge_unloaded_dataset_computes_nothing() {
    let mut processor = DataProcessor::new();
    processor
        .load(fixtures_path().join("train.csv"), "main")
        .unwrap();

    let err = processor
        .merge("main", "items", "item_id", JoinHow::Left)
        .unwrap_err();

    assert_eq!(err.error_code(), "DATASET_NOT_LOADED");
    assert!(err.to_string().contains("items"));
    assert!(processor.dataset("merged").is_none());
    assert_eq!(processor.active_dataset(), "main");
    assert!(processor.results().kpis.is_none());
    assert!(processor.results().analysis.is_none());
}

// ============================================================================
// KPI and Analysis Tests
// ============================================================================

#[test]
fn test_ctr_on_cleaned_fixture() {
    let mut processor = loaded_processor();
    processor.clean("main", &CleaningOptions::default()).unwrap();

    let metrics = vec![MetricConfig::new(
        "ctr_analysis",
        MetricKind::Ctr {
            click_col: "is_click".to_string(),
            impression_col: "impression_id".to_string(),
        },
    )];
    let report = processor.calculate_kpis("main", Some(&metrics)).unwrap();

    let KpiValue::Ctr(ctr) = report.get("ctr_analysis").unwrap() else {
        panic!("expected a CTR result");
    };
    assert_eq!(ctr.overall_ctr, 50.0);
    assert_eq!(ctr.groups.len(), 2);
    assert_eq!(ctr.groups[0].key, json!("a"));
    assert_eq!(ctr.groups[0].ctr, 50.0);
    assert_eq!(ctr.groups[0].total, 2);
}

#[test]
fn test_outlier_detection_flags_extreme_value() {
    let df = df!(
        "value" => &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0],
        "score" => &[3.0, 1.0, 4.0, 1.0, 5.0, 9.0],
    )
    .unwrap();

    let report = StatisticalAnalyzer::analyze(&df, "main", &AnalysisOptions::default()).unwrap();
    let outliers = report.outliers.as_ref().unwrap();

    assert_eq!(outliers["value"].indices, vec![5]);
    assert_eq!(outliers["value"].stats.outlier_count, 1);
    let correlations = report.correlations.as_ref().unwrap();
    assert_eq!(correlations.get("value", "value"), Some(1.0));
    assert_eq!(correlations.get("score", "score"), Some(1.0));
    assert_eq!(
        correlations.get("value", "score"),
        correlations.get("score", "value")
    );
}

#[test]
fn test_analysis_skips_sections_without_numeric_data() {
    let df = df!("name" => &["a", "b", "c"]).unwrap();
    let report = StatisticalAnalyzer::analyze(&df, "main", &AnalysisOptions::default()).unwrap();

    assert!(report.summary_stats.is_empty());
    assert!(report.outliers.is_none());
    assert!(report.correlations.is_none());
    assert!(report.was_skipped("correlations"));
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

fn merged_inputs() -> PipelineInputs {
    PipelineInputs::new()
        .dataset("main", fixtures_path().join("train.csv"))
        .dataset("items", fixtures_path().join("item_data.csv"))
        .merge(MergeConfig {
            left: "main".to_string(),
            right: "items".to_string(),
            on: "item_id".to_string(),
            how: JoinHow::Left,
        })
}

#[test]
fn test_full_pipeline_with_config_file() {
    let config = AnalysisConfig::from_json_file(fixtures_path().join("analysis.json")).unwrap();
    let processor = InsightPipeline::new(config)
        .run_with_processor(merged_inputs())
        .unwrap();

    assert_eq!(processor.active_dataset(), "merged");
    assert_eq!(processor.dataset("merged").unwrap().height(), 6);

    let bundle = processor.into_bundle();

    let quality = &bundle.quality;
    assert_eq!(quality["main"].after.row_count(), 4);
    assert_eq!(quality["items"].after.row_count(), 3);

    let kpis = bundle.kpis.as_ref().unwrap();
    assert_eq!(kpis.get("total_volume"), Some(&KpiValue::Count(6)));
    let KpiValue::Ctr(ctr) = kpis.get("ctr_analysis").unwrap() else {
        panic!("expected a CTR result");
    };
    assert_eq!(ctr.groups.len(), 2);
    let group_a = ctr.groups.iter().find(|g| g.key == json!("a")).unwrap();
    assert_eq!(group_a.ctr, 66.67);
    assert_eq!(kpis.failures["price_per_click"].code, "COLUMN_NOT_FOUND");

    let analysis = bundle.analysis.as_ref().unwrap();
    assert_eq!(analysis.dataset, "merged");
    let stat_columns: Vec<&str> = analysis.summary_stats.keys().collect();
    assert_eq!(stat_columns, vec!["item_id", "is_click", "session_time", "price"]);
    assert_eq!(analysis.grouped.as_ref().unwrap().groups.len(), 2);
    let correlations = analysis.correlations.as_ref().unwrap();
    assert_eq!(correlations.get("is_click", "is_click"), Some(1.0));

    let board = bundle.leaderboard.as_ref().unwrap();
    assert_eq!(board.ranked_by, "session_time");
    assert_eq!(board.top.len(), 2);
    assert_eq!(board.top[0]["session_time"], json!(30.0));
    assert_eq!(board.bottom[0]["session_time"], json!(5.5));
}

#[test]
fn test_pipeline_json_uses_plain_numbers() {
    let bundle = InsightPipeline::new(AnalysisConfig::default())
        .run(PipelineInputs::new().dataset("main", fixtures_path().join("train.csv")))
        .unwrap();
    let value = serde_json::to_value(&bundle).unwrap();

    assert_eq!(value["kpis"]["metrics"]["total_volume"], json!(4));
    assert!(value["analysis"]["summary_stats"]["is_click"]["mean"].is_f64());
    assert_eq!(value["analysis"]["summary_stats"]["is_click"]["mean"], json!(0.5));
    assert_eq!(value["analysis"]["summary_stats"]["is_click"]["count"], json!(4));
    assert!(value["quality"]["main"]["before"]["shape"].is_array());
}

#[test]
fn test_pipeline_merge_with_unknown_dataset() {
    let inputs = PipelineInputs::new()
        .dataset("main", fixtures_path().join("train.csv"))
        .merge(MergeConfig {
            left: "main".to_string(),
            right: "items".to_string(),
            on: "item_id".to_string(),
            how: JoinHow::Inner,
        });

    let err = InsightPipeline::new(AnalysisConfig::default())
        .run(inputs)
        .unwrap_err();
    assert_eq!(err.error_code(), "DATASET_NOT_LOADED");
}

#[test]
fn test_pipeline_uses_first_dataset_without_main() {
    let processor = InsightPipeline::new(AnalysisConfig::default())
        .run_with_processor(
            PipelineInputs::new().dataset("items", fixtures_path().join("items.json")),
        )
        .unwrap();

    assert_eq!(processor.active_dataset(), "items");
    assert_eq!(processor.results().analysis.as_ref().unwrap().dataset, "items");
}
