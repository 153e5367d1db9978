//! Integration tests for the cleaning and report pipeline.
//!
//! These tests run whole files from `tests/fixtures` through the public API
//! and check what lands on disk.

use eda_report::reporting::{MANIFEST_FILE, NORMALITY_FILE, SUMMARY_FILE};
use eda_report::{
    ArtifactKind, ColumnKind, DataCleaner, EdaError, Pipeline, PipelineConfig, PipelineStage,
    ReportEngineKind, ReportGenerator, TableLoader, Upload, sanitize_filename, stage_upload,
};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> PathBuf {
    fixtures_path().join(name)
}

/// Fresh directory under the system temp dir, keyed by a random suffix.
fn temp_root(tag: &str) -> PathBuf {
    let suffix: u64 = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    std::env::temp_dir().join(format!("eda-it-{}-{}-{}", tag, std::process::id(), suffix))
}

fn pipeline_at(root: &Path) -> Pipeline {
    Pipeline::builder()
        .config(PipelineConfig::builder().output_root(root).build().unwrap())
        .build()
        .unwrap()
}

/// The people.csv fixture written as a one-sheet workbook.
fn people_xlsx() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "age").unwrap();
    sheet.write_string(0, 1, "city").unwrap();
    let rows = [
        (Some(20), Some("NY")),
        (Some(25), Some("NY")),
        (None, Some("LA")),
        (Some(200), None),
    ];
    for (idx, (age, city)) in rows.into_iter().enumerate() {
        let row = idx as u32 + 1;
        if let Some(age) = age {
            sheet.write_number(row, 0, age).unwrap();
        }
        if let Some(city) = city {
            sheet.write_string(row, 1, city).unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn test_people_cleaning_values() {
    let table = TableLoader::load_path(fixture("people.csv")).unwrap();
    let outcome = DataCleaner::default().clean(table).unwrap();
    let cleaned = &outcome.table;

    assert_eq!(cleaned.height(), 4);
    assert_eq!(cleaned.total_null_count(), 0);

    let age = cleaned.numeric_values("age").unwrap();
    assert_eq!(format!("{:.2}", age[2].unwrap()), "81.67");
    assert!(age[3].unwrap() <= outcome.bounds[0].upper);

    let city = cleaned.text_values("city").unwrap();
    assert_eq!(city[3].as_deref(), Some("NY"));
    assert_eq!(cleaned.kind_of("city").unwrap(), ColumnKind::Categorical);
}

#[test]
fn test_people_report_artifacts() {
    let root = temp_root("people");
    let result = pipeline_at(&root).process_path(&fixture("people.csv")).unwrap();

    let kinds: Vec<ArtifactKind> = result.artifacts.iter().map(|a| a.kind).collect();
    assert!(kinds.contains(&ArtifactKind::SummaryTable));
    assert!(kinds.contains(&ArtifactKind::NormalityTable));
    assert_eq!(kinds.last(), Some(&ArtifactKind::Index));

    let histogram = result
        .artifacts
        .iter()
        .find(|a| a.kind == ArtifactKind::Histogram)
        .unwrap();
    assert_eq!(histogram.column.as_deref(), Some("age"));
    assert_eq!(histogram.file_name(), "age_histogram.svg");

    for artifact in &result.artifacts {
        assert!(artifact.path.is_file(), "missing {}", artifact.path.display());
    }

    let summary = fs::read_to_string(result.run_dir.join(SUMMARY_FILE)).unwrap();
    let header = summary.lines().next().unwrap();
    assert_eq!(
        header,
        "column,kind,count,missing,mean,std,min,25%,50%,75%,max,unique,top,freq"
    );
    assert_eq!(summary.lines().count(), 3);

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_xlsx_upload_end_to_end() {
    let root = temp_root("xlsx");
    let result = pipeline_at(&root)
        .process(Upload::new("people.xlsx", people_xlsx()))
        .unwrap();

    assert_eq!(result.source, "people.xlsx");
    assert_eq!(result.rows_before, 4);
    assert_eq!(result.rows_after, 4);
    assert!(result.failures.is_empty());

    let summary = fs::read_to_string(result.run_dir.join(SUMMARY_FILE)).unwrap();
    let age_row = summary.lines().find(|l| l.starts_with("age,")).unwrap();
    assert!(age_row.contains("81.6"), "unexpected age row {}", age_row);

    let histogram = result
        .artifacts
        .iter()
        .find(|a| a.kind == ArtifactKind::Histogram)
        .unwrap();
    assert_eq!(histogram.file_name(), "age_histogram.svg");

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_index_links_every_artifact() {
    let root = temp_root("index");
    let result = pipeline_at(&root).process_path(&fixture("sales.csv")).unwrap();

    let index = result.index().unwrap();
    let page = fs::read_to_string(&index.path).unwrap();
    for artifact in result.artifacts.iter().filter(|a| a.kind != ArtifactKind::Index) {
        assert!(
            page.contains(&artifact.file_name()),
            "index does not mention {}",
            artifact.file_name()
        );
    }
    assert!(page.contains("Removed 2 duplicate rows"));

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_duplicates_are_removed() {
    let root = temp_root("dupes");
    let result = pipeline_at(&root).process_path(&fixture("sales.csv")).unwrap();

    assert_eq!(result.rows_before, 8);
    assert_eq!(result.rows_after, 6);
    assert_eq!(result.columns, 4);
    assert!(
        result
            .cleaning_actions
            .iter()
            .any(|a| a == "Removed 2 duplicate rows")
    );

    let count_plots: Vec<String> = result
        .artifacts
        .iter()
        .filter(|a| a.kind == ArtifactKind::CountPlot)
        .filter_map(|a| a.column.clone())
        .collect();
    assert_eq!(count_plots, vec!["region".to_string(), "rep".to_string()]);

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_text_only_table_skips_numeric_steps() {
    let root = temp_root("text");
    let result = pipeline_at(&root).process_path(&fixture("text_only.csv")).unwrap();

    assert!(result.failures.is_empty());
    assert!(
        !result
            .artifacts
            .iter()
            .any(|a| matches!(a.kind, ArtifactKind::Histogram | ArtifactKind::CorrelationHeatmap))
    );

    let normality = fs::read_to_string(result.run_dir.join(NORMALITY_FILE)).unwrap();
    assert_eq!(normality.lines().count(), 1);

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_small_sample_records_insufficient_data() {
    let dir = temp_root("small");
    let table = TableLoader::load(&Upload::new("tiny.csv", b"x\n1.5\n2.5\n".to_vec())).unwrap();
    let cleaned = DataCleaner::default().clean(table).unwrap();

    let outcome = ReportGenerator::default()
        .generate(&cleaned.table, &dir)
        .unwrap();
    assert!(outcome.failures.is_empty());

    let normality = fs::read_to_string(dir.join(NORMALITY_FILE)).unwrap();
    assert!(normality.lines().nth(1).unwrap().contains("insufficient_data"));

    fs::remove_dir_all(&dir).ok();
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unsupported_extension() {
    let root = temp_root("unsupported");
    let err = pipeline_at(&root)
        .process(Upload::new("notes.txt", b"a,b\n1,2\n".to_vec()))
        .unwrap_err();

    assert!(matches!(err, EdaError::UnsupportedFormat(ref name) if name == "notes.txt"));
    assert!(!root.exists());
}

#[test]
fn test_header_only_file_is_empty_dataset() {
    let root = temp_root("empty");
    let err = pipeline_at(&root)
        .process_path(&fixture("header_only.csv"))
        .unwrap_err();

    assert_eq!(err.error_code(), "EMPTY_DATASET");
    assert!(err.is_load_error());
}

// ============================================================================
// Configuration, staging and progress
// ============================================================================

#[test]
fn test_comparison_engine_with_manifest() {
    let root = temp_root("manifest");
    let config = PipelineConfig::builder()
        .output_root(&root)
        .report_engine(ReportEngineKind::Comparison)
        .emit_manifest(true)
        .emit_diagnostics(false)
        .build()
        .unwrap();
    let result = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .process_path(&fixture("people.csv"))
        .unwrap();

    assert!(
        !result
            .artifacts
            .iter()
            .any(|a| a.kind == ArtifactKind::Diagnostic)
    );

    let report = fs::read_to_string(result.run_dir.join("comparison_report.html")).unwrap();
    assert!(report.contains("Baseline"));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(result.run_dir.join(MANIFEST_FILE)).unwrap())
            .unwrap();
    assert_eq!(manifest["run_id"], result.run_id.as_str());
    assert_eq!(manifest["source"], "people.csv");
    // manifest and index are written after the listing is taken
    assert_eq!(
        manifest["artifacts"].as_array().unwrap().len(),
        result.artifacts.len() - 2
    );

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_staged_upload_is_processed() {
    let root = temp_root("staged");
    let uploads = root.join("uploads");
    let bytes = fs::read(fixture("people.csv")).unwrap();
    let upload = Upload::new("../../My People.csv", bytes);

    let staged = stage_upload(&uploads, &upload).unwrap();
    assert_eq!(staged, uploads.join(sanitize_filename("../../My People.csv")));
    assert_eq!(staged.file_name().unwrap(), "My_People.csv");

    let result = pipeline_at(&root.join("output")).process_path(&staged).unwrap();
    assert_eq!(result.source, "My_People.csv");

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_consecutive_runs_use_distinct_directories() {
    let root = temp_root("runs");
    let pipeline = pipeline_at(&root);

    let first = pipeline.process_path(&fixture("people.csv")).unwrap();
    let second = pipeline.process_path(&fixture("people.csv")).unwrap();

    assert_ne!(first.run_dir, second.run_dir);
    assert_eq!(file_names(&first.run_dir), file_names(&second.run_dir));
    assert_eq!(file_names(&root).len(), 2);

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_progress_callback_sees_every_stage() {
    let root = temp_root("progress");
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let stages = Arc::new(Mutex::new(Vec::new()));
    let seen = stages.clone();

    let pipeline = Pipeline::builder()
        .config(PipelineConfig::builder().output_root(&root).build().unwrap())
        .on_progress(move |update| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert!((0.0..=1.0).contains(&update.progress));
            seen.lock().unwrap().push(update.stage);
        })
        .build()
        .unwrap();
    pipeline.process_path(&fixture("sales.csv")).unwrap();

    let stages = stages.lock().unwrap();
    for stage in [
        PipelineStage::Loading,
        PipelineStage::Imputation,
        PipelineStage::Deduplication,
        PipelineStage::OutlierClipping,
        PipelineStage::TypeCoercion,
        PipelineStage::Reporting,
        PipelineStage::Complete,
    ] {
        assert!(stages.contains(&stage), "never saw {:?}", stage);
    }
    assert!(!stages.contains(&PipelineStage::Failed));
    assert!(calls.load(Ordering::SeqCst) >= 8);

    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_failed_run_reports_failure_stage() {
    let root = temp_root("failure");
    let last = Arc::new(Mutex::new(None));
    let seen = last.clone();

    let pipeline = Pipeline::builder()
        .config(PipelineConfig::builder().output_root(&root).build().unwrap())
        .on_progress(move |update| {
            *seen.lock().unwrap() = Some(update.stage);
        })
        .build()
        .unwrap();
    let err = pipeline
        .process(Upload::new("gaps.csv", b"a,b\n1,\n2,\n".to_vec()))
        .unwrap_err();

    assert_eq!(err.error_code(), "IMPUTATION_IMPOSSIBLE");
    assert_eq!(*last.lock().unwrap(), Some(PipelineStage::Failed));
    assert_eq!(file_names(&root).len(), 0);

    fs::remove_dir_all(&root).ok();
}
