//! Pipeline orchestration.
//!
//! The `Pipeline` ties the loader, cleaner and report generator together and
//! gives every run its own output directory.

use crate::cleaner::{ClipBounds, DataCleaner};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{EdaError, Result};
use crate::loader::{TableLoader, Upload};
use crate::pipeline::progress::{
    ClosureProgressReporter, NoopProgressReporter, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
use crate::reporting::{Manifest, ReportEngineKind, ReportGenerator, StepFailure, write_index};
use crate::types::{Artifact, ArtifactKind, RunId, Table};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: RunId,
    /// Directory holding every artifact of this run.
    pub run_dir: PathBuf,
    /// Name of the file the table was loaded from.
    pub source: String,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns: usize,
    pub duration_ms: u64,
    pub cleaning_actions: Vec<String>,
    pub clip_bounds: Vec<ClipBounds>,
    /// Artifacts in the order they were written; the index page comes last.
    pub artifacts: Vec<Artifact>,
    /// Report steps that failed when running with `fail_fast = false`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<StepFailure>,
}

impl PipelineResult {
    /// The `index.html` results page.
    pub fn index(&self) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == ArtifactKind::Index)
    }
}

/// Loads, cleans and reports on one dataset per call.
///
/// # Example
///
/// ```rust,ignore
/// use eda_report::{Pipeline, PipelineConfig, Upload};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().output_root("reports").build()?)
///     .on_progress(|update| println!("[{:.0}%] {}", update.progress * 100.0, update.message))
///     .build()?
///     .process(Upload::from_path("people.csv".as_ref())?)?;
///
/// println!("results in {}", result.run_dir.display());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: DataCleaner,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline on an upload.
    pub fn process(&self, upload: Upload) -> Result<PipelineResult> {
        self.finish(self.process_internal(upload))
    }

    /// Read a file from disk and run the pipeline on it.
    pub fn process_path(&self, path: &Path) -> Result<PipelineResult> {
        self.process(Upload::from_path(path)?)
    }

    fn finish(&self, result: Result<PipelineResult>) -> Result<PipelineResult> {
        match result {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Wrote {} artifacts to {}",
                    result.artifacts.len(),
                    result.run_dir.display()
                )));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, upload: Upload) -> Result<PipelineResult> {
        let start_time = Instant::now();

        info!("Step 1: Loading '{}'...", upload.file_name);
        self.report_progress(ProgressUpdate::started(PipelineStage::Loading));
        let table = TableLoader::load(&upload)?;
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded {} rows x {} columns", table.height(), table.width()),
        ));

        self.run(table, &upload.file_name, start_time)
    }

    fn run(&self, table: Table, source: &str, start_time: Instant) -> Result<PipelineResult> {
        let run_id = RunId::generate();
        let run_dir = self.config.output_root.join(run_id.as_str());
        fs::create_dir_all(&run_dir).map_err(|e| {
            EdaError::ReportGenerationFailure(format!(
                "cannot create {}: {}",
                run_dir.display(),
                e
            ))
        })?;
        debug!("Run {} writing to {}", run_id, run_dir.display());

        match self.run_in(table, source, &run_id, &run_dir, start_time) {
            Ok(result) => Ok(result),
            Err(e) => {
                if self.config.fail_fast {
                    if let Err(cleanup) = fs::remove_dir_all(&run_dir) {
                        warn!("Could not remove {}: {}", run_dir.display(), cleanup);
                    } else {
                        debug!("Removed partial run directory {}", run_dir.display());
                    }
                }
                Err(e)
            }
        }
    }

    fn run_in(
        &self,
        table: Table,
        source: &str,
        run_id: &RunId,
        run_dir: &Path,
        start_time: Instant,
    ) -> Result<PipelineResult> {
        let rows_before = table.height();
        let baseline = (self.config.report_engine == ReportEngineKind::Comparison)
            .then(|| table.clone());

        info!("Step 2: Cleaning...");
        let reporter: &dyn ProgressReporter = match &self.progress_reporter {
            Some(reporter) => reporter.as_ref(),
            None => &NoopProgressReporter,
        };
        let cleaned = self.cleaner.clean_with_progress(table, reporter)?;

        let mut artifacts = Vec::new();
        for diagnostic in &cleaned.diagnostics {
            let path = diagnostic.figure.write_to(run_dir).map_err(|e| {
                EdaError::ReportGenerationFailure(format!(
                    "writing {}: {}",
                    diagnostic.figure.file_name, e
                ))
            })?;
            artifacts.push(Artifact::for_column(
                ArtifactKind::Diagnostic,
                path,
                &diagnostic.column,
            ));
        }

        info!("Step 3: Generating report...");
        self.report_progress(ProgressUpdate::started(PipelineStage::Reporting));
        let mut generator = ReportGenerator::new(&self.config);
        if let Some(baseline) = baseline {
            generator = generator.with_baseline(baseline);
        }
        let report = generator.generate(&cleaned.table, run_dir)?;
        artifacts.extend(report.artifacts);

        if self.config.emit_manifest {
            let manifest = Manifest::new(
                run_id,
                source,
                run_dir,
                &artifacts,
                &cleaned.actions,
                &report.failures,
            );
            artifacts.push(manifest.write(run_dir)?);
        }

        let index = write_index(
            &format!("Results for {}", source),
            run_dir,
            &artifacts,
            &cleaned.actions,
            &report.failures,
        )?;
        artifacts.push(index);

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Pipeline completed in {}ms: {} artifacts",
            duration_ms,
            artifacts.len()
        );

        Ok(PipelineResult {
            run_id: run_id.clone(),
            run_dir: run_dir.to_path_buf(),
            source: source.to_string(),
            rows_before,
            rows_after: cleaned.table.height(),
            columns: cleaned.table.width(),
            duration_ms,
            cleaning_actions: cleaned.actions,
            clip_bounds: cleaned.bounds,
            artifacts,
            failures: report.failures,
        })
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a custom progress reporter.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline. Fails if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            cleaner: DataCleaner::new(&config),
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
