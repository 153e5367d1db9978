//! Fixed sequence of report artifacts for a cleaned table.

use super::engines::{EngineOptions, ReportEngineKind};
use crate::charts::{Figure, bars, heatmap, histogram};
use crate::config::PipelineConfig;
use crate::error::{EdaError, Result};
use crate::stats::{CorrelationMatrix, NormalityRecord, summarize, summary_frame};
use crate::types::{Artifact, ArtifactKind, Table};
use crate::utils::value_counts;
use anyhow::Context;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info, warn};

pub const SUMMARY_FILE: &str = "summary_statistics.csv";
pub const NORMALITY_FILE: &str = "distribution_results.csv";

/// A report step that failed while the generator kept going.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: String,
    pub message: String,
}

/// Artifacts written plus any step failures.
#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<StepFailure>,
}

/// Writes the report artifacts for one table.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    engine: ReportEngineKind,
    normality_alpha: f64,
    fail_fast: bool,
    baseline: Option<Table>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl ReportGenerator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            engine: config.report_engine,
            normality_alpha: config.normality_alpha,
            fail_fast: config.fail_fast,
            baseline: None,
        }
    }

    /// Table the comparison engine compares against.
    pub fn with_baseline(mut self, baseline: Table) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Write every artifact for `table` into `output_dir`, creating it if needed.
    pub fn generate(&self, table: &Table, output_dir: &Path) -> Result<ReportOutcome> {
        fs::create_dir_all(output_dir).map_err(|e| {
            EdaError::ReportGenerationFailure(format!(
                "cannot create {}: {}",
                output_dir.display(),
                e
            ))
        })?;

        let mut outcome = ReportOutcome::default();
        info!("Generating report in {}", output_dir.display());

        self.run_step(&mut outcome, "summary statistics", || {
            Self::summary_step(table, output_dir)
        })?;

        for column in table.numeric_columns() {
            self.run_step(&mut outcome, &format!("histogram '{}'", column), || {
                let values = table.observed_numeric(&column)?;
                let figure = histogram::render(&column, table.file_stem(&column)?, &values)?;
                Ok(vec![Self::write_figure(
                    &figure,
                    output_dir,
                    ArtifactKind::Histogram,
                    Some(&column),
                )?])
            })?;
        }

        if table.numeric_columns().is_empty() {
            warn!("No numeric columns; skipping correlation heatmap");
        } else {
            self.run_step(&mut outcome, "correlation heatmap", || {
                let matrix = CorrelationMatrix::from_table(table)?;
                let figure = heatmap::render(&matrix.columns, &matrix.values)?;
                Ok(vec![Self::write_figure(
                    &figure,
                    output_dir,
                    ArtifactKind::CorrelationHeatmap,
                    None,
                )?])
            })?;
        }

        self.run_step(&mut outcome, "normality tests", || {
            self.normality_step(table, output_dir)
        })?;

        for column in table.categorical_columns() {
            self.run_step(&mut outcome, &format!("count plot '{}'", column), || {
                let values = table.text_values(&column)?;
                let counts = value_counts(values.iter().flatten().map(String::as_str));
                let figure = bars::render(&column, table.file_stem(&column)?, &counts)?;
                Ok(vec![Self::write_figure(
                    &figure,
                    output_dir,
                    ArtifactKind::CountPlot,
                    Some(&column),
                )?])
            })?;
        }

        let options = EngineOptions {
            normality_alpha: self.normality_alpha,
            baseline: self.baseline.clone(),
        };
        if let Some(engine) = self.engine.engine_with(options) {
            let step = format!("{} report", engine.name());
            self.run_step(&mut outcome, &step, || {
                Ok(vec![engine.generate(table, output_dir)?])
            })?;
        }

        info!(
            "Report complete: {} artifacts, {} failed steps",
            outcome.artifacts.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }

    /// Run one step. In fail-fast mode a failure ends the report; otherwise
    /// it is recorded and the next step runs.
    fn run_step<F>(&self, outcome: &mut ReportOutcome, step: &str, f: F) -> Result<()>
    where
        F: FnOnce() -> anyhow::Result<Vec<Artifact>>,
    {
        debug!("Report step: {}", step);
        match f() {
            Ok(artifacts) => {
                outcome.artifacts.extend(artifacts);
                Ok(())
            }
            Err(e) if self.fail_fast => Err(EdaError::ReportGenerationFailure(format!(
                "{}: {:#}",
                step, e
            ))),
            Err(e) => {
                warn!("Report step '{}' failed: {:#}", step, e);
                outcome.failures.push(StepFailure {
                    step: step.to_string(),
                    message: format!("{:#}", e),
                });
                Ok(())
            }
        }
    }

    fn summary_step(table: &Table, output_dir: &Path) -> anyhow::Result<Vec<Artifact>> {
        let rows = summarize(table)?;
        let mut frame = summary_frame(&rows)?;
        let path = output_dir.join(SUMMARY_FILE);
        write_csv(&mut frame, &path)?;
        Ok(vec![Artifact::new(ArtifactKind::SummaryTable, path)])
    }

    fn normality_step(&self, table: &Table, output_dir: &Path) -> anyhow::Result<Vec<Artifact>> {
        let mut records = Vec::new();
        for column in table.numeric_columns() {
            let values = table.observed_numeric(&column)?;
            records.push(NormalityRecord::test(&column, &values, self.normality_alpha));
        }
        let mut frame = normality_frame(&records)?;
        let path = output_dir.join(NORMALITY_FILE);
        write_csv(&mut frame, &path)?;
        Ok(vec![Artifact::new(ArtifactKind::NormalityTable, path)])
    }

    fn write_figure(
        figure: &Figure,
        output_dir: &Path,
        kind: ArtifactKind,
        column: Option<&str>,
    ) -> anyhow::Result<Artifact> {
        let path = figure
            .write_to(output_dir)
            .with_context(|| format!("writing {}", figure.file_name))?;
        debug!("Saved {}", path.display());
        Ok(match column {
            Some(column) => Artifact::for_column(kind, path, column),
            None => Artifact::new(kind, path),
        })
    }
}

/// One row per tested column.
pub fn normality_frame(records: &[NormalityRecord]) -> Result<DataFrame> {
    let columns: Vec<Column> = vec![
        Series::new(
            "column".into(),
            records.iter().map(|r| r.column.clone()).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "n".into(),
            records.iter().map(|r| r.n as u64).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "statistic".into(),
            records.iter().map(|r| r.w).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "p_value".into(),
            records.iter().map(|r| r.p_value).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "looks_normal".into(),
            records.iter().map(|r| r.looks_normal).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "status".into(),
            records.iter().map(|r| r.status.as_str()).collect::<Vec<_>>(),
        )
        .into(),
    ];
    Ok(DataFrame::new(columns)?)
}

fn write_csv(frame: &mut DataFrame, path: &Path) -> anyhow::Result<()> {
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(frame)
        .with_context(|| format!("writing {}", path.display()))?;
    debug!("Saved {}", path.display());
    Ok(())
}
