//! Data cleaning for loaded tables.
//!
//! The cleaner runs a fixed sequence over a [`Table`]:
//! 1. Missing-value imputation (mean for numeric, mode for text)
//! 2. Exact duplicate row removal, keeping the first occurrence
//! 3. IQR outlier clipping on numeric columns
//! 4. Coercion of text columns to categorical

mod imputation;
mod outliers;

pub use imputation::StatisticalImputer;
pub use outliers::{ClipBounds, ClipReport, Diagnostic, OutlierClipper};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::progress::{
    NoopProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::types::{ColumnKind, Table};
use tracing::{debug, info};

/// Everything the cleaner produced for one table.
#[derive(Debug)]
pub struct CleaningOutcome {
    pub table: Table,
    /// Before/after boxplots, one per numeric column.
    pub diagnostics: Vec<Diagnostic>,
    /// Human-readable log of what was changed.
    pub actions: Vec<String>,
    pub bounds: Vec<ClipBounds>,
}

/// Runs the cleaning steps in order.
#[derive(Debug, Clone)]
pub struct DataCleaner {
    clipper: OutlierClipper,
    emit_diagnostics: bool,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self {
            clipper: OutlierClipper::default(),
            emit_diagnostics: true,
        }
    }
}

impl DataCleaner {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            clipper: OutlierClipper::new(config.iqr_multiplier),
            emit_diagnostics: config.emit_diagnostics,
        }
    }

    /// Clean a table, consuming it.
    pub fn clean(&self, table: Table) -> Result<CleaningOutcome> {
        self.clean_with_progress(table, &NoopProgressReporter)
    }

    /// Clean a table, announcing each step to `progress`.
    pub fn clean_with_progress(
        &self,
        table: Table,
        progress: &dyn ProgressReporter,
    ) -> Result<CleaningOutcome> {
        let mut table = table;
        let mut actions = Vec::new();

        info!("Performing data cleaning...");

        // 1. Imputation
        progress.report(ProgressUpdate::started(PipelineStage::Imputation));
        let filled = StatisticalImputer::impute_all(&mut table)?;
        if filled.is_empty() {
            actions.push("No missing values found".to_string());
        }
        actions.extend(filled);

        // 2. Duplicates
        progress.report(ProgressUpdate::started(PipelineStage::Deduplication));
        let removed = Self::remove_duplicates(&mut table)?;
        if removed > 0 {
            actions.push(format!("Removed {} duplicate rows", removed));
        } else {
            actions.push("No duplicate rows found".to_string());
        }
        debug!("Removed {} duplicate rows", removed);

        // 3. Outliers
        progress.report(ProgressUpdate::started(PipelineStage::OutlierClipping));
        let clip = self.clipper.clip_all(&mut table, self.emit_diagnostics)?;
        actions.extend(clip.actions);

        // 4. Coercion
        progress.report(ProgressUpdate::started(PipelineStage::TypeCoercion));
        let coerced = Self::coerce_categorical(&mut table)?;
        if !coerced.is_empty() {
            actions.push(format!(
                "Converted {} text columns to categorical: {}",
                coerced.len(),
                coerced.join(", ")
            ));
        }

        info!(
            "Cleaning complete: {} rows x {} columns, {} actions",
            table.height(),
            table.width(),
            actions.len()
        );

        Ok(CleaningOutcome {
            table,
            diagnostics: clip.diagnostics,
            actions,
            bounds: clip.bounds,
        })
    }

    /// Drop rows that exactly repeat an earlier row. Returns how many were
    /// dropped. Row order is preserved.
    pub fn remove_duplicates(table: &mut Table) -> Result<usize> {
        table.drop_duplicate_rows()
    }

    /// Number of rows that repeat an earlier row.
    pub fn duplicate_count(table: &Table) -> Result<usize> {
        table.duplicate_row_count()
    }

    /// Re-tag every text column as categorical. Values are left as they are.
    pub fn coerce_categorical(table: &mut Table) -> Result<Vec<String>> {
        let text_columns: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| c.kind == ColumnKind::Text)
            .map(|c| c.name.clone())
            .collect();
        for name in &text_columns {
            table.set_kind(name, ColumnKind::Categorical)?;
        }
        Ok(text_columns)
    }
}
