//! Shared types used throughout the pipeline.
//!
//! [`Table`] is the in-memory dataset handed from the loader to the cleaner
//! and the report generator. Every column carries an explicit [`ColumnKind`]
//! tag decided once at load time, so later stages branch with `match` rather
//! than by inspecting polars dtypes again.

use crate::error::{EdaError, Result};
use crate::utils::{file_stems, is_numeric_dtype};
use chrono::Utc;
use polars::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Table
// ============================================================================

/// Semantic kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point values.
    Numeric,
    /// Free text (strings, booleans and dates are normalised to text on load).
    Text,
    /// Text tagged as categorical by the cleaner's coercion step.
    Categorical,
}

impl ColumnKind {
    /// Text and categorical columns share the frequency-based code paths.
    pub fn is_categorical_like(&self) -> bool {
        matches!(self, ColumnKind::Text | ColumnKind::Categorical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Categorical => "categorical",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and kind of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// A rectangular table of named, kind-tagged columns.
#[derive(Debug, Clone)]
pub struct Table {
    frame: DataFrame,
    columns: Vec<ColumnSpec>,
    /// File-name stem per column, unique within the table.
    stems: Vec<String>,
}

impl Table {
    /// Wrap a DataFrame, tagging each column.
    ///
    /// Numeric dtypes become [`ColumnKind::Numeric`]; every other dtype is
    /// cast to `String` and tagged [`ColumnKind::Text`].
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        let mut frame = frame;
        let mut columns = Vec::with_capacity(frame.width());
        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for name in names {
            let dtype = frame.column(&name)?.dtype().clone();
            let kind = if is_numeric_dtype(&dtype) {
                ColumnKind::Numeric
            } else {
                if dtype != DataType::String {
                    let as_text = frame
                        .column(&name)?
                        .as_materialized_series()
                        .cast(&DataType::String)?;
                    frame.replace(&name, as_text)?;
                }
                ColumnKind::Text
            };
            columns.push(ColumnSpec { name, kind });
        }

        let stems = file_stems(columns.iter().map(|c| c.name.as_str()));
        Ok(Self {
            frame,
            columns,
            stems,
        })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }

    /// Column specs in table order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Names of numeric columns in table order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Names of text or categorical columns in table order.
    pub fn categorical_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind.is_categorical_like())
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn kind_of(&self, name: &str) -> Result<ColumnKind> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.kind)
            .ok_or_else(|| EdaError::ColumnNotFound(name.to_string()))
    }

    /// Stem used for the column's per-column artifact files.
    pub fn file_stem(&self, name: &str) -> Result<&str> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .map(|i| self.stems[i].as_str())
            .ok_or_else(|| EdaError::ColumnNotFound(name.to_string()))
    }

    /// Re-tag a column without touching its values.
    pub fn set_kind(&mut self, name: &str, kind: ColumnKind) -> Result<()> {
        let spec = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| EdaError::ColumnNotFound(name.to_string()))?;
        spec.kind = kind;
        Ok(())
    }

    /// Number of missing cells in a column.
    pub fn null_count(&self, name: &str) -> Result<usize> {
        Ok(self.column(name)?.null_count())
    }

    /// Total missing cells across the table.
    pub fn total_null_count(&self) -> usize {
        self.frame.get_columns().iter().map(|c| c.null_count()).sum()
    }

    /// Values of a numeric column as `f64`, missing cells as `None`.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let series = self
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        Ok(series.f64()?.into_iter().collect())
    }

    /// Non-missing values of a numeric column.
    pub fn observed_numeric(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self
            .numeric_values(name)?
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect())
    }

    /// Values of a column rendered as text, missing cells as `None`.
    pub fn text_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        Ok(series
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    /// Replace a numeric column's values.
    pub fn replace_numeric(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        self.ensure_len(name, values.len())?;
        self.frame
            .replace(name, Series::new(name.into(), values))?;
        Ok(())
    }

    /// Replace a text column's values.
    pub fn replace_text(&mut self, name: &str, values: Vec<Option<String>>) -> Result<()> {
        self.ensure_len(name, values.len())?;
        self.frame
            .replace(name, Series::new(name.into(), values))?;
        Ok(())
    }

    /// Drop rows that repeat an earlier row across all columns, keeping
    /// first occurrences in their original order. Returns how many rows
    /// were dropped.
    pub fn drop_duplicate_rows(&mut self) -> Result<usize> {
        let unique = self.unique_rows()?;
        let removed = self.height() - unique.height();
        if removed > 0 {
            self.frame = unique;
        }
        Ok(removed)
    }

    /// Number of rows that repeat an earlier row.
    pub fn duplicate_row_count(&self) -> Result<usize> {
        Ok(self.height() - self.unique_rows()?.height())
    }

    fn unique_rows(&self) -> Result<DataFrame> {
        Ok(self
            .frame
            .unique_stable(None, UniqueKeepStrategy::First, None)?)
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.frame
            .column(name)
            .map_err(|_| EdaError::ColumnNotFound(name.to_string()))
    }

    fn ensure_len(&self, name: &str, len: usize) -> Result<()> {
        self.kind_of(name)?;
        if len != self.height() {
            return Err(EdaError::InvalidConfig(format!(
                "replacement for '{}' has {} values, expected {}",
                name,
                len,
                self.height()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Artifacts
// ============================================================================

/// What an output file represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Per-column descriptive statistics table.
    SummaryTable,
    /// Histogram with density overlay for one numeric column.
    Histogram,
    /// Pearson correlation heatmap over the numeric columns.
    CorrelationHeatmap,
    /// Normality test results table.
    NormalityTable,
    /// Category frequency bar chart for one categorical column.
    CountPlot,
    /// Self-contained HTML document from a report engine.
    EngineReport,
    /// Cleaner before/after boxplot for one numeric column.
    Diagnostic,
    /// HTML listing of a run's artifacts.
    Index,
    /// JSON manifest of a run's artifacts.
    Manifest,
}

impl ArtifactKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SummaryTable => "Summary statistics",
            Self::Histogram => "Histogram",
            Self::CorrelationHeatmap => "Correlation heatmap",
            Self::NormalityTable => "Normality tests",
            Self::CountPlot => "Count plot",
            Self::EngineReport => "Automated report",
            Self::Diagnostic => "Outlier clipping diagnostic",
            Self::Index => "Index",
            Self::Manifest => "Manifest",
        }
    }

    /// Whether the artifact is an image meant to be shown inline.
    pub fn is_image(&self) -> bool {
        matches!(
            self,
            Self::Histogram | Self::CorrelationHeatmap | Self::CountPlot | Self::Diagnostic
        )
    }
}

/// A produced output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    /// Column the artifact describes, for per-column artifacts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            column: None,
        }
    }

    pub fn for_column(kind: ArtifactKind, path: impl Into<PathBuf>, column: &str) -> Self {
        Self {
            kind,
            path: path.into(),
            column: Some(column.to_string()),
        }
    }

    /// File name of the artifact, for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Path relative to `base`, falling back to the full path.
    pub fn relative_to(&self, base: &Path) -> PathBuf {
        self.path
            .strip_prefix(base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.path.clone())
    }
}

// ============================================================================
// Run identity
// ============================================================================

/// Unique identifier of one pipeline run; names the run's output directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    /// Timestamp plus a random suffix, so runs started in the same
    /// millisecond still get distinct directories.
    pub fn generate() -> Self {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ");
        let suffix: u32 = rand::thread_rng().gen_range(0..0x0100_0000);
        Self(format!("{}-{:06x}", stamp, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
