//! Automated report engines.
//!
//! An engine turns a table into one self-contained HTML document. Which
//! engine runs is chosen with [`ReportEngineKind`].

use super::html;
use crate::charts::histogram;
use crate::cleaner::DataCleaner;
use crate::stats::{ColumnSummary, CorrelationMatrix, NormalityRecord, summarize};
use crate::types::{Artifact, ArtifactKind, ColumnKind, Table};
use crate::utils::{format_float, value_counts};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Categories listed per variable in the profiling report.
const TOP_CATEGORIES: usize = 10;

const STRONGEST_PAIRS: usize = 5;

/// Something that can write an automated report for a table.
pub trait ReportEngine {
    fn name(&self) -> &str;

    /// Write the report into `output_dir` and describe the file written.
    fn generate(&self, table: &Table, output_dir: &Path) -> Result<Artifact>;

    fn file_name(&self) -> String {
        format!("{}_report.html", self.name())
    }
}

/// Which automated report to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReportEngineKind {
    /// Single-table profile.
    #[default]
    Profiling,
    /// Baseline versus cleaned table comparison.
    Comparison,
    /// No automated report.
    None,
}

/// Inputs an engine may need beyond the table itself.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub normality_alpha: f64,
    /// Table to compare against, used by the comparison engine.
    pub baseline: Option<Table>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            normality_alpha: 0.05,
            baseline: None,
        }
    }
}

impl ReportEngineKind {
    /// Build the engine with default options; `None` for [`ReportEngineKind::None`].
    pub fn engine(&self) -> Option<Box<dyn ReportEngine>> {
        self.engine_with(EngineOptions::default())
    }

    pub fn engine_with(&self, options: EngineOptions) -> Option<Box<dyn ReportEngine>> {
        match self {
            Self::Profiling => Some(Box::new(ProfilingEngine::new(options.normality_alpha))),
            Self::Comparison => Some(Box::new(ComparisonEngine {
                baseline: options.baseline,
            })),
            Self::None => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profiling => "profiling",
            Self::Comparison => "comparison",
            Self::None => "none",
        }
    }
}

fn write_report(output_dir: &Path, file_name: &str, document: &str) -> Result<Artifact> {
    let path = output_dir.join(file_name);
    fs::write(&path, document).with_context(|| format!("writing {}", path.display()))?;
    debug!("Wrote {}", path.display());
    Ok(Artifact::new(ArtifactKind::EngineReport, path))
}

fn percent(part: usize, whole: usize) -> String {
    if whole == 0 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", part as f64 / whole as f64 * 100.0)
    }
}

// ============================================================================
// Profiling
// ============================================================================

/// Overview, per-variable detail, correlations and normality for one table.
#[derive(Debug, Clone)]
pub struct ProfilingEngine {
    normality_alpha: f64,
}

impl ProfilingEngine {
    pub fn new(normality_alpha: f64) -> Self {
        Self { normality_alpha }
    }

    fn overview(table: &Table) -> Result<String> {
        let mut kinds: Vec<(ColumnKind, usize)> = Vec::new();
        for spec in table.columns() {
            match kinds.iter_mut().find(|(k, _)| *k == spec.kind) {
                Some((_, n)) => *n += 1,
                None => kinds.push((spec.kind, 1)),
            }
        }
        let cells = table.height() * table.width();
        let missing = table.total_null_count();
        let duplicates = DataCleaner::duplicate_count(table)?;

        let mut rows = vec![
            vec!["Rows".to_string(), table.height().to_string()],
            vec!["Columns".to_string(), table.width().to_string()],
            vec![
                "Missing cells".to_string(),
                format!("{} ({})", missing, percent(missing, cells)),
            ],
            vec![
                "Duplicate rows".to_string(),
                format!("{} ({})", duplicates, percent(duplicates, table.height())),
            ],
        ];
        for (kind, n) in kinds {
            rows.push(vec![format!("{} columns", kind), n.to_string()]);
        }

        Ok(html::section("Overview") + &html::table(&["Metric", "Value"], &rows))
    }

    fn variable(table: &Table, summary: &ColumnSummary) -> Result<String> {
        let mut out = html::section(&format!("{} ({})", summary.column, summary.kind));
        let n = table.height();

        match summary.kind {
            ColumnKind::Numeric => {
                let rows = vec![
                    vec!["Count".to_string(), summary.count.to_string()],
                    vec![
                        "Missing".to_string(),
                        format!("{} ({})", summary.missing, percent(summary.missing, n)),
                    ],
                    vec!["Mean".to_string(), format_float(summary.mean)],
                    vec!["Std".to_string(), format_float(summary.std)],
                    vec!["Min".to_string(), format_float(summary.min)],
                    vec!["Median".to_string(), format_float(summary.p50)],
                    vec!["Max".to_string(), format_float(summary.max)],
                ];
                out.push_str(&html::table(&["Statistic", "Value"], &rows));

                let values = table.observed_numeric(&summary.column)?;
                if !values.is_empty() {
                    let stem = table.file_stem(&summary.column)?;
                    let figure = histogram::render(&summary.column, stem, &values)?;
                    out.push_str(&format!("<div class=\"figure\">{}</div>\n", figure.svg));
                }
            }
            ColumnKind::Text | ColumnKind::Categorical => {
                let values = table.text_values(&summary.column)?;
                let counts = value_counts(values.iter().flatten().map(String::as_str));
                out.push_str(&html::paragraph(&format!(
                    "{} distinct values, {} missing",
                    counts.len(),
                    summary.missing
                )));
                let rows: Vec<Vec<String>> = counts
                    .iter()
                    .take(TOP_CATEGORIES)
                    .map(|(value, count)| {
                        vec![value.clone(), count.to_string(), percent(*count, n)]
                    })
                    .collect();
                out.push_str(&html::table(&["Value", "Count", "Frequency"], &rows));
            }
        }
        Ok(out)
    }

    fn correlations(table: &Table) -> Result<String> {
        let matrix = CorrelationMatrix::from_table(table)?;
        let mut out = html::section("Correlations");
        if matrix.is_empty() {
            out.push_str(&html::paragraph("No numeric columns."));
            return Ok(out);
        }

        let mut headers = vec![""];
        headers.extend(matrix.columns.iter().map(String::as_str));
        let rows: Vec<Vec<String>> = matrix
            .columns
            .iter()
            .zip(&matrix.values)
            .map(|(name, row)| {
                std::iter::once(name.clone())
                    .chain(row.iter().map(|r| format_float(Some(*r))))
                    .collect()
            })
            .collect();
        out.push_str(&html::table(&headers, &rows));

        let pairs = matrix.strongest_pairs();
        if !pairs.is_empty() {
            out.push_str(&html::paragraph("Strongest pairs:"));
            out.push_str("<ul>\n");
            for (a, b, r) in pairs.iter().take(STRONGEST_PAIRS) {
                out.push_str(&format!(
                    "<li>{} / {}: {}</li>\n",
                    html::escape(a),
                    html::escape(b),
                    format_float(Some(*r))
                ));
            }
            out.push_str("</ul>\n");
        }
        Ok(out)
    }

    fn normality(&self, table: &Table) -> Result<String> {
        let mut out = html::section("Normality (Shapiro-Wilk)");
        let mut rows = Vec::new();
        for name in table.numeric_columns() {
            let values = table.observed_numeric(&name)?;
            let record = NormalityRecord::test(&name, &values, self.normality_alpha);
            let verdict = match record.looks_normal {
                Some(true) => "looks normal",
                Some(false) => "not normal",
                None => "-",
            };
            rows.push(vec![name, record.describe(), verdict.to_string()]);
        }
        if rows.is_empty() {
            out.push_str(&html::paragraph("No numeric columns."));
        } else {
            out.push_str(&html::table(&["Column", "Result", "Verdict"], &rows));
        }
        Ok(out)
    }
}

impl ReportEngine for ProfilingEngine {
    fn name(&self) -> &str {
        "profiling"
    }

    fn generate(&self, table: &Table, output_dir: &Path) -> Result<Artifact> {
        let mut body = Self::overview(table)?;
        for summary in summarize(table)? {
            body.push_str(&Self::variable(table, &summary)?);
        }
        body.push_str(&Self::correlations(table)?);
        body.push_str(&self.normality(table)?);

        let document = html::page("Profiling report", &body);
        write_report(output_dir, &self.file_name(), &document)
    }
}

// ============================================================================
// Comparison
// ============================================================================

/// Side-by-side view of a baseline table and the table being reported.
#[derive(Debug, Clone, Default)]
pub struct ComparisonEngine {
    baseline: Option<Table>,
}

impl ComparisonEngine {
    pub fn with_baseline(baseline: Table) -> Self {
        Self {
            baseline: Some(baseline),
        }
    }

    fn metric_rows(summary: &ColumnSummary) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Count", summary.count.to_string()),
            ("Missing", summary.missing.to_string()),
        ];
        match summary.kind {
            ColumnKind::Numeric => {
                rows.push(("Mean", format_float(summary.mean)));
                rows.push(("Min", format_float(summary.min)));
                rows.push(("Max", format_float(summary.max)));
            }
            ColumnKind::Text | ColumnKind::Categorical => {
                rows.push(("Distinct", summary.unique.unwrap_or(0).to_string()));
                rows.push((
                    "Top",
                    format!(
                        "{} ({})",
                        summary.top.as_deref().unwrap_or("-"),
                        summary.freq.unwrap_or(0)
                    ),
                ));
            }
        }
        rows
    }

    fn associations(
        column: &str,
        cleaned: &CorrelationMatrix,
        baseline: Option<&CorrelationMatrix>,
    ) -> Vec<Vec<String>> {
        cleaned
            .columns
            .iter()
            .filter(|other| other.as_str() != column)
            .map(|other| {
                let now = cleaned.get(column, other);
                let mut row = vec![format!("Pearson r with {}", other)];
                if let Some(base) = baseline {
                    row.push(format_float(base.get(column, other)));
                }
                row.push(format_float(now));
                row
            })
            .collect()
    }
}

impl ReportEngine for ComparisonEngine {
    fn name(&self) -> &str {
        "comparison"
    }

    fn generate(&self, table: &Table, output_dir: &Path) -> Result<Artifact> {
        let cleaned = summarize(table)?;
        let cleaned_corr = CorrelationMatrix::from_table(table)?;
        let (baseline, baseline_corr) = match &self.baseline {
            Some(base) => (
                Some(
                    summarize(base)?
                        .into_iter()
                        .map(|s| (s.column.clone(), s))
                        .collect::<HashMap<_, _>>(),
                ),
                Some(CorrelationMatrix::from_table(base)?),
            ),
            None => (None, None),
        };

        let mut body = String::new();
        let headers: &[&str] = match &baseline {
            Some(_) => {
                let base = self.baseline.as_ref().map(Table::height).unwrap_or(0);
                body.push_str(&html::paragraph(&format!(
                    "Baseline: {} rows. Cleaned: {} rows.",
                    base,
                    table.height()
                )));
                &["Metric", "Baseline", "Cleaned"][..]
            }
            None => {
                body.push_str(&html::paragraph(&format!(
                    "No baseline supplied; showing {} rows.",
                    table.height()
                )));
                &["Metric", "Value"][..]
            }
        };

        for summary in &cleaned {
            body.push_str(&html::section(&format!("{} ({})", summary.column, summary.kind)));
            let before = baseline.as_ref().and_then(|b| b.get(&summary.column));

            let mut rows: Vec<Vec<String>> = Self::metric_rows(summary)
                .into_iter()
                .map(|(label, value)| {
                    let mut row = vec![label.to_string()];
                    if baseline.is_some() {
                        let old = before
                            .and_then(|b| {
                                Self::metric_rows(b)
                                    .into_iter()
                                    .find(|(l, _)| *l == label)
                                    .map(|(_, v)| v)
                            })
                            .unwrap_or_else(|| "-".to_string());
                        row.push(old);
                    }
                    row.push(value);
                    row
                })
                .collect();

            if summary.kind == ColumnKind::Numeric {
                rows.extend(Self::associations(
                    &summary.column,
                    &cleaned_corr,
                    baseline_corr.as_ref(),
                ));
            }
            body.push_str(&html::table(headers, &rows));
        }

        let document = html::page("Comparison report", &body);
        write_report(output_dir, &self.file_name(), &document)
    }
}
