//! IQR-based outlier clipping.
//!
//! Values outside `[Q1 - k*IQR, Q3 + k*IQR]` are clamped to the nearest
//! bound; rows are never removed.

use crate::charts::{Figure, boxplot};
use crate::error::{EdaError, Result};
use crate::types::Table;
use crate::utils::{format_float, quantile_sorted, sorted};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Clip bounds computed for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipBounds {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
    /// Values raised to `lower`.
    pub clipped_low: usize,
    /// Values lowered to `upper`.
    pub clipped_high: usize,
}

impl ClipBounds {
    pub fn clipped_total(&self) -> usize {
        self.clipped_low + self.clipped_high
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Before/after boxplot for one column.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub column: String,
    pub figure: Figure,
}

/// Result of clipping every numeric column.
#[derive(Debug, Default)]
pub struct ClipReport {
    pub bounds: Vec<ClipBounds>,
    pub diagnostics: Vec<Diagnostic>,
    pub actions: Vec<String>,
}

/// Clamps numeric columns to their IQR fences.
#[derive(Debug, Clone, Copy)]
pub struct OutlierClipper {
    multiplier: f64,
}

impl OutlierClipper {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// Quartiles and fences for a sample, `None` when it is empty.
    pub fn bounds_for(&self, column: &str, values: &[f64]) -> Option<ClipBounds> {
        let s = sorted(values);
        let q1 = quantile_sorted(&s, 0.25)?;
        let q3 = quantile_sorted(&s, 0.75)?;
        let iqr = q3 - q1;
        Some(ClipBounds {
            column: column.to_string(),
            q1,
            q3,
            iqr,
            lower: q1 - self.multiplier * iqr,
            upper: q3 + self.multiplier * iqr,
            clipped_low: 0,
            clipped_high: 0,
        })
    }

    /// Clip one column in place and return the bounds used.
    ///
    /// Returns `None` for a column with no finite values.
    pub fn clip_column(&self, table: &mut Table, column: &str) -> Result<Option<ClipBounds>> {
        let observed = table.observed_numeric(column)?;
        let Some(mut bounds) = self.bounds_for(column, &observed) else {
            return Ok(None);
        };

        let clipped: Vec<Option<f64>> = table
            .numeric_values(column)?
            .into_iter()
            .map(|v| {
                v.map(|val| {
                    if val < bounds.lower {
                        bounds.clipped_low += 1;
                        bounds.lower
                    } else if val > bounds.upper {
                        bounds.clipped_high += 1;
                        bounds.upper
                    } else {
                        val
                    }
                })
            })
            .collect();

        table.replace_numeric(column, clipped)?;
        debug!(
            "Clipped '{}' to [{}, {}] ({} low, {} high)",
            column,
            format_float(Some(bounds.lower)),
            format_float(Some(bounds.upper)),
            bounds.clipped_low,
            bounds.clipped_high
        );
        Ok(Some(bounds))
    }

    /// Clip every numeric column, optionally rendering a before/after
    /// boxplot for each.
    pub fn clip_all(&self, table: &mut Table, emit_diagnostics: bool) -> Result<ClipReport> {
        let mut report = ClipReport::default();

        for column in table.numeric_columns() {
            let before = table.observed_numeric(&column)?;
            let Some(bounds) = self.clip_column(table, &column)? else {
                continue;
            };

            if emit_diagnostics {
                let after = table.observed_numeric(&column)?;
                let stem = table.file_stem(&column)?;
                let figure = boxplot::render(&column, stem, &before, &after).map_err(|e| {
                    EdaError::ReportGenerationFailure(format!(
                        "boxplot for '{}': {}",
                        column, e
                    ))
                })?;
                report.diagnostics.push(Diagnostic {
                    column: column.clone(),
                    figure,
                });
            }

            if bounds.clipped_total() > 0 {
                report.actions.push(format!(
                    "Clipped {} outliers in '{}' to [{}, {}]",
                    bounds.clipped_total(),
                    column,
                    format_float(Some(bounds.lower)),
                    format_float(Some(bounds.upper))
                ));
            }
            report.bounds.push(bounds);
        }

        Ok(report)
    }
}

impl Default for OutlierClipper {
    fn default() -> Self {
        Self::new(1.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table(df: DataFrame) -> Table {
        Table::from_frame(df).unwrap()
    }

    #[test]
    fn test_bounds_linear_quartiles() {
        let bounds = OutlierClipper::default()
            .bounds_for("x", &[1.0, 2.0, 3.0, 4.0, 100.0])
            .unwrap();
        assert_eq!(bounds.q1, 2.0);
        assert_eq!(bounds.q3, 4.0);
        assert_eq!(bounds.lower, -1.0);
        assert_eq!(bounds.upper, 7.0);
    }

    #[test]
    fn test_clip_column_clamps_without_removing_rows() {
        let mut t = table(df!["x" => [1.0, 2.0, 3.0, 4.0, 100.0]].unwrap());
        let bounds = OutlierClipper::default()
            .clip_column(&mut t, "x")
            .unwrap()
            .unwrap();

        assert_eq!(t.height(), 5);
        assert_eq!(bounds.clipped_high, 1);
        assert_eq!(bounds.clipped_low, 0);
        assert_eq!(t.numeric_values("x").unwrap()[4], Some(7.0));
        assert!(t.observed_numeric("x").unwrap().iter().all(|v| bounds.contains(*v)));
    }

    #[test]
    fn test_constant_column_collapses_bounds() {
        let mut t = table(df!["x" => [5.0, 5.0, 5.0]].unwrap());
        let bounds = OutlierClipper::default()
            .clip_column(&mut t, "x")
            .unwrap()
            .unwrap();
        assert_eq!(bounds.lower, 5.0);
        assert_eq!(bounds.upper, 5.0);
        assert_eq!(bounds.clipped_total(), 0);
    }

    #[test]
    fn test_multiplier_widens_fences() {
        let values = [1.0, 2.0, 3.0, 4.0, 100.0];
        let narrow = OutlierClipper::new(1.5).bounds_for("x", &values).unwrap();
        let wide = OutlierClipper::new(3.0).bounds_for("x", &values).unwrap();
        assert!(wide.upper > narrow.upper);
        assert!(wide.lower < narrow.lower);
    }

    #[test]
    fn test_clip_all_emits_diagnostics_for_numeric_columns() {
        let mut t = table(
            df![
                "x" => [1.0, 2.0, 3.0, 4.0, 100.0],
                "label" => ["a", "b", "c", "d", "e"],
            ]
            .unwrap(),
        );
        let report = OutlierClipper::default().clip_all(&mut t, true).unwrap();
        assert_eq!(report.bounds.len(), 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].figure.file_name, "x_boxplot.svg");
        assert_eq!(report.actions.len(), 1);

        let mut t2 = table(df!["x" => [1.0, 2.0]].unwrap());
        let quiet = OutlierClipper::default().clip_all(&mut t2, false).unwrap();
        assert!(quiet.diagnostics.is_empty());
        assert!(quiet.actions.is_empty());
    }

    #[test]
    fn test_diagnostics_for_similar_names_do_not_share_files() {
        let mut t = table(df!["Age?" => [1.0, 2.0, 3.0], "Age" => [4.0, 5.0, 6.0]].unwrap());
        let report = OutlierClipper::default().clip_all(&mut t, true).unwrap();
        let names: Vec<&str> = report
            .diagnostics
            .iter()
            .map(|d| d.figure.file_name.as_str())
            .collect();
        assert_eq!(names, vec!["Age_boxplot.svg", "Age_2_boxplot.svg"]);
    }
}
