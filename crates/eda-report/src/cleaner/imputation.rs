//! Missing-value imputation.
//!
//! Numeric columns are filled with the mean of their observed values,
//! text and categorical columns with their mode.

use crate::error::{EdaError, Result};
use crate::types::{ColumnKind, Table};
use crate::utils::{format_float, mean, string_mode};
use tracing::debug;

/// Statistical imputation for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill every column that has at least one missing value.
    ///
    /// Returns one action description per filled column.
    pub fn impute_all(table: &mut Table) -> Result<Vec<String>> {
        let mut actions = Vec::new();
        let columns = table.columns().to_vec();

        for spec in columns {
            let has_gaps =
                table.null_count(&spec.name)? > 0 || Self::has_nan(table, &spec.name, spec.kind)?;
            if !has_gaps {
                continue;
            }
            let action = match spec.kind {
                ColumnKind::Numeric => Self::apply_numeric_mean(table, &spec.name)?,
                ColumnKind::Text | ColumnKind::Categorical => {
                    Self::apply_mode_imputation(table, &spec.name)?
                }
            };
            debug!("{}", action);
            actions.push(action);
        }

        Ok(actions)
    }

    /// Fill missing numeric cells with the mean of the observed cells.
    pub fn apply_numeric_mean(table: &mut Table, column: &str) -> Result<String> {
        let values = table.numeric_values(column)?;
        let observed: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();

        let fill_value = mean(&observed).ok_or_else(|| EdaError::ImputationImpossible {
            column: column.to_string(),
        })?;

        let mut filled_count = 0;
        let filled: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| match v {
                Some(val) if !val.is_nan() => Some(val),
                _ => {
                    filled_count += 1;
                    Some(fill_value)
                }
            })
            .collect();

        table.replace_numeric(column, filled)?;
        Ok(format!(
            "Filled {} missing values in '{}' with mean: {}",
            filled_count,
            column,
            format_float(Some(fill_value))
        ))
    }

    /// Fill missing text cells with the column's mode.
    pub fn apply_mode_imputation(table: &mut Table, column: &str) -> Result<String> {
        let values = table.text_values(column)?;
        let mode = string_mode(&values).ok_or_else(|| EdaError::ImputationImpossible {
            column: column.to_string(),
        })?;

        let mut filled_count = 0;
        let filled: Vec<Option<String>> = values
            .into_iter()
            .map(|v| match v {
                Some(val) => Some(val),
                None => {
                    filled_count += 1;
                    Some(mode.clone())
                }
            })
            .collect();

        table.replace_text(column, filled)?;
        Ok(format!(
            "Filled {} missing values in '{}' with mode: '{}'",
            filled_count, column, mode
        ))
    }

    fn has_nan(table: &Table, column: &str, kind: ColumnKind) -> Result<bool> {
        if kind != ColumnKind::Numeric {
            return Ok(false);
        }
        Ok(table
            .numeric_values(column)?
            .iter()
            .any(|v| v.is_some_and(f64::is_nan)))
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
    fn test_numeric_mean_uses_observed_values_only() {
        let mut t = table(df!["age" => [Some(20.0), Some(25.0), None, Some(200.0)]].unwrap());

        let action = StatisticalImputer::apply_numeric_mean(&mut t, "age").unwrap();

        let values = t.numeric_values("age").unwrap();
        assert_eq!(t.null_count("age").unwrap(), 0);
        assert!((values[2].unwrap() - 245.0 / 3.0).abs() < 1e-9);
        assert_eq!(values[0], Some(20.0));
        assert!(action.contains("mean"));
    }

    #[test]
    fn test_integer_column_mean() {
        let mut t = table(df!["n" => [Some(1i64), None, Some(2)]].unwrap());
        StatisticalImputer::apply_numeric_mean(&mut t, "n").unwrap();
        assert_eq!(
            t.numeric_values("n").unwrap(),
            vec![Some(1.0), Some(1.5), Some(2.0)]
        );
    }

    #[test]
    fn test_mode_imputation() {
        let mut t = table(df!["city" => [Some("NY"), Some("NY"), Some("LA"), None]].unwrap());

        StatisticalImputer::apply_mode_imputation(&mut t, "city").unwrap();

        let values = t.text_values("city").unwrap();
        assert_eq!(values[3].as_deref(), Some("NY"));
    }

    #[test]
    fn test_mode_tie_picks_first_sorted_value() {
        let mut t = table(df!["c" => [Some("b"), Some("a"), None]].unwrap());
        StatisticalImputer::apply_mode_imputation(&mut t, "c").unwrap();
        assert_eq!(t.text_values("c").unwrap()[2].as_deref(), Some("a"));
    }

    #[test]
    fn test_all_missing_numeric_column_fails() {
        let mut t = table(
            df![
                "x" => [Some(1.0), Some(2.0)],
                "empty" => [None::<f64>, None],
            ]
            .unwrap(),
        );

        let err = StatisticalImputer::impute_all(&mut t).unwrap_err();
        assert!(matches!(
            err,
            EdaError::ImputationImpossible { ref column } if column == "empty"
        ));
    }

    #[test]
    fn test_all_missing_text_column_fails() {
        let mut t = table(df!["label" => [None::<&str>, None]].unwrap());
        let err = StatisticalImputer::impute_all(&mut t).unwrap_err();
        assert_eq!(err.error_code(), "IMPUTATION_IMPOSSIBLE");
    }

    #[test]
    fn test_impute_all_skips_complete_columns() {
        let mut t = table(
            df![
                "a" => [1.0, 2.0],
                "b" => [Some("x"), None],
            ]
            .unwrap(),
        );
        let actions = StatisticalImputer::impute_all(&mut t).unwrap();
        assert_eq!(actions.len(), 1);
        assert!(actions[0].contains("'b'"));
    }
}
