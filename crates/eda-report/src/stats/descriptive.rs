//! Descriptive statistics per column.

use crate::error::Result;
use crate::types::{ColumnKind, Table};
use crate::utils::{mean, quantile_sorted, sample_std, sorted, value_counts};
use polars::prelude::*;
use serde::Serialize;

/// One row of the summary table.
///
/// Numeric columns fill the moment and quantile fields, categorical-like
/// columns fill `unique`, `top` and `freq`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub kind: ColumnKind,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
    pub unique: Option<usize>,
    pub top: Option<String>,
    pub freq: Option<usize>,
}

impl ColumnSummary {
    fn numeric(column: &str, height: usize, values: &[f64]) -> Self {
        let s = sorted(values);
        Self {
            column: column.to_string(),
            kind: ColumnKind::Numeric,
            count: s.len(),
            missing: height - s.len(),
            mean: mean(&s),
            std: sample_std(&s),
            min: s.first().copied(),
            p25: quantile_sorted(&s, 0.25),
            p50: quantile_sorted(&s, 0.5),
            p75: quantile_sorted(&s, 0.75),
            max: s.last().copied(),
            unique: None,
            top: None,
            freq: None,
        }
    }

    fn categorical(column: &str, kind: ColumnKind, values: &[Option<String>]) -> Self {
        let counts = value_counts(values.iter().flatten().map(String::as_str));
        let count = values.iter().flatten().count();
        let (top, freq) = match counts.first() {
            Some((value, freq)) => (Some(value.clone()), Some(*freq)),
            None => (None, None),
        };
        Self {
            column: column.to_string(),
            kind,
            count,
            missing: values.len() - count,
            mean: None,
            std: None,
            min: None,
            p25: None,
            p50: None,
            p75: None,
            max: None,
            unique: Some(counts.len()),
            top,
            freq,
        }
    }
}

/// Summarise every column in table order.
pub fn summarize(table: &Table) -> Result<Vec<ColumnSummary>> {
    let height = table.height();
    table
        .columns()
        .iter()
        .map(|spec| match spec.kind {
            ColumnKind::Numeric => Ok(ColumnSummary::numeric(
                &spec.name,
                height,
                &table.observed_numeric(&spec.name)?,
            )),
            ColumnKind::Text | ColumnKind::Categorical => Ok(ColumnSummary::categorical(
                &spec.name,
                spec.kind,
                &table.text_values(&spec.name)?,
            )),
        })
        .collect()
}

/// Lay the summaries out as a frame, one row per column.
pub fn summary_frame(rows: &[ColumnSummary]) -> Result<DataFrame> {
    let floats = |f: fn(&ColumnSummary) -> Option<f64>| -> Vec<Option<f64>> {
        rows.iter().map(f).collect()
    };
    let counts = |f: fn(&ColumnSummary) -> Option<usize>| -> Vec<Option<u64>> {
        rows.iter().map(|r| f(r).map(|v| v as u64)).collect()
    };

    let columns: Vec<Column> = vec![
        Series::new(
            "column".into(),
            rows.iter().map(|r| r.column.clone()).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "kind".into(),
            rows.iter().map(|r| r.kind.as_str()).collect::<Vec<_>>(),
        )
        .into(),
        Series::new("count".into(), counts(|r| Some(r.count))).into(),
        Series::new("missing".into(), counts(|r| Some(r.missing))).into(),
        Series::new("mean".into(), floats(|r| r.mean)).into(),
        Series::new("std".into(), floats(|r| r.std)).into(),
        Series::new("min".into(), floats(|r| r.min)).into(),
        Series::new("25%".into(), floats(|r| r.p25)).into(),
        Series::new("50%".into(), floats(|r| r.p50)).into(),
        Series::new("75%".into(), floats(|r| r.p75)).into(),
        Series::new("max".into(), floats(|r| r.max)).into(),
        Series::new("unique".into(), counts(|r| r.unique)).into(),
        Series::new(
            "top".into(),
            rows.iter().map(|r| r.top.clone()).collect::<Vec<_>>(),
        )
        .into(),
        Series::new("freq".into(), counts(|r| r.freq)).into(),
    ];

    Ok(DataFrame::new(columns)?)
}
