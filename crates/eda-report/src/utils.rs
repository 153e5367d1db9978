//! Shared utilities for the cleaning and report pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::{HashMap, HashSet};

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Descriptive Statistics
// =============================================================================

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() as f64 - 1.0);
    Some(variance.sqrt())
}

/// Sort a copy of the values ascending (NaN-free input expected).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile of pre-sorted values using linear interpolation between the two
/// nearest ranks (`h = (n - 1) * q`).
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * q;
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = h - lower as f64;
    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Frequency table of observed values, most frequent first.
///
/// Ties are ordered by value so the output is deterministic.
pub fn value_counts<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for val in values {
        *counts.entry(val).or_insert(0) += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(val, count)| (val.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Most frequent value; ties resolve to the smallest value in sort order.
pub fn string_mode(values: &[Option<String>]) -> Option<String> {
    value_counts(values.iter().flatten().map(String::as_str))
        .into_iter()
        .next()
        .map(|(val, _)| val)
}

// =============================================================================
// Path Utilities
// =============================================================================

static UNSAFE_COMPONENT_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").expect("valid regex"));

/// Turn a column name into a string that is safe as a file-name component.
/// Names with no usable characters clean to an empty string.
pub fn file_component(name: &str) -> String {
    UNSAFE_COMPONENT_CHARS
        .replace_all(name.trim(), "_")
        .trim_matches('_')
        .to_string()
}

/// File-name stems for a table's columns, unique within the table.
///
/// A name that cleans to nothing, or whose stem is already taken, gets its
/// 1-based column position appended.
pub fn file_stems<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut used = HashSet::new();
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let cleaned = file_component(name);
            let (base, mut stem) = if cleaned.is_empty() {
                ("column".to_string(), format!("column_{}", index + 1))
            } else {
                (cleaned.clone(), cleaned)
            };
            let mut suffix = index + 1;
            while used.contains(&stem) {
                stem = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            used.insert(stem.clone());
            stem
        })
        .collect()
}

/// Format an optional float for tables, `"nan"` when undefined.
pub fn format_float(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.4}", v),
        _ => "nan".to_string(),
    }
}
