//! Spreadsheet parsing (first worksheet of an `.xlsx` workbook).

use crate::error::{EdaError, Result};
use calamine::{Data, Reader, Xlsx};
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;

/// Parse the first worksheet; the first row holds the column names.
pub(super) fn read_xlsx(file_name: &str, bytes: &[u8]) -> Result<DataFrame> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| EdaError::load_failure(file_name, e))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| EdaError::load_failure(file_name, e))?,
        None => return Err(EdaError::EmptyDataset(file_name.to_string())),
    };

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(header) => header,
        None => return Err(EdaError::EmptyDataset(file_name.to_string())),
    };
    let names = header_names(header);
    let body: Vec<&[Data]> = rows.collect();
    let empty = Data::Empty;

    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&empty))
                .collect();
            build_column(name, &cells)
        })
        .collect::<Vec<Column>>();

    DataFrame::new(columns).map_err(|e| EdaError::load_failure(file_name, e))
}

/// Column names from the header row; blanks become `Unnamed: i` and repeats
/// get a numeric suffix.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell {
                Data::Empty => format!("Unnamed: {}", idx),
                other => {
                    let text = other.to_string();
                    if text.trim().is_empty() {
                        format!("Unnamed: {}", idx)
                    } else {
                        text.trim().to_string()
                    }
                }
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn is_missing(cell: &Data) -> bool {
    matches!(cell, Data::Empty | Data::Error(_))
}

fn as_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(v) => Some(*v as f64),
        Data::Float(v) => Some(*v),
        _ => None,
    }
}

/// Numeric when every present cell is a number, text otherwise.
fn build_column(name: &str, cells: &[&Data]) -> Column {
    let all_numeric = cells
        .iter()
        .filter(|c| !is_missing(c))
        .all(|c| as_number(c).is_some());

    if all_numeric {
        let values: Vec<Option<f64>> = cells.iter().map(|c| as_number(c)).collect();
        Series::new(name.into(), values).into()
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| match c {
                Data::Empty | Data::Error(_) => None,
                Data::String(s) if s.trim().is_empty() => None,
                Data::String(s) => Some(s.clone()),
                Data::Bool(b) => Some(b.to_string()),
                Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect();
        Series::new(name.into(), values).into()
    }
}
