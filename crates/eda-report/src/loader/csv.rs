//! CSV parsing.

use crate::error::{EdaError, Result};
use polars::prelude::*;
use std::io::Cursor;

/// Rows sampled for schema inference.
const INFER_SCHEMA_ROWS: usize = 100;

/// Tokens read as missing values in addition to empty fields.
const MISSING_MARKERS: [&str; 7] = ["NA", "N/A", "n/a", "NaN", "null", "NULL", "#N/A"];

/// Parse CSV bytes with a header row.
pub(super) fn read_csv(file_name: &str, bytes: &[u8]) -> Result<DataFrame> {
    let null_values = NullValues::AllColumns(
        MISSING_MARKERS.iter().map(|m| PlSmallStr::from_str(m)).collect(),
    );

    CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(Some(b'"'))
                .with_null_values(Some(null_values)),
        )
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()
        .map_err(|e| EdaError::load_failure(file_name, e))
}
