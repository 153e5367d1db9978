//! Table loading from uploaded byte streams.
//!
//! The loader inspects the upload's file-name extension, parses the bytes as
//! CSV or as the first sheet of an `.xlsx` workbook, and rejects empty
//! results. Loading is a single attempt with no filesystem access beyond
//! [`TableLoader::load_path`].

mod csv;
mod excel;
pub mod upload;

pub use upload::{Upload, sanitize_filename, stage_upload};

use crate::error::{EdaError, Result};
use crate::types::Table;
use std::path::Path;
use tracing::{debug, info};

/// Formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Detect the format from a file name's extension (case-insensitive).
    pub fn detect(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// Parses uploads into [`Table`]s.
pub struct TableLoader;

impl TableLoader {
    /// Load an upload into a table.
    ///
    /// # Errors
    ///
    /// - [`EdaError::UnsupportedFormat`] for extensions other than `.csv`/`.xlsx`
    ///   (the bytes are never inspected)
    /// - [`EdaError::EmptyDataset`] when the result has no rows or no columns
    /// - [`EdaError::LoadFailure`] when parsing fails
    pub fn load(upload: &Upload) -> Result<Table> {
        let format = SourceFormat::detect(&upload.file_name)
            .ok_or_else(|| EdaError::UnsupportedFormat(upload.file_name.clone()))?;

        if upload.bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(EdaError::EmptyDataset(upload.file_name.clone()));
        }

        debug!(
            "Parsing '{}' as {:?} ({} bytes)",
            upload.file_name,
            format,
            upload.bytes.len()
        );

        let frame = match format {
            SourceFormat::Csv => csv::read_csv(&upload.file_name, &upload.bytes)?,
            SourceFormat::Xlsx => excel::read_xlsx(&upload.file_name, &upload.bytes)?,
        };

        if frame.height() == 0 || frame.width() == 0 {
            return Err(EdaError::EmptyDataset(upload.file_name.clone()));
        }

        let table = Table::from_frame(frame)
            .map_err(|e| EdaError::load_failure(upload.file_name.clone(), e))?;

        info!(
            "Loaded '{}': {} rows x {} columns",
            upload.file_name,
            table.height(),
            table.width()
        );
        Ok(table)
    }

    /// Read a file from disk and load it.
    pub fn load_path(path: impl AsRef<Path>) -> Result<Table> {
        let upload = Upload::from_path(path.as_ref())?;
        Self::load(&upload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnKind;
    use rust_xlsxwriter::Workbook;

    /// age,city workbook with one missing cell in each column.
    fn people_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "age").unwrap();
        sheet.write_string(0, 1, "city").unwrap();
        sheet.write_number(1, 0, 20).unwrap();
        sheet.write_string(1, 1, "NY").unwrap();
        sheet.write_number(2, 0, 25).unwrap();
        sheet.write_string(2, 1, "NY").unwrap();
        sheet.write_string(3, 1, "LA").unwrap();
        sheet.write_number(4, 0, 200).unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(SourceFormat::detect("data.csv"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::detect("DATA.CSV"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::detect("book.xlsx"), Some(SourceFormat::Xlsx));
        assert_eq!(SourceFormat::detect("book.xls"), None);
        assert_eq!(SourceFormat::detect("notes.txt"), None);
        assert_eq!(SourceFormat::detect("csv"), None);
    }

    #[test]
    fn test_unsupported_format_does_not_parse() {
        // Bytes are not valid anything; the extension alone decides.
        let upload = Upload::new("data.json", vec![0xff, 0xfe, 0x00]);
        assert!(matches!(
            TableLoader::load(&upload),
            Err(EdaError::UnsupportedFormat(name)) if name == "data.json"
        ));
    }

    #[test]
    fn test_load_csv() {
        let upload = Upload::new("people.csv", b"age,city\n20,NY\n25,NY\n,LA\n200,\n".to_vec());
        let table = TableLoader::load(&upload).unwrap();
        assert_eq!(table.height(), 4);
        assert_eq!(table.width(), 2);
        assert_eq!(table.kind_of("age").unwrap(), ColumnKind::Numeric);
        assert_eq!(table.kind_of("city").unwrap(), ColumnKind::Text);
        assert_eq!(table.null_count("age").unwrap(), 1);
        assert_eq!(table.null_count("city").unwrap(), 1);
    }

    #[test]
    fn test_header_only_csv_is_empty() {
        let upload = Upload::new("empty.csv", b"age,city\n".to_vec());
        assert!(matches!(
            TableLoader::load(&upload),
            Err(EdaError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_blank_upload_is_empty() {
        let upload = Upload::new("blank.csv", b"  \n".to_vec());
        assert!(matches!(
            TableLoader::load(&upload),
            Err(EdaError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_single_row_loads() {
        let upload = Upload::new("one.csv", b"x,label\n3.5,a\n".to_vec());
        let table = TableLoader::load(&upload).unwrap();
        assert_eq!(table.height(), 1);
    }

    #[test]
    fn test_load_xlsx() {
        let upload = Upload::new("people.xlsx", people_workbook());
        let table = TableLoader::load(&upload).unwrap();
        assert_eq!(table.height(), 4);
        assert_eq!(table.width(), 2);
        assert_eq!(table.kind_of("age").unwrap(), ColumnKind::Numeric);
        assert_eq!(table.kind_of("city").unwrap(), ColumnKind::Text);
        assert_eq!(table.null_count("age").unwrap(), 1);
        assert_eq!(table.null_count("city").unwrap(), 1);

        let age = table.numeric_values("age").unwrap();
        assert_eq!(age, vec![Some(20.0), Some(25.0), None, Some(200.0)]);
    }

    #[test]
    fn test_xlsx_matches_csv() {
        let csv = Upload::new("people.csv", b"age,city\n20,NY\n25,NY\n,LA\n200,\n".to_vec());
        let from_csv = TableLoader::load(&csv).unwrap();
        let from_xlsx = TableLoader::load(&Upload::new("people.xlsx", people_workbook())).unwrap();

        assert_eq!(from_csv.columns(), from_xlsx.columns());
        assert_eq!(
            from_csv.text_values("city").unwrap(),
            from_xlsx.text_values("city").unwrap()
        );
    }

    #[test]
    fn test_corrupt_xlsx_is_load_failure() {
        let upload = Upload::new("broken.xlsx", b"this is not a zip archive".to_vec());
        let err = TableLoader::load(&upload).unwrap_err();
        assert_eq!(err.error_code(), "LOAD_FAILURE");
    }
}
