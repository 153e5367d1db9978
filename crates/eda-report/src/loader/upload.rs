//! Upload handling: the named byte source and its staging on disk.

use crate::error::{EdaError, Result, ResultExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// A file received from the user: its client-supplied name plus raw bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let bytes = fs::read(path).map_err(|e| EdaError::load_failure(file_name.clone(), e))?;
        Ok(Self { file_name, bytes })
    }
}

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("valid regex"));

const WINDOWS_DEVICE_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Reduce a client-supplied file name to a safe single path component.
///
/// The name is NFKD-decomposed and any non-ASCII residue dropped, so
/// `résumé` becomes `resume`. Path separators and whitespace runs
/// become `_`, anything outside `[A-Za-z0-9_.-]` is removed and leading or
/// trailing `.`/`_` are stripped. Windows device names get a `_` prefix.
/// The result may be empty.
pub fn sanitize_filename(name: &str) -> String {
    // decompose first so accented letters keep their base character
    let ascii: String = name.nfkd().filter(char::is_ascii).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let stripped = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    let trimmed = stripped.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = trimmed.split('.').next().unwrap_or_default().to_ascii_uppercase();
    if WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        format!("_{}", trimmed)
    } else {
        trimmed
    }
}

/// Write the upload into `dir` under its sanitized name.
///
/// Returns the path written. Fails when the sanitized name is empty.
pub fn stage_upload(dir: &Path, upload: &Upload) -> Result<PathBuf> {
    let safe_name = sanitize_filename(&upload.file_name);
    if safe_name.is_empty() {
        return Err(EdaError::InvalidConfig(format!(
            "upload name '{}' has no usable characters",
            upload.file_name
        )));
    }

    let path = dir.join(&safe_name);
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, &upload.bytes))
        .map_err(EdaError::from)
        .context(format!("staging upload at {}", path.display()))?;
    debug!("Staged upload '{}' at {}", upload.file_name, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize_filename("sales 2024.csv"), "sales_2024.csv");
        assert_eq!(sanitize_filename("My  cool   data.xlsx"), "My_cool_data.xlsx");
    }

    #[test]
    fn test_sanitize_strips_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("..\\..\\boot.ini"), "boot.ini");
        assert!(!sanitize_filename("/tmp/../x.csv").contains('/'));
    }

    #[test]
    fn test_sanitize_drops_non_ascii_and_symbols() {
        assert_eq!(sanitize_filename("résumé$.csv"), "resume.csv");
        assert_eq!(sanitize_filename("Ｄａｔａ ñ.csv"), "Data_n.csv");
        assert_eq!(sanitize_filename("数据.csv"), "csv");
        assert_eq!(sanitize_filename("???"), "");
    }

    #[test]
    fn test_sanitize_windows_device_names() {
        assert_eq!(sanitize_filename("con.csv"), "_con.csv");
        assert_eq!(sanitize_filename("console.csv"), "console.csv");
    }

    #[test]
    fn test_stage_upload_writes_sanitized_name() {
        let dir = std::env::temp_dir().join(format!("eda-stage-{}", rand::random::<u32>()));
        let upload = Upload::new("../weird name.csv", b"a\n1\n".to_vec());

        let path = stage_upload(&dir, &upload).unwrap();
        assert_eq!(path, dir.join("weird_name.csv"));
        assert_eq!(fs::read(&path).unwrap(), b"a\n1\n");

        let empty = Upload::new("///", Vec::new());
        assert!(stage_upload(&dir, &empty).is_err());

        fs::remove_dir_all(&dir).ok();
    }
}
