//! Plain-text export of the active note.
//!
//! # Responsibility
//! - Derive a filesystem-safe file name from a note title.
//! - Package editor content for download/write by the front end.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// File name used when no note is active.
pub const DEFAULT_EXPORT_FILENAME: &str = "quick_note.txt";

static UNSAFE_FILENAME_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]").expect("valid filename regex"));

/// Export payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// Editor buffer is blank.
    EmptyContent,
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "no content to export"),
        }
    }
}

impl Error for ExportError {}

/// Builds the export file name for a note title.
///
/// Every character outside `[A-Za-z0-9]` becomes `_`, the result is
/// lower-cased and `.txt` is appended.
pub fn export_filename(title: Option<&str>) -> String {
    match title {
        Some(title) => {
            let stem = UNSAFE_FILENAME_CHARS_RE.replace_all(title, "_");
            format!("{}.txt", stem.to_lowercase())
        }
        None => DEFAULT_EXPORT_FILENAME.to_string(),
    }
}

/// Packages `contents` for export, refusing blank content.
pub fn build_export(title: Option<&str>, contents: &str) -> Result<ExportFile, ExportError> {
    if contents.trim().is_empty() {
        return Err(ExportError::EmptyContent);
    }
    Ok(ExportFile {
        filename: export_filename(title),
        contents: contents.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{build_export, export_filename, ExportError, DEFAULT_EXPORT_FILENAME};

    #[test]
    fn filename_is_sanitized_and_lowercased() {
        assert_eq!(export_filename(Some("My Notes: 2024!")), "my_notes__2024_.txt");
        assert_eq!(export_filename(Some("Café")), "caf_.txt");
    }

    #[test]
    fn filename_defaults_without_active_note() {
        assert_eq!(export_filename(None), DEFAULT_EXPORT_FILENAME);
    }

    #[test]
    fn blank_content_is_refused() {
        assert_eq!(
            build_export(Some("t"), " \n\t"),
            Err(ExportError::EmptyContent)
        );
        let file = build_export(Some("Groceries"), "milk").expect("export should succeed");
        assert_eq!(file.filename, "groceries.txt");
        assert_eq!(file.contents, "milk");
    }
}
