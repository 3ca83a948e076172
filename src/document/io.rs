//! File I/O operations and validation
//!
//! This module checks that an input path is a readable .docx package before
//! it is handed to docx-rs.

use std::fs::File;
use std::path::Path;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// Validates that the file exists and is a legitimate .docx file
pub(crate) fn validate_docx_file(file_path: &Path) -> Result<()> {
    if !file_path.is_file() {
        return Err(Error::ResourceNotFound(file_path.to_path_buf()));
    }

    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if !extension.eq_ignore_ascii_case("docx") {
        return Err(Error::UnsupportedDocument(format!(
            "expected a .docx file, got .{extension} (only Word .docx packages are supported)"
        )));
    }

    // Check ZIP structure contains word/document.xml
    let file = File::open(file_path)?;
    let mut archive = ZipArchive::new(file)?;

    if archive.by_name("word/document.xml").is_err() {
        if archive.by_name("xl/workbook.xml").is_ok() {
            return Err(Error::UnsupportedDocument(
                "this appears to be an Excel workbook (.xlsx), not a Word document".to_string(),
            ));
        }

        return Err(Error::UnsupportedDocument(
            "missing word/document.xml; the file may be corrupted".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_resource_not_found() {
        let err = validate_docx_file(Path::new("does/not/exist.docx")).unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound(_)));
    }

    #[test]
    fn test_wrong_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "plain text").unwrap();
        let err = validate_docx_file(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDocument(_)));
    }
}
