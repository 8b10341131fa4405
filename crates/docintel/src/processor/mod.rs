pub mod pdf;
pub mod text;

use std::path::Path;

use crate::error::ProcessError;
use crate::sanitize::dotted_extension;

/// Upload formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Pdf,
}

impl DocumentFormat {
    /// Maps a dotted, case-insensitive extension such as `.PDF`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            ".txt" => Some(DocumentFormat::Text),
            ".pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }

    pub fn from_filename(name: &str) -> Option<Self> {
        Self::from_extension(&dotted_extension(name))
    }
}

/// Turns a stored upload into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ProcessError>;
}

/// Extraction for a single format. Emptiness is checked by the registry.
pub trait FormatExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ProcessError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

/// Routes a path to the extractor for its extension.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn FormatExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: vec![
                Box::new(text::PlainTextExtractor::new()),
                Box::new(pdf::PdfExtractor::new()),
            ],
        }
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for ExtractorRegistry {
    fn extract(&self, path: &Path) -> Result<String, ProcessError> {
        if !path.exists() {
            return Err(ProcessError::FileNotFound(path.to_path_buf()));
        }

        let extension = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(dotted_extension)
            .unwrap_or_default();

        let format = DocumentFormat::from_extension(&extension)
            .ok_or_else(|| ProcessError::UnsupportedFormat(extension.clone()))?;

        let extractor = self
            .extractors
            .iter()
            .find(|e| e.supports(format))
            .ok_or_else(|| ProcessError::UnsupportedFormat(extension.clone()))?;

        let text = extractor.extract(path)?;
        if text.trim().is_empty() {
            return Err(ProcessError::EmptyText);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_registry_routes_text_format() {
        let registry = ExtractorRegistry::new();

        let mut temp_file = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(temp_file, "Test content").unwrap();

        let text = registry.extract(temp_file.path()).unwrap();
        assert!(text.contains("Test content"));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let registry = ExtractorRegistry::new();

        let mut temp_file = NamedTempFile::with_suffix(".TXT").unwrap();
        writeln!(temp_file, "Upper case").unwrap();

        assert!(registry.extract(temp_file.path()).is_ok());
    }

    #[test]
    fn test_unsupported_format_error() {
        let registry = ExtractorRegistry::new();

        let temp_file = NamedTempFile::with_suffix(".xyz").unwrap();
        std::fs::write(temp_file.path(), b"some content").unwrap();

        match registry.extract(temp_file.path()) {
            Err(ProcessError::UnsupportedFormat(ext)) => assert_eq!(ext, ".xyz"),
            other => panic!("Expected UnsupportedFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_extension_error() {
        let registry = ExtractorRegistry::new();

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("noextension");
        std::fs::write(&file_path, b"some content").unwrap();

        match registry.extract(&file_path) {
            Err(ProcessError::UnsupportedFormat(ext)) => assert_eq!(ext, ""),
            other => panic!("Expected UnsupportedFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_file_not_found_error() {
        let registry = ExtractorRegistry::new();

        let err = registry
            .extract(Path::new("/nonexistent/path/file.txt"))
            .unwrap_err();
        assert!(matches!(err, ProcessError::FileNotFound(_)));
        assert!(err.to_string().starts_with("File not found on disk:"));
    }

    #[test]
    fn test_whitespace_only_text_is_empty() {
        let registry = ExtractorRegistry::new();

        let temp_file = NamedTempFile::with_suffix(".txt").unwrap();
        std::fs::write(temp_file.path(), b"  \n\t \n").unwrap();

        let err = registry.extract(temp_file.path()).unwrap_err();
        assert!(matches!(err, ProcessError::EmptyText));
        assert_eq!(err.to_string(), "No text could be extracted (empty result)");
    }

    #[test]
    fn test_document_format_from_filename() {
        assert_eq!(
            DocumentFormat::from_filename("Report.PDF"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_filename("notes.txt"),
            Some(DocumentFormat::Text)
        );
        assert_eq!(DocumentFormat::from_filename("photo.png"), None);
        assert_eq!(DocumentFormat::from_filename("README"), None);
    }
}
