use std::path::Path;

use crate::error::ProcessError;
use crate::processor::{DocumentFormat, FormatExtractor};

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("extract.pdf").entered();

        let bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let doc = lopdf::Document::load_mem(&bytes)
            .map_err(|e| ProcessError::PdfProcessing(e.to_string()))?;

        Ok(extract_pages(&doc))
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}

/// Page texts joined by newlines. Pages that fail to decode contribute nothing.
fn extract_pages(doc: &lopdf::Document) -> String {
    let mut parts = Vec::new();

    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => parts.push(page_text),
            Err(e) => {
                tracing::debug!(page = page_num, error = %e, "Skipping undecodable PDF page");
            }
        }
    }

    parts.join("\n").trim().to_string()
}
