//! Admission and removal of documents.
//!
//! Upload validation, blob persistence, record creation and enqueueing live
//! here so the HTTP layer stays a thin translation.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::db::{document_repo, Database, DatabaseError};
use crate::document::{DocumentRecord, DocumentStatus};
use crate::error::StorageError;
use crate::processor::DocumentFormat;
use crate::queue::AdmissionQueue;
use crate::sanitize::sanitize_filename;
use crate::storage::BlobStore;

/// Files accepted in one upload request.
pub const MAX_FILES_PER_UPLOAD: usize = 16;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Invalid file type: {filename}. Allowed: pdf, txt")]
    UnsupportedType { filename: String },

    #[error("File too large: {filename}. Max {max_mb}MB per file.")]
    TooLarge { filename: String, max_mb: u64 },

    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("No files were uploaded")]
    NoFiles,

    #[error("Too many files: at most {max} per upload")]
    TooManyFiles { max: usize },

    #[error("Document not found")]
    NotFound(String),

    #[error("Cannot delete document while processing")]
    InFlight { id: String, status: DocumentStatus },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// One file received for admission.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdmittedDocument {
    pub document_id: String,
    pub filename: String,
    pub status: DocumentStatus,
}

pub struct Intake {
    db: Database,
    blobs: BlobStore,
    queue: Arc<AdmissionQueue>,
    max_upload_bytes: u64,
}

impl Intake {
    pub fn new(
        db: Database,
        blobs: BlobStore,
        queue: Arc<AdmissionQueue>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            db,
            blobs,
            queue,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Checks type and size, returning the sanitized filename.
    pub fn validate(&self, filename: &str, size: u64) -> Result<String, IntakeError> {
        let name = sanitize_filename(filename)
            .ok_or_else(|| IntakeError::InvalidFilename(filename.to_string()))?;

        if DocumentFormat::from_filename(&name).is_none() {
            return Err(IntakeError::UnsupportedType { filename: name });
        }

        if size > self.max_upload_bytes {
            return Err(IntakeError::TooLarge {
                filename: name,
                max_mb: self.max_upload_bytes.div_ceil(1024 * 1024),
            });
        }

        Ok(name)
    }

    /// Admits every upload, or none when any of them is invalid.
    ///
    /// Each admitted document gets a fresh id, its blob, a `pending` record
    /// and a queue entry, in that order.
    pub fn admit_all(&self, uploads: Vec<Upload>) -> Result<Vec<AdmittedDocument>, IntakeError> {
        if uploads.is_empty() {
            return Err(IntakeError::NoFiles);
        }
        if uploads.len() > MAX_FILES_PER_UPLOAD {
            return Err(IntakeError::TooManyFiles {
                max: MAX_FILES_PER_UPLOAD,
            });
        }

        let validated = uploads
            .into_iter()
            .map(|upload| {
                let name = self.validate(&upload.filename, upload.content.len() as u64)?;
                Ok((name, upload.content))
            })
            .collect::<Result<Vec<_>, IntakeError>>()?;

        validated
            .into_iter()
            .map(|(name, content)| self.admit_validated(&name, &content))
            .collect()
    }

    /// Validates and admits a single file.
    pub fn admit(&self, filename: &str, content: &[u8]) -> Result<AdmittedDocument, IntakeError> {
        let name = self.validate(filename, content.len() as u64)?;
        self.admit_validated(&name, content)
    }

    fn admit_validated(&self, name: &str, content: &[u8]) -> Result<AdmittedDocument, IntakeError> {
        let document_id = uuid::Uuid::new_v4().to_string();
        self.blobs.save(&document_id, name, content)?;

        let record = DocumentRecord::new_pending(&document_id, name);
        if let Err(e) = document_repo::insert(&self.db, &record) {
            if let Err(cleanup) = self.blobs.remove(&document_id) {
                log::warn!("Failed to clean up blob for {}: {}", document_id, cleanup);
            }
            return Err(e.into());
        }

        self.queue.enqueue(&document_id);
        log::info!(
            "Admitted document {} ({} bytes, queue size {})",
            document_id,
            content.len(),
            self.queue.size()
        );

        Ok(AdmittedDocument {
            document_id,
            filename: record.filename,
            status: record.current_status,
        })
    }

    pub fn get(&self, id: &str) -> Result<DocumentRecord, IntakeError> {
        document_repo::find_by_id(&self.db, id)?
            .ok_or_else(|| IntakeError::NotFound(id.to_string()))
    }

    /// Newest first, optionally restricted to one status.
    pub fn list(&self, status: Option<DocumentStatus>) -> Result<Vec<DocumentRecord>, IntakeError> {
        let filter = document_repo::DocumentFilter { status };
        Ok(document_repo::list(&self.db, &filter)?)
    }

    /// Removes a terminal document's record and blob directory.
    pub fn delete(&self, id: &str) -> Result<(), IntakeError> {
        let record = self.get(id)?;
        if record.is_in_flight() {
            return Err(IntakeError::InFlight {
                id: record.id,
                status: record.current_status,
            });
        }

        if !document_repo::delete(&self.db, id)? {
            return Err(IntakeError::NotFound(id.to_string()));
        }
        if let Err(e) = self.blobs.remove(id) {
            log::warn!("Deleted record {} but not its blob: {}", id, e);
        }

        log::info!("Deleted document {}", id);
        Ok(())
    }
}
