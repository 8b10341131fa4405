use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::document::{DocumentRecord, DocumentStatus, StatusEntry};
use crate::intake::{AdmittedDocument, IntakeError, Upload, MAX_FILES_PER_UPLOAD};
use crate::server::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub uploaded_documents: Vec<AdmittedDocument>,
}

#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub filename: String,
    pub current_status: DocumentStatus,
}

impl From<DocumentRecord> for DocumentSummary {
    fn from(record: DocumentRecord) -> Self {
        Self {
            document_id: record.id,
            filename: record.filename,
            current_status: record.current_status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentDetail {
    pub document_id: String,
    pub filename: String,
    pub current_status: DocumentStatus,
    pub status_history: Vec<StatusEntry>,
    pub extracted_text: Option<String>,
    pub analysis_result: Option<AnalysisResult>,
    pub error_message: Option<String>,
}

impl From<DocumentRecord> for DocumentDetail {
    fn from(record: DocumentRecord) -> Self {
        Self {
            document_id: record.id,
            filename: record.filename,
            current_status: record.current_status,
            status_history: record.status_history,
            extracted_text: record.extracted_text,
            analysis_result: record.analysis_result,
            error_message: record.error_message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub document_id: String,
    pub current_status: DocumentStatus,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
    pub document_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
}

/// Reads every file field, then admits all of them or none.
///
/// A file is rejected as soon as it grows past the size limit, so no single
/// field is buffered beyond it.
pub async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let max_bytes = state.intake.max_upload_bytes();
    let mut uploads = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if uploads.len() == MAX_FILES_PER_UPLOAD {
            return Err(IntakeError::TooManyFiles {
                max: MAX_FILES_PER_UPLOAD,
            }
            .into());
        }

        let mut content = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            content.extend_from_slice(&chunk);
            if content.len() as u64 > max_bytes {
                state.intake.validate(&filename, content.len() as u64)?;
            }
        }

        uploads.push(Upload { filename, content });
    }

    let uploaded_documents = state.intake.admit_all(uploads)?;
    Ok(Json(UploadResponse { uploaded_documents }))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<DocumentSummary>>, ApiError> {
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<DocumentStatus>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let records = state.intake.list(status)?;
    Ok(Json(records.into_iter().map(DocumentSummary::from).collect()))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentDetail>, ApiError> {
    Ok(Json(state.intake.get(&id)?.into()))
}

pub async fn get_document_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let record = state.intake.get(&id)?;
    Ok(Json(StatusResponse {
        document_id: record.id,
        current_status: record.current_status,
    }))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.intake.delete(&id)?;
    Ok(Json(DeleteResponse {
        message: "Deleted",
        document_id: id,
    }))
}
