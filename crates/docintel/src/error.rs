use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocintelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] crate::analysis::AnalysisError),

    #[error("Server error: {0}")]
    Server(#[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Extraction failures. The `Display` text of each variant is what ends up in
/// a failed document's `error_message`.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Unsupported file type for extraction: {0}")]
    UnsupportedFormat(String),

    #[error("File not found on disk: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction error: {0}")]
    PdfProcessing(String),

    #[error("No text could be extracted (empty result)")]
    EmptyText,

    #[error("Stored file cannot be located: {0}")]
    BlobLocation(#[source] StorageError),

    #[error("Extraction task aborted: {0}")]
    Aborted(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove directory '{path}': {source}")]
    RemoveDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker task failed: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, DocintelError>;
