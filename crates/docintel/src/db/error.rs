//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating directories or files.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,

    /// An update or delete matched no row.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// A JSON column could not be encoded.
    #[error("Failed to encode column: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row could not be decoded into a record.
    #[error("Corrupt row for document '{id}': {reason}")]
    CorruptRow { id: String, reason: String },
}
