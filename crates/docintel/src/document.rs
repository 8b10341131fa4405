//! Document record model and the status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::AnalysisResult;

/// Processing status of a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Analyzing,
    Completed,
    Failed,
}

impl DocumentStatus {
    /// Status every document is admitted with.
    pub const INITIAL: DocumentStatus = DocumentStatus::Pending;

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Analyzing => "analyzing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }

    /// Returns true for `completed` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Failed)
    }

    /// Whether `next` is a legal successor of this status.
    ///
    /// The forward path is `pending → processing → analyzing → completed`.
    /// `failed` may follow `processing` or `analyzing`. Terminal states admit
    /// nothing.
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Analyzing)
                | (Analyzing, Completed)
                | (Processing, Failed)
                | (Analyzing, Failed)
        )
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown document status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for DocumentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DocumentStatus::Pending),
            "processing" => Ok(DocumentStatus::Processing),
            "analyzing" => Ok(DocumentStatus::Analyzing),
            "completed" => Ok(DocumentStatus::Completed),
            "failed" => Ok(DocumentStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One entry of a document's append-only status history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusEntry {
    pub status: DocumentStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Illegal status transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: DocumentStatus,
    pub to: DocumentStatus,
}

/// A persisted document as the pipeline sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub current_status: DocumentStatus,
    pub status_history: Vec<StatusEntry>,
    pub extracted_text: Option<String>,
    pub analysis_result: Option<AnalysisResult>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Creates a freshly admitted record with a single `pending` history entry.
    pub fn new_pending(id: &str, filename: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            filename: filename.to_string(),
            current_status: DocumentStatus::INITIAL,
            status_history: vec![StatusEntry {
                status: DocumentStatus::INITIAL,
                timestamp: now,
            }],
            extracted_text: None,
            analysis_result: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends `next` to the history and makes it the current status.
    ///
    /// The record is left untouched when the transition is illegal.
    pub fn advance(&mut self, next: DocumentStatus) -> Result<(), InvalidTransition> {
        if !self.current_status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.current_status,
                to: next,
            });
        }

        let now = Utc::now();
        self.status_history.push(StatusEntry {
            status: next,
            timestamp: now,
        });
        self.current_status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Records `message` and moves to `failed`.
    pub fn fail(&mut self, message: &str) -> Result<(), InvalidTransition> {
        self.advance(DocumentStatus::Failed)?;
        self.error_message = Some(message.to_string());
        Ok(())
    }

    /// Stores `result` and moves to `completed`.
    pub fn complete(&mut self, result: AnalysisResult) -> Result<(), InvalidTransition> {
        self.advance(DocumentStatus::Completed)?;
        self.analysis_result = Some(result);
        Ok(())
    }

    /// Returns true while the worker may still write to this record.
    pub fn is_in_flight(&self) -> bool {
        !self.current_status.is_terminal()
    }

    /// Statuses in history order.
    pub fn history_statuses(&self) -> Vec<DocumentStatus> {
        self.status_history.iter().map(|e| e.status).collect()
    }
}
