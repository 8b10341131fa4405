use thiserror::Error;

use crate::document::{DocumentStatus, InvalidTransition};

/// Reasons a dequeued id did not reach a recorded terminal state.
///
/// Extraction and analysis failures are not errors here: they are recorded on
/// the document and reported as [`super::PipelineOutcome::Failed`].
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Document {0} no longer exists")]
    NotFound(String),

    #[error("Document {id} is {status}, expected pending")]
    StaleState { id: String, status: DocumentStatus },

    #[error("Persisting transition failed: {0}")]
    Persistence(#[from] crate::db::DatabaseError),

    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

impl PipelineError {
    /// Skips are expected races, not faults.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            PipelineError::NotFound(_) | PipelineError::StaleState { .. }
        )
    }
}
