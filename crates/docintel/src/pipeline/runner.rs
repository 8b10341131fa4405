use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::analysis::{analyze_with_retry, Analyzer};
use crate::broadcast::StatusEvent;
use crate::db::{document_repo, Database};
use crate::document::{DocumentRecord, DocumentStatus};
use crate::error::ProcessError;
use crate::processor::TextExtractor;
use crate::sanitize;
use crate::storage::BlobStore;

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::progress::ProgressReporter;

/// Terminal state a processed document ended in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed,
    Failed { reason: String },
}

/// Drives one pending document through extraction and analysis.
pub struct Pipeline {
    config: PipelineConfig,
    db: Database,
    blobs: BlobStore,
    extractor: Arc<dyn TextExtractor>,
    analyzer: Arc<dyn Analyzer>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        db: Database,
        blobs: BlobStore,
        extractor: Arc<dyn TextExtractor>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        Self {
            config,
            db,
            blobs,
            extractor,
            analyzer,
        }
    }

    /// Runs the full pipeline for `document_id`.
    ///
    /// Each transition is persisted before it is reported. A document that
    /// is missing or no longer `pending` is skipped untouched.
    pub async fn run(
        &self,
        document_id: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineOutcome, PipelineError> {
        let record = document_repo::find_by_id(&self.db, document_id)?
            .ok_or_else(|| PipelineError::NotFound(document_id.to_string()))?;

        if record.current_status != DocumentStatus::Pending {
            return Err(PipelineError::StaleState {
                id: record.id,
                status: record.current_status,
            });
        }

        let span = info_span!(
            "pipeline",
            document_id = %record.id,
            filename = %sanitize::redact_path(std::path::Path::new(&record.filename)),
        );

        self.run_stages(record, progress).instrument(span).await
    }

    async fn run_stages(
        &self,
        mut record: DocumentRecord,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineOutcome, PipelineError> {
        // Step 1: claim
        record.advance(DocumentStatus::Processing)?;
        self.persist_and_report(&record, progress)?;

        // Step 2: extract
        let text = match self
            .step_extract(&record)
            .instrument(info_span!("extract"))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                let reason = e.to_string();
                warn!(error = %reason, "Extraction failed");
                return self.fail(record, reason, progress);
            }
        };
        document_repo::set_extracted_text(&self.db, &record.id, &text)?;
        debug!(chars = text.chars().count(), "Extracted text stored");
        record.extracted_text = Some(text);

        // Step 3: analyze
        record.advance(DocumentStatus::Analyzing)?;
        self.persist_and_report(&record, progress)?;

        let text = record.extracted_text.as_deref().unwrap_or_default();
        let analysis = analyze_with_retry(self.analyzer.as_ref(), text, self.config.retry_delay)
            .instrument(info_span!("analyze"))
            .await;

        match analysis {
            Ok(result) => {
                record.complete(result)?;
                self.persist_and_report(&record, progress)?;
                info!("Document completed");
                Ok(PipelineOutcome::Completed)
            }
            Err(e) => {
                if e.is_configuration() {
                    error!(error = %e, "Analysis is not configured");
                } else {
                    warn!(error = %e, "Analysis failed after retry");
                }
                self.fail(record, e.to_string(), progress)
            }
        }
    }

    async fn step_extract(&self, record: &DocumentRecord) -> Result<String, ProcessError> {
        let path = self
            .blobs
            .path_for(&record.id, &record.filename)
            .map_err(ProcessError::BlobLocation)?;

        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || extractor.extract(&path))
            .await
            .map_err(|e| ProcessError::Aborted(e.to_string()))?
    }

    fn fail(
        &self,
        mut record: DocumentRecord,
        reason: String,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineOutcome, PipelineError> {
        record.fail(&reason)?;
        self.persist_and_report(&record, progress)?;
        Ok(PipelineOutcome::Failed { reason })
    }

    fn persist_and_report(
        &self,
        record: &DocumentRecord,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        document_repo::apply_transition(&self.db, record)?;
        debug!(status = %record.current_status, "Transition persisted");
        progress.report(StatusEvent::from_record(record));
        Ok(())
    }
}
