use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::WorkerError;
use crate::pipeline::{Pipeline, PipelineOutcome, ProgressReporter};
use crate::queue::AdmissionQueue;

/// The single background task that drains the admission queue.
pub struct DocumentWorker {
    queue: Arc<AdmissionQueue>,
    pipeline: Arc<Pipeline>,
    progress: Arc<dyn ProgressReporter>,
    poll_interval: Duration,
}

impl DocumentWorker {
    pub fn new(
        queue: Arc<AdmissionQueue>,
        pipeline: Arc<Pipeline>,
        progress: Arc<dyn ProgressReporter>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            pipeline,
            progress,
            poll_interval,
        }
    }

    /// Starts the worker loop on the current tokio runtime.
    pub fn spawn(self) -> WorkerHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());

        let join = tokio::spawn(self.run(Arc::clone(&shutdown), Arc::clone(&wake)));

        WorkerHandle {
            shutdown,
            wake,
            join,
        }
    }

    async fn run(self, shutdown: Arc<AtomicBool>, wake: Arc<Notify>) {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Document worker started"
        );

        while !shutdown.load(Ordering::Relaxed) {
            let Some(document_id) = self.queue.dequeue() else {
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    _ = wake.notified() => {}
                }
                continue;
            };

            self.process(&document_id).await;
        }

        info!("Document worker stopped");
    }

    /// Runs one id to completion. Never propagates a failure to the loop.
    async fn process(&self, document_id: &str) {
        debug!(document_id, "Dequeued document");

        let run = self.pipeline.run(document_id, self.progress.as_ref());
        match AssertUnwindSafe(run).catch_unwind().await {
            Ok(Ok(PipelineOutcome::Completed)) => {
                debug!(document_id, "Pipeline finished");
            }
            Ok(Ok(PipelineOutcome::Failed { reason })) => {
                info!(document_id, %reason, "Document failed");
            }
            Ok(Err(e)) if e.is_skip() => {
                info!(document_id, reason = %e, "Skipping document");
            }
            Ok(Err(e)) => {
                error!(document_id, error = %e, "Pipeline aborted, update abandoned");
            }
            Err(_) => {
                error!(document_id, "Pipeline panicked, update abandoned");
            }
        }
    }
}

/// Controls a spawned [`DocumentWorker`].
pub struct WorkerHandle {
    shutdown: Arc<AtomicBool>,
    wake: Arc<Notify>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Asks the loop to stop after the document in flight, if any.
    pub fn shutdown(&self) {
        info!("Shutting down document worker...");
        self.shutdown.store(true, Ordering::Relaxed);
        self.wake.notify_one();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Waits for the loop to exit.
    pub async fn wait(self) -> Result<(), WorkerError> {
        self.join.await.map_err(|e| {
            warn!("Document worker task ended abnormally: {}", e);
            WorkerError::Join(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisError, AnalysisResult, Analyzer, Sentiment};
    use crate::broadcast::StatusEvent;
    use crate::db::{document_repo, Database};
    use crate::document::{DocumentRecord, DocumentStatus};
    use crate::pipeline::PipelineConfig;
    use crate::processor::ExtractorRegistry;
    use crate::storage::BlobStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct EchoAnalyzer;

    #[async_trait]
    impl Analyzer for EchoAnalyzer {
        async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
            Ok(AnalysisResult {
                summary: text.trim().to_string(),
                key_topics: vec![],
                sentiment: Sentiment::Neutral,
                actionable_items: vec![],
            })
        }
    }

    #[derive(Default)]
    struct Collect {
        events: Mutex<Vec<StatusEvent>>,
    }

    impl ProgressReporter for Collect {
        fn report(&self, event: StatusEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    struct Setup {
        _dir: TempDir,
        db: Database,
        blobs: BlobStore,
        queue: Arc<AdmissionQueue>,
        progress: Arc<Collect>,
    }

    fn setup() -> Setup {
        let dir = TempDir::new().unwrap();
        Setup {
            blobs: BlobStore::new(dir.path()),
            db: Database::open_in_memory().unwrap(),
            queue: Arc::new(AdmissionQueue::new()),
            progress: Arc::new(Collect::default()),
            _dir: dir,
        }
    }

    fn worker(s: &Setup) -> DocumentWorker {
        let pipeline = Pipeline::new(
            PipelineConfig::default(),
            s.db.clone(),
            s.blobs.clone(),
            Arc::new(ExtractorRegistry::new()),
            Arc::new(EchoAnalyzer),
        );
        DocumentWorker::new(
            s.queue.clone(),
            Arc::new(pipeline),
            s.progress.clone(),
            Duration::from_millis(10),
        )
    }

    async fn wait_for_terminal(db: &Database, id: &str) -> DocumentRecord {
        for _ in 0..200 {
            if let Some(record) = document_repo::find_by_id(db, id).unwrap() {
                if record.current_status.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("document {} never reached a terminal state", id);
    }

    #[tokio::test]
    async fn test_worker_processes_in_fifo_order() {
        let s = setup();
        for (id, body) in [("first", "one"), ("second", "two")] {
            s.blobs.save(id, "note.txt", body.as_bytes()).unwrap();
            document_repo::insert(&s.db, &DocumentRecord::new_pending(id, "note.txt")).unwrap();
            s.queue.enqueue(id);
        }

        let handle = worker(&s).spawn();
        wait_for_terminal(&s.db, "first").await;
        let second = wait_for_terminal(&s.db, "second").await;
        handle.shutdown();
        handle.wait().await.unwrap();

        assert_eq!(second.analysis_result.unwrap().summary, "two");
        let order: Vec<_> = s
            .progress
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.status == DocumentStatus::Completed)
            .map(|e| e.document_id.clone())
            .collect();
        assert_eq!(order, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_worker_survives_missing_and_failed_documents() {
        let s = setup();
        s.queue.enqueue("ghost");
        document_repo::insert(&s.db, &DocumentRecord::new_pending("nofile", "x.pdf")).unwrap();
        s.queue.enqueue("nofile");
        s.blobs.save("ok", "ok.txt", b"fine").unwrap();
        document_repo::insert(&s.db, &DocumentRecord::new_pending("ok", "ok.txt")).unwrap();
        s.queue.enqueue("ok");

        let handle = worker(&s).spawn();
        let failed = wait_for_terminal(&s.db, "nofile").await;
        let ok = wait_for_terminal(&s.db, "ok").await;
        handle.shutdown();
        handle.wait().await.unwrap();

        assert_eq!(failed.current_status, DocumentStatus::Failed);
        assert_eq!(ok.current_status, DocumentStatus::Completed);
        assert!(s.queue.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_idle_wait() {
        let s = setup();
        let pipeline = Pipeline::new(
            PipelineConfig::default(),
            s.db.clone(),
            s.blobs.clone(),
            Arc::new(ExtractorRegistry::new()),
            Arc::new(EchoAnalyzer),
        );
        let handle = DocumentWorker::new(
            s.queue.clone(),
            Arc::new(pipeline),
            s.progress.clone(),
            Duration::from_secs(3600),
        )
        .spawn();

        tokio::task::yield_now().await;
        handle.shutdown();
        assert!(handle.is_shutdown());
        tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .expect("worker did not stop")
            .unwrap();
    }
}
