//! Isolated environment for driving documents through intake, the
//! pipeline and the HTTP router.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use docintel::analysis::Analyzer;
use docintel::db::Database;
use docintel::pipeline::{BroadcastProgress, Pipeline, PipelineConfig};
use docintel::processor::ExtractorRegistry;
use docintel::server::{build_router, AppState};
use docintel::{AdmissionQueue, BlobStore, Intake, StatusBroadcaster};

pub const MAX_UPLOAD_BYTES: u64 = 64 * 1024;

pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub blobs: BlobStore,
    pub queue: Arc<AdmissionQueue>,
    pub broadcaster: StatusBroadcaster,
    pub intake: Arc<Intake>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_in_memory().expect("Failed to open database");
        let blobs = BlobStore::new(temp_dir.path().join("uploads"));
        let queue = Arc::new(AdmissionQueue::new());
        let intake = Arc::new(Intake::new(
            db.clone(),
            blobs.clone(),
            Arc::clone(&queue),
            MAX_UPLOAD_BYTES,
        ));

        Self {
            temp_dir,
            db,
            blobs,
            queue,
            broadcaster: StatusBroadcaster::new(),
            intake,
        }
    }

    pub fn upload_root(&self) -> &Path {
        self.blobs.root()
    }

    /// Admits a document as if it had been uploaded and returns its id.
    pub fn admit(&self, filename: &str, content: &[u8]) -> String {
        self.intake
            .admit(filename, content)
            .expect("Failed to admit document")
            .document_id
    }

    /// Pipeline with the real extractors, the given analyzer and no retry delay.
    pub fn pipeline(&self, analyzer: Arc<dyn Analyzer>) -> Pipeline {
        Pipeline::new(
            PipelineConfig {
                retry_delay: Duration::ZERO,
            },
            self.db.clone(),
            self.blobs.clone(),
            Arc::new(ExtractorRegistry::new()),
            analyzer,
        )
    }

    pub fn progress(&self) -> BroadcastProgress {
        BroadcastProgress::new(self.broadcaster.clone())
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            Arc::clone(&self.intake),
            Arc::clone(&self.queue),
            self.broadcaster.clone(),
        )
    }

    pub fn router(&self) -> axum::Router {
        build_router(self.app_state())
    }
}
