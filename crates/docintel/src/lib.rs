//! Document intelligence service.
//!
//! Uploaded documents are admitted into a FIFO queue, then a single worker
//! extracts their text, asks an LLM for a structured analysis and publishes
//! every status change to live subscribers.

pub mod analysis;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod intake;
pub mod pipeline;
pub mod processor;
pub mod queue;
pub mod sanitize;
pub mod secrets;
pub mod server;
pub mod storage;
pub mod worker;

pub use analysis::{AnalysisError, AnalysisResult, Analyzer, OpenAiAnalyzer, Sentiment};
pub use broadcast::{StatusBroadcaster, StatusEvent, Subscription};
pub use config::{load_config, load_optional_config, Config};
pub use db::{Database, DatabaseError};
pub use document::{DocumentRecord, DocumentStatus, StatusEntry};
pub use error::{ConfigError, DocintelError, ProcessError, Result, StorageError, WorkerError};
pub use intake::{AdmittedDocument, Intake, IntakeError, Upload};
pub use pipeline::{BroadcastProgress, Pipeline, PipelineConfig, PipelineError, PipelineOutcome};
pub use processor::{ExtractorRegistry, TextExtractor};
pub use queue::AdmissionQueue;
pub use secrets::{ApiKeySource, SecretError};
pub use server::{build_router, AppState};
pub use storage::BlobStore;
pub use worker::{rehydrate_queue, DocumentWorker, WorkerHandle};
