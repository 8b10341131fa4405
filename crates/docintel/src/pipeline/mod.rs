pub mod config;
pub mod error;
pub mod progress;
pub mod runner;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use progress::{BroadcastProgress, NoopProgress, ProgressReporter};
pub use runner::{Pipeline, PipelineOutcome};
