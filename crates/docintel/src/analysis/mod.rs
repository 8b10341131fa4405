//! Text analysis against an OpenAI-compatible chat completions endpoint.
//!
//! The pipeline only depends on the [`Analyzer`] trait so tests can script
//! successes and failures without a network.

pub mod openai;
pub mod retry;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiAnalyzer;
pub use retry::analyze_with_retry;
pub use types::{parse_analysis, AnalysisResult, Sentiment};

/// Errors from a single analysis attempt. The `Display` text is what ends up
/// in a failed document's `error_message`.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analysis API key is not set")]
    MissingApiKey,

    #[error("LLM error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM error: endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM output invalid: {0}")]
    InvalidResponse(String),
}

impl AnalysisError {
    /// Returns true when analysis cannot work until the operator fixes the
    /// configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AnalysisError::MissingApiKey)
    }
}

/// Turns extracted text into a validated [`AnalysisResult`].
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError>;
}
