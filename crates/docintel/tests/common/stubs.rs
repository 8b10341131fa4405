#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use docintel::analysis::{AnalysisError, AnalysisResult, Analyzer, Sentiment};

pub fn sample_result(summary: &str) -> AnalysisResult {
    AnalysisResult {
        summary: summary.to_string(),
        key_topics: vec!["billing".to_string(), "deadlines".to_string()],
        sentiment: Sentiment::Neutral,
        actionable_items: vec!["Pay invoice".to_string()],
    }
}

/// Analyzer that replays canned replies in order, then fails.
pub struct ScriptedAnalyzer {
    replies: Mutex<VecDeque<Result<AnalysisResult, AnalysisError>>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedAnalyzer {
    pub fn new(replies: Vec<Result<AnalysisResult, AnalysisError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Succeeds for every call.
    pub fn always(summary: &str) -> Arc<Self> {
        Self::new((0..64).map(|_| Ok(sample_result(summary))).collect())
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen_texts(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        self.seen.lock().unwrap().push(text.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AnalysisError::InvalidResponse("no scripted reply".into())))
    }
}
