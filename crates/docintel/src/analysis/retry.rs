use std::time::Duration;

use super::{AnalysisError, AnalysisResult, Analyzer};

/// Runs one analysis attempt and, on failure, exactly one more after `delay`.
///
/// Returns the second attempt's error when both fail.
pub async fn analyze_with_retry(
    analyzer: &dyn Analyzer,
    text: &str,
    delay: Duration,
) -> Result<AnalysisResult, AnalysisError> {
    match analyzer.analyze(text).await {
        Ok(result) => Ok(result),
        Err(first) => {
            tracing::warn!(error = %first, retry_in_ms = delay.as_millis() as u64, "Analysis attempt failed");
            tokio::time::sleep(delay).await;
            analyzer.analyze(text).await
        }
    }
}
