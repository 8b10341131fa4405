use std::time::Duration;

use crate::config::Config;

pub struct PipelineConfig {
    /// Wait before the single analysis retry.
    pub retry_delay: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retry_delay: config.worker.retry_delay(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(800),
        }
    }
}
