use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::secrets::ApiKeySource;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const MODEL_ENV_VAR: &str = "OPENAI_MODEL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Defaults to `~/.docintel/data/docintel.db` when unset.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_path: None,
            upload_dir: default_upload_dir(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            worker: WorkerConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    /// Configured database path, falling back to the per-user default and
    /// finally to `docintel.db` in the working directory.
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .or_else(crate::db::default_database_path)
            .unwrap_or_else(|| PathBuf::from("docintel.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Sleep between polls of an empty queue.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Delay before the single analysis retry.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_retry_delay_ms() -> u64 {
    800
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Settings for the OpenAI-compatible analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(flatten)]
    pub key: ApiKeySource,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: None,
            timeout_secs: default_timeout_secs(),
            key: ApiKeySource::default(),
        }
    }
}

impl AnalysisConfig {
    /// Model name: the configured value, then `OPENAI_MODEL`, then `gpt-4.1`.
    pub fn resolved_model(&self) -> String {
        if let Some(model) = self.model.as_deref().filter(|m| !m.is_empty()) {
            return model.to_string();
        }
        std::env::var(MODEL_ENV_VAR)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }
}
