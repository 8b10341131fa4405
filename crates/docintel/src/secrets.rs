//! Analysis API key resolution.
//!
//! The key may come from three places, checked in priority order:
//!
//! 1. **Direct value** - `"apiKey": "sk-..."` in the config file (local testing)
//! 2. **File reference** - `"apiKeyFile": "/run/secrets/openai"` (Docker secrets)
//! 3. **Env var reference** - `"apiKeyEnvVar": "OPENAI_API_KEY"` (default)
//!
//! A key that cannot be found is not a startup error. The analyzer reports it
//! per document as a configuration failure instead.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;

/// Env var consulted when no other source is configured.
pub const DEFAULT_API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Where to look for the analysis API key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeySource {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default)]
    pub api_key_env_var: Option<String>,
}

impl ApiKeySource {
    /// Resolves the key, returning `Ok(None)` when no source yields a value.
    ///
    /// Empty values are skipped. When neither a direct value nor a file is
    /// configured, [`DEFAULT_API_KEY_ENV_VAR`] is consulted.
    pub fn resolve(&self) -> Result<Option<SecretString>> {
        if let Some(value) = self.api_key.as_deref().filter(|v| !v.is_empty()) {
            return Ok(Some(SecretString::from(value.to_string())));
        }

        if let Some(path) = self.api_key_file.as_deref().filter(|p| !p.is_empty()) {
            let expanded = expand_home(path);
            return match fs::read_to_string(&expanded) {
                Ok(content) => Ok(non_empty(content.trim())),
                Err(e) => Err(SecretError::FileReadError {
                    path: expanded,
                    source: e,
                }),
            };
        }

        let var_name = self
            .api_key_env_var
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_API_KEY_ENV_VAR);

        match std::env::var(var_name) {
            // Env vars may carry a trailing newline
            Ok(value) => Ok(non_empty(value.trim())),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: var_name.to_string(),
            }),
        }
    }
}

fn non_empty(value: &str) -> Option<SecretString> {
    if value.is_empty() {
        None
    } else {
        Some(SecretString::from(value.to_string()))
    }
}

/// Expands `~` to the user's home directory.
///
/// Only `~` and `~/path` are supported, not `~user/path`.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            if path == "~" {
                return home.into_owned();
            }
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}
