use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

/// Loads `path` when given, otherwise validates and returns the defaults.
pub fn load_optional_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            validate_config(&config)?;
            Ok(config)
        }
    }
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.bind_address.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation {
            message: format!("Invalid bind_address: {}", config.bind_address),
        });
    }

    if config.max_upload_bytes == 0 {
        return Err(ConfigError::Validation {
            message: "max_upload_bytes must be greater than zero".to_string(),
        });
    }

    if config.worker.poll_interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: "worker.poll_interval_ms must be greater than zero".to_string(),
        });
    }

    let base_url = &config.analysis.base_url;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::Validation {
            message: format!("analysis.base_url must be an http(s) URL: {}", base_url),
        });
    }

    Ok(())
}
