//! Server configuration.
//!
//! Loaded from `config.toml`; every section and field has a default so a
//! partial (or missing) file still yields a runnable configuration.

use admind_commons::duration::serde_str;
use admind_commons::RetentionPolicy;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub managed_jobs: ManagedJobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the durable job store file.
    pub data_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: "data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub log_to_console: bool,
    /// "compact" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: "logs/admind.log".to_string(),
            log_to_console: true,
            format: "compact".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ManagedJobsConfig {
    #[serde(with = "serde_str")]
    pub job_retention_period: Duration,
    #[serde(with = "serde_str")]
    pub cleanup_initial_delay: Duration,
    #[serde(with = "serde_str")]
    pub cleanup_poll_interval: Duration,
}

impl Default for ManagedJobsConfig {
    fn default() -> Self {
        let policy = RetentionPolicy::default();
        Self {
            job_retention_period: policy.job_retention_period,
            cleanup_initial_delay: policy.cleanup_initial_delay,
            cleanup_poll_interval: policy.cleanup_poll_interval,
        }
    }
}

impl ManagedJobsConfig {
    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            job_retention_period: self.job_retention_period,
            cleanup_initial_delay: self.cleanup_initial_delay,
            cleanup_poll_interval: self.cleanup_poll_interval,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Validate configuration settings.
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            );
        }

        let valid_formats = ["compact", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            );
        }

        if self.storage.data_path.trim().is_empty() {
            anyhow::bail!("storage.data_path cannot be empty");
        }

        if self.managed_jobs.cleanup_poll_interval.is_zero() {
            anyhow::bail!("managed_jobs.cleanup_poll_interval cannot be 0");
        }

        Ok(())
    }
}
