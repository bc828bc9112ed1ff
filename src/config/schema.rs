//! Configuration schema types
//!
//! Defines the structure of the tabsync TOML configuration file. Every
//! section has defaults so a minimal file (or none at all, for the memory
//! backend) is enough to run.

use crate::config::SecretString;
use crate::core::publish;
use serde::{Deserialize, Serialize};

/// Store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// HTTP store adapter
    Rest,
    /// In-memory store for local runs and tests
    #[default]
    Memory,
}

/// Main tabsync configuration
///
/// This is the root structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TabsyncConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Remote store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Merge pipeline settings
    #[serde(default)]
    pub merge: MergeConfig,

    /// Publish pipeline tuning
    #[serde(default)]
    pub publish: PublisherConfig,

    /// Checkpoint persistence
    #[serde(default)]
    pub state: StateConfig,

    /// Snapshot persistence and retention
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TabsyncConfig {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.store.validate()?;
        self.publish.validate()?;
        self.snapshot.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Remote store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend implementation (rest or memory)
    #[serde(default)]
    pub backend: StoreBackend,

    /// Base URL of the store API (required for the rest backend)
    #[serde(default)]
    pub base_url: String,

    /// API token for bearer authentication
    /// Stored securely in memory and zeroized on drop
    #[serde(default)]
    pub api_token: Option<SecretString>,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            base_url: String::new(),
            api_token: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl StoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.backend == StoreBackend::Memory {
            return Ok(());
        }
        if self.base_url.is_empty() {
            return Err("store.base_url cannot be empty for the rest backend".to_string());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("store.base_url must start with http:// or https://".to_string());
        }
        match &self.api_token {
            Some(token) => {
                use secrecy::ExposeSecret;
                if token.expose_secret().is_empty() {
                    return Err("store.api_token cannot be empty".to_string());
                }
            }
            None => {
                return Err("store.api_token is required for the rest backend".to_string());
            }
        }
        Ok(())
    }
}

/// Merge pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Directory scanned for source snapshot files
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Directory for the merged output and JSON report
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Write the JSON merge report next to the output
    #[serde(default = "default_true")]
    pub write_report: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
            write_report: true,
        }
    }
}

/// Publish pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Payload budget per call, in bytes
    #[serde(default = "default_byte_budget")]
    pub byte_budget: usize,

    #[serde(default = "default_min_batch_size")]
    pub min_batch_size: usize,

    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Retry attempts per batch before the run fails
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds, doubled per attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Fixed pause between batches in milliseconds
    #[serde(default = "default_inter_batch_delay_ms")]
    pub inter_batch_delay_ms: u64,

    /// Checkpoints are only written for runs longer than this many batches
    #[serde(default = "default_checkpoint_threshold")]
    pub checkpoint_threshold_batches: usize,

    /// Upload into a staging structure and cut over atomically
    #[serde(default = "default_true")]
    pub use_staging: bool,

    /// Exempt this run's snapshots from retention cleanup
    #[serde(default)]
    pub protect_snapshot: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            byte_budget: default_byte_budget(),
            min_batch_size: default_min_batch_size(),
            max_batch_size: default_max_batch_size(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            inter_batch_delay_ms: default_inter_batch_delay_ms(),
            checkpoint_threshold_batches: default_checkpoint_threshold(),
            use_staging: true,
            protect_snapshot: false,
        }
    }
}

impl PublisherConfig {
    fn validate(&self) -> Result<(), String> {
        if self.byte_budget == 0 {
            return Err("publish.byte_budget must be greater than 0".to_string());
        }
        if self.min_batch_size == 0 {
            return Err("publish.min_batch_size must be greater than 0".to_string());
        }
        if self.min_batch_size > self.max_batch_size {
            return Err(format!(
                "publish.min_batch_size ({}) cannot exceed publish.max_batch_size ({})",
                self.min_batch_size, self.max_batch_size
            ));
        }
        if self.max_retries == 0 {
            return Err("publish.max_retries must be at least 1".to_string());
        }
        Ok(())
    }

    /// Runtime tuning knobs for the publisher.
    pub fn to_publish_config(&self) -> publish::PublishConfig {
        publish::PublishConfig {
            byte_budget: self.byte_budget,
            min_batch_size: self.min_batch_size,
            max_batch_size: self.max_batch_size,
            max_retries: self.max_retries,
            retry_delay_ms: self.retry_delay_ms,
            inter_batch_delay_ms: self.inter_batch_delay_ms,
            checkpoint_threshold_batches: self.checkpoint_threshold_batches,
            use_staging: self.use_staging,
            protect_snapshot: self.protect_snapshot,
        }
    }
}

/// Checkpoint persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Directory holding per-target checkpoint files
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
        }
    }
}

/// Snapshot persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Directory holding snapshot files
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,

    /// Days an unprotected snapshot is kept before cleanup
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
            retention_days: default_retention_days(),
        }
    }
}

impl SnapshotConfig {
    fn validate(&self) -> Result<(), String> {
        if self.retention_days < 1 {
            return Err("snapshot.retention_days must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Console logging enabled
    #[serde(default = "default_true")]
    pub console_enabled: bool,

    /// Rolling JSON file logging enabled
    #[serde(default)]
    pub file_enabled: bool,

    /// Directory for rolling log files
    #[serde(default = "default_log_dir")]
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_enabled: false,
            file_path: default_log_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_source_dir() -> String {
    "./sources".to_string()
}

fn default_output_dir() -> String {
    "./output".to_string()
}

fn default_byte_budget() -> usize {
    publish::planner::DEFAULT_BYTE_BUDGET
}

fn default_min_batch_size() -> usize {
    publish::planner::MIN_BATCH_SIZE
}

fn default_max_batch_size() -> usize {
    publish::planner::MAX_BATCH_SIZE
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_inter_batch_delay_ms() -> u64 {
    1200
}

fn default_checkpoint_threshold() -> usize {
    5
}

fn default_checkpoint_dir() -> String {
    "./state/checkpoints".to_string()
}

fn default_snapshot_dir() -> String {
    "./state/snapshots".to_string()
}

fn default_retention_days() -> i64 {
    14
}

fn default_log_dir() -> String {
    "./logs".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_valid_for_memory_backend() {
        let config: TabsyncConfig = toml::from_str("[store]\nbackend = \"memory\"").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.publish.max_batch_size, 3000);
        assert_eq!(config.snapshot.retention_days, 14);
    }

    #[test]
    fn test_rest_backend_requires_url_and_token() {
        let config: TabsyncConfig = toml::from_str("[store]\nbackend = \"rest\"").unwrap();
        assert!(config.validate().is_err());

        let config: TabsyncConfig = toml::from_str(
            r#"
[store]
backend = "rest"
base_url = "https://store.example.com/api"
api_token = "secret"
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let config: TabsyncConfig =
            toml::from_str("[application]\nlog_level = \"verbose\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batch_bounds_validated() {
        let config: TabsyncConfig = toml::from_str(
            r#"
[store]
backend = "memory"

[publish]
min_batch_size = 500
max_batch_size = 100
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_publish_config_carries_tuning() {
        let config: TabsyncConfig = toml::from_str(
            r#"
[publish]
byte_budget = 500000
max_retries = 3
use_staging = false
"#,
        )
        .unwrap();
        let runtime = config.publish.to_publish_config();
        assert_eq!(runtime.byte_budget, 500_000);
        assert_eq!(runtime.max_retries, 3);
        assert!(!runtime.use_staging);
        assert_eq!(runtime.min_batch_size, 100);
    }
}
