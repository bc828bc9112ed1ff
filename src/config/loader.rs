//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{StoreBackend, TabsyncConfig};
use crate::config::secret_string;
use crate::domain::errors::SyncError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into TabsyncConfig
/// 4. Applies environment variable overrides (TABSYNC_* prefix)
/// 5. Validates the configuration
pub fn load_config(path: impl AsRef<Path>) -> Result<TabsyncConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SyncError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SyncError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: TabsyncConfig = toml::from_str(&contents)
        .map_err(|e| SyncError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config
        .validate()
        .map_err(|e| SyncError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Default configuration used when no file is given
pub fn default_config() -> Result<TabsyncConfig> {
    let mut config = TabsyncConfig::default();
    apply_env_overrides(&mut config);
    config
        .validate()
        .map_err(|e| SyncError::Configuration(format!("Configuration validation failed: {e}")))?;
    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. A referenced but unset variable is an
/// error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SyncError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the TABSYNC_* prefix
///
/// Variables follow the pattern TABSYNC_<SECTION>_<KEY>, for example
/// TABSYNC_STORE_BASE_URL or TABSYNC_PUBLISH_MAX_RETRIES.
fn apply_env_overrides(config: &mut TabsyncConfig) {
    if let Ok(val) = std::env::var("TABSYNC_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("TABSYNC_STORE_BACKEND") {
        match val.to_lowercase().as_str() {
            "rest" => config.store.backend = StoreBackend::Rest,
            "memory" => config.store.backend = StoreBackend::Memory,
            _ => {}
        }
    }
    if let Ok(val) = std::env::var("TABSYNC_STORE_BASE_URL") {
        config.store.base_url = val;
    }
    if let Ok(val) = std::env::var("TABSYNC_STORE_API_TOKEN") {
        config.store.api_token = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("TABSYNC_STORE_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.store.timeout_seconds = timeout;
        }
    }

    if let Ok(val) = std::env::var("TABSYNC_MERGE_SOURCE_DIR") {
        config.merge.source_dir = val;
    }
    if let Ok(val) = std::env::var("TABSYNC_MERGE_OUTPUT_DIR") {
        config.merge.output_dir = val;
    }

    if let Ok(val) = std::env::var("TABSYNC_PUBLISH_BYTE_BUDGET") {
        if let Ok(budget) = val.parse() {
            config.publish.byte_budget = budget;
        }
    }
    if let Ok(val) = std::env::var("TABSYNC_PUBLISH_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.publish.max_retries = retries;
        }
    }
    if let Ok(val) = std::env::var("TABSYNC_PUBLISH_USE_STAGING") {
        config.publish.use_staging = val.parse().unwrap_or(true);
    }

    if let Ok(val) = std::env::var("TABSYNC_STATE_CHECKPOINT_DIR") {
        config.state.checkpoint_dir = val;
    }
    if let Ok(val) = std::env::var("TABSYNC_SNAPSHOT_DIR") {
        config.snapshot.snapshot_dir = val;
    }
    if let Ok(val) = std::env::var("TABSYNC_SNAPSHOT_RETENTION_DAYS") {
        if let Ok(days) = val.parse() {
            config.snapshot.retention_days = days;
        }
    }

    if let Ok(val) = std::env::var("TABSYNC_LOGGING_FILE_ENABLED") {
        config.logging.file_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("TABSYNC_LOGGING_FILE_PATH") {
        config.logging.file_path = val;
    }
}
