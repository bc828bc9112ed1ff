//! Command implementations

pub mod init;
pub mod merge;
pub mod publish;
pub mod status;
pub mod validate;

use crate::config::{default_config, load_config, TabsyncConfig};
use crate::domain::Result;
use std::path::Path;

/// Load the configuration file if it exists, otherwise fall back to defaults
/// with environment overrides applied.
pub(crate) fn load_config_or_default(path: &str) -> Result<TabsyncConfig> {
    if Path::new(path).exists() {
        load_config(path)
    } else {
        tracing::debug!(path, "No configuration file found, using defaults");
        default_config()
    }
}
