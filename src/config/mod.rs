//! Configuration management for tabsync.
//!
//! TOML-based configuration loading, parsing, and validation with support
//! for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `TABSYNC_*` environment variable overrides
//! - Default values for every optional setting
//! - Per-section validation on load
//!
//! # Example configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [store]
//! backend = "rest"
//! base_url = "https://store.example.com/api"
//! api_token = "${TABSYNC_STORE_API_TOKEN}"
//!
//! [merge]
//! source_dir = "./sources"
//! output_dir = "./output"
//!
//! [publish]
//! byte_budget = 1500000
//! max_retries = 5
//! use_staging = true
//!
//! [snapshot]
//! retention_days = 14
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{default_config, load_config};
pub use schema::{
    ApplicationConfig, LoggingConfig, MergeConfig, PublisherConfig, SnapshotConfig, StateConfig,
    StoreBackend, StoreConfig, TabsyncConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
