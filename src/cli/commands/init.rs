//! Init command implementation
//!
//! Writes a starter configuration file with every section present and
//! commented defaults.

use clap::Args;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Output path for the configuration file
    #[arg(short, long, default_value = "tabsync.toml")]
    pub output: String,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

const CONFIG_TEMPLATE: &str = r#"# tabsync configuration

[application]
# trace, debug, info, warn, error
log_level = "info"

[store]
# "rest" for the HTTP store, "memory" for local runs
backend = "rest"
base_url = "https://store.example.com/api"
# Keep the token out of the file; substituted from the environment
api_token = "${TABSYNC_STORE_API_TOKEN}"
timeout_seconds = 30

[merge]
source_dir = "./sources"
output_dir = "./output"
write_report = true

[publish]
# Payload budget per call; the store hard-rejects around 2 MB
byte_budget = 1500000
min_batch_size = 100
max_batch_size = 3000
max_retries = 5
retry_delay_ms = 1000
inter_batch_delay_ms = 1200
checkpoint_threshold_batches = 5
use_staging = true
protect_snapshot = false

[state]
checkpoint_dir = "./state/checkpoints"

[snapshot]
snapshot_dir = "./state/snapshots"
retention_days = 14

[logging]
console_enabled = true
file_enabled = false
file_path = "./logs"
"#;

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let path = Path::new(&self.output);
        if path.exists() && !self.force {
            eprintln!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
            return Ok(2);
        }

        std::fs::write(path, CONFIG_TEMPLATE)?;
        println!("Created {}", path.display());
        println!("Set TABSYNC_STORE_API_TOKEN before running `tabsync publish`.");
        Ok(0)
    }
}
