//! Status command implementation
//!
//! Shows the durable run state for a target: its checkpoint, if a failed run
//! left one behind, and the snapshots available for manual recovery.

use crate::cli::commands::load_config_or_default;
use crate::core::snapshot::SnapshotManager;
use crate::core::state::{CheckpointStorage, FileCheckpointStore};
use crate::domain::ids::TargetId;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Limit output to one target
    #[arg(long)]
    pub target: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = load_config_or_default(config_path)?;

        let target = match &self.target {
            Some(name) => Some(TargetId::new(name)?),
            None => None,
        };

        if let Some(target) = &target {
            let checkpoints = FileCheckpointStore::new(&config.state.checkpoint_dir);
            match checkpoints.load(target).await? {
                Some(checkpoint) => {
                    println!("Checkpoint for {target}:");
                    println!("  rows processed:  {}", checkpoint.rows_processed);
                    println!("  next batch:      {}", checkpoint.batch_index);
                    println!("  batch size:      {}", checkpoint.current_batch_size);
                    println!("  saved at:        {}", checkpoint.saved_at);
                    if !checkpoint.errors.is_empty() {
                        println!("  errors recorded: {}", checkpoint.errors.len());
                        for error in checkpoint.errors.iter().rev().take(3) {
                            println!("    - {error}");
                        }
                    }
                }
                None => println!("No checkpoint for {target} (next run starts fresh)"),
            }
        }

        let snapshots =
            SnapshotManager::new(&config.snapshot.snapshot_dir, config.snapshot.retention_days);
        let paths = snapshots.list(target.as_ref()).await?;
        if paths.is_empty() {
            println!("No snapshots found");
        } else {
            println!("Snapshots ({} most recent first):", paths.len());
            for path in paths.iter().take(10) {
                println!("  {}", path.display());
            }
        }

        Ok(0)
    }
}
