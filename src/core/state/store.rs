//! Checkpoint persistence
//!
//! One JSON file per publish target. Absence of the file means start fresh;
//! the file is deleted exactly once, when a run commits.

use crate::core::state::checkpoint::Checkpoint;
use crate::domain::ids::TargetId;
use crate::domain::{Result, SyncError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Storage backend for checkpoints
#[async_trait]
pub trait CheckpointStorage: Send + Sync {
    /// Load the checkpoint for a target, `Ok(None)` when there is none.
    async fn load(&self, target: &TargetId) -> Result<Option<Checkpoint>>;

    /// Persist a checkpoint, replacing any previous one for the target.
    async fn save(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Delete the checkpoint for a target; deleting a missing one is not an
    /// error.
    async fn delete(&self, target: &TargetId) -> Result<()>;
}

/// File-backed checkpoint storage, one JSON file per target
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, target: &TargetId) -> PathBuf {
        self.dir.join(format!("{}.checkpoint.json", target.file_stem()))
    }
}

#[async_trait]
impl CheckpointStorage for FileCheckpointStore {
    async fn load(&self, target: &TargetId) -> Result<Option<Checkpoint>> {
        let path = self.path_for(target);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let checkpoint: Checkpoint = serde_json::from_str(&contents).map_err(|e| {
                    SyncError::State(format!(
                        "corrupt checkpoint file {}: {e}",
                        path.display()
                    ))
                })?;
                tracing::info!(
                    target_id = %target,
                    rows_processed = checkpoint.rows_processed,
                    batch_index = checkpoint.batch_index,
                    "Loaded checkpoint"
                );
                Ok(Some(checkpoint))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::State(format!(
                "failed to read checkpoint {}: {e}",
                path.display()
            ))),
        }
    }

    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            SyncError::State(format!(
                "failed to create checkpoint directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let path = self.path_for(&checkpoint.target_id);
        let contents = serde_json::to_string_pretty(checkpoint)?;
        tokio::fs::write(&path, contents).await.map_err(|e| {
            SyncError::State(format!(
                "failed to write checkpoint {}: {e}",
                path.display()
            ))
        })?;

        tracing::debug!(
            target_id = %checkpoint.target_id,
            rows_processed = checkpoint.rows_processed,
            "Checkpoint saved"
        );
        Ok(())
    }

    async fn delete(&self, target: &TargetId) -> Result<()> {
        let path = self.path_for(target);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(target_id = %target, "Checkpoint deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::State(format!(
                "failed to delete checkpoint {}: {e}",
                path.display()
            ))),
        }
    }
}
