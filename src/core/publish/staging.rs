//! Staged cut-over
//!
//! Uploads land in a temporary structure next to the live target; once the
//! upload validates, one atomic structural batch deletes the original and
//! renames the staging structure into its place. Readers of the target never
//! observe a half-written state.

use crate::adapters::store::traits::{RemoteStore, StructuralOp};
use crate::domain::ids::TargetId;
use crate::domain::{Result, SyncError};
use std::sync::Arc;
use uuid::Uuid;

/// Separator between a target name and its staging suffix
const STAGING_MARKER: &str = "__staging";

/// Creates, promotes, and discards staging structures for a target
pub struct StagingCoordinator {
    store: Arc<dyn RemoteStore>,
}

impl StagingCoordinator {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Staging name for a target with a fresh run suffix.
    pub fn staging_name(target: &TargetId) -> Result<TargetId> {
        let suffix = Uuid::new_v4().simple().to_string();
        TargetId::new(format!(
            "{}{}_{}",
            target.as_str(),
            STAGING_MARKER,
            &suffix[..8]
        ))
    }

    /// Create an empty staging structure for the target.
    pub async fn create(&self, target: &TargetId) -> Result<TargetId> {
        let staging = Self::staging_name(target)?;
        self.store
            .batch_structural_update(&[StructuralOp::AddStructure {
                name: staging.as_str().to_string(),
            }])
            .await
            .map_err(|e| {
                SyncError::Structural(format!(
                    "failed to create staging structure {staging}: {e}"
                ))
            })?;
        tracing::info!(target_id = %target, staging = %staging, "Created staging structure");
        Ok(staging)
    }

    /// Promote a validated staging structure into the live target.
    ///
    /// Delete-original and rename-staging travel in one structural batch, so
    /// the swap either happens completely or not at all. On failure the
    /// original target is untouched and the staging structure is kept for
    /// inspection.
    pub async fn promote(&self, target: &TargetId, staging: &TargetId) -> Result<()> {
        self.store
            .batch_structural_update(&[
                StructuralOp::DeleteStructure {
                    name: target.as_str().to_string(),
                },
                StructuralOp::RenameStructure {
                    from: staging.as_str().to_string(),
                    to: target.as_str().to_string(),
                },
            ])
            .await
            .map_err(|e| {
                SyncError::Structural(format!(
                    "cut-over failed for {target}; staging structure {staging} was kept: {e}"
                ))
            })?;
        tracing::info!(target_id = %target, staging = %staging, "Cut over to staging structure");
        Ok(())
    }

    /// Delete a staging structure that will not be promoted.
    pub async fn discard(&self, staging: &TargetId) -> Result<()> {
        self.store
            .batch_structural_update(&[StructuralOp::DeleteStructure {
                name: staging.as_str().to_string(),
            }])
            .await
            .map_err(|e| {
                SyncError::Structural(format!("failed to discard staging {staging}: {e}"))
            })?;
        tracing::info!(staging = %staging, "Discarded staging structure");
        Ok(())
    }

    /// Delete staging structures left behind by earlier crashed runs.
    ///
    /// Returns the number removed. Run before planning so a crashed run's
    /// leftovers never accumulate.
    pub async fn cleanup_orphans(&self, target: &TargetId) -> Result<usize> {
        let prefix = format!("{}{}", target.as_str(), STAGING_MARKER);
        let orphans: Vec<String> = self
            .store
            .list_structures()
            .await?
            .into_iter()
            .filter(|info| info.name.starts_with(&prefix))
            .map(|info| info.name)
            .collect();

        if orphans.is_empty() {
            return Ok(0);
        }

        let ops: Vec<StructuralOp> = orphans
            .iter()
            .map(|name| StructuralOp::DeleteStructure { name: name.clone() })
            .collect();
        self.store.batch_structural_update(&ops).await.map_err(|e| {
            SyncError::Structural(format!("failed to clean up orphaned staging structures: {e}"))
        })?;

        for name in &orphans {
            tracing::info!(staging = %name, "Removed orphaned staging structure");
        }
        Ok(orphans.len())
    }
}
