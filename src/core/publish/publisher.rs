//! Resilient publisher
//!
//! Drives one publish run end to end: orphan cleanup, pre-mutation snapshot,
//! batch planning with checkpoint resume, the upload loop with adaptive batch
//! shrinking and bounded backoff, post-upload validation, atomic cut-over,
//! and rollback. Runs are single-flight; a second call while one is in
//! progress is rejected, never queued.

use crate::adapters::store::traits::{RemoteStore, RowRange};
use crate::core::publish::planner::{BatchPlan, BatchPlanner};
use crate::core::publish::staging::StagingCoordinator;
use crate::core::snapshot::{Snapshot, SnapshotManager};
use crate::core::state::{Checkpoint, CheckpointStorage};
use crate::domain::ids::TargetId;
use crate::domain::{Result, SyncError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Publish run tuning knobs
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Payload budget per call, in bytes
    pub byte_budget: usize,
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    /// Retry attempts per batch before the run fails
    pub max_retries: u32,
    /// Base backoff delay, doubled per attempt
    pub retry_delay_ms: u64,
    /// Fixed pause between batches, independent of retry backoff
    pub inter_batch_delay_ms: u64,
    /// Checkpoints are only written for runs longer than this many batches
    pub checkpoint_threshold_batches: usize,
    /// Upload into a staging structure and cut over atomically
    pub use_staging: bool,
    /// Mark this run's snapshot as exempt from retention cleanup
    pub protect_snapshot: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            byte_budget: super::planner::DEFAULT_BYTE_BUDGET,
            min_batch_size: super::planner::MIN_BATCH_SIZE,
            max_batch_size: super::planner::MAX_BATCH_SIZE,
            max_retries: 5,
            retry_delay_ms: 1000,
            inter_batch_delay_ms: 1200,
            checkpoint_threshold_batches: 5,
            use_staging: true,
            protect_snapshot: false,
        }
    }
}

/// Where a run currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Snapshotting,
    Planning,
    Staging,
    Uploading,
    Validating,
    CuttingOver,
    Committed,
    RollingBack,
    RolledBack,
    Failed,
}

impl std::fmt::Display for PublishState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PublishState::Snapshotting => "snapshotting",
            PublishState::Planning => "planning",
            PublishState::Staging => "staging",
            PublishState::Uploading => "uploading",
            PublishState::Validating => "validating",
            PublishState::CuttingOver => "cutting_over",
            PublishState::Committed => "committed",
            PublishState::RollingBack => "rolling_back",
            PublishState::RolledBack => "rolled_back",
            PublishState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Progress notification delivered through an explicit callback
#[derive(Debug, Clone)]
pub struct PublishProgress {
    pub state: PublishState,
    pub rows_total: usize,
    pub rows_processed: usize,
    pub batch_index: usize,
    pub batch_size: usize,
}

pub type ProgressCallback = Box<dyn Fn(&PublishProgress) + Send + Sync>;

/// Summary of a completed publish run
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub target_id: TargetId,
    /// Rows uploaded by this run (excludes rows a checkpoint skipped)
    pub rows_published: usize,
    pub batches: usize,
    pub retries: usize,
    pub initial_batch_size: usize,
    pub final_batch_size: usize,
    /// Row offset a checkpoint resumed from, if any
    pub resumed_from: Option<usize>,
    pub staging_used: bool,
    pub snapshot_path: PathBuf,
}

/// Single-flight publisher for one remote store
pub struct Publisher {
    store: Arc<dyn RemoteStore>,
    checkpoints: Arc<dyn CheckpointStorage>,
    snapshots: SnapshotManager,
    staging: StagingCoordinator,
    config: PublishConfig,
    running: AtomicBool,
    progress: Option<ProgressCallback>,
}

/// Clears the single-flight flag when a run ends, however it ends
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Publisher {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        checkpoints: Arc<dyn CheckpointStorage>,
        snapshots: SnapshotManager,
        config: PublishConfig,
    ) -> Self {
        let staging = StagingCoordinator::new(store.clone());
        Self {
            store,
            checkpoints,
            snapshots,
            staging,
            config,
            running: AtomicBool::new(false),
            progress: None,
        }
    }

    /// Register a progress callback invoked on every state change and batch.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn emit(&self, state: PublishState, rows_total: usize, processed: usize, batch: usize, size: usize) {
        let progress = PublishProgress {
            state,
            rows_total,
            rows_processed: processed,
            batch_index: batch,
            batch_size: size,
        };
        tracing::debug!(
            state = %progress.state,
            rows_processed = progress.rows_processed,
            batch_index = progress.batch_index,
            "Publish progress"
        );
        if let Some(callback) = &self.progress {
            callback(&progress);
        }
    }

    /// Publish `rows` to `target`, replacing its full content.
    ///
    /// Rejects immediately with `AlreadyRunning` if a run is in flight on
    /// this publisher.
    pub async fn publish(&self, target: &TargetId, rows: &[Vec<String>]) -> Result<PublishReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);
        self.run(target, rows).await
    }

    async fn run(&self, target: &TargetId, rows: &[Vec<String>]) -> Result<PublishReport> {
        let total = rows.len();
        tracing::info!(target_id = %target, rows = total, staging = self.config.use_staging, "Starting publish run");

        // A crash between staging and cut-over leaves an orphan behind
        self.staging.cleanup_orphans(target).await?;

        // Snapshot before any mutation; failure here has no side effects
        self.emit(PublishState::Snapshotting, total, 0, 0, 0);
        let captured = self
            .snapshots
            .capture(
                self.store.as_ref(),
                target,
                self.config.protect_snapshot,
            )
            .await?;
        let snapshot_path = captured.path.clone();

        // Plan, honoring a prior checkpoint in non-staging mode
        self.emit(PublishState::Planning, total, 0, 0, 0);
        let planner = BatchPlanner::new(
            self.config.byte_budget,
            self.config.min_batch_size,
            self.config.max_batch_size,
        );
        let mut plan = planner.plan(rows);
        let initial_batch_size = plan.batch_size();

        let mut checkpoint = Checkpoint::new(target.clone(), plan.batch_size());
        let mut resumed_from = None;
        if let Some(previous) = self.checkpoints.load(target).await? {
            if self.config.use_staging {
                // The staging structure the checkpoint uploaded into was
                // removed by orphan cleanup; its progress is unusable.
                tracing::warn!(
                    target_id = %target,
                    rows_processed = previous.rows_processed,
                    "Discarding checkpoint from a staged run; restarting from row 0"
                );
                self.checkpoints.delete(target).await?;
            } else {
                plan.resume_at(previous.current_batch_size);
                resumed_from = Some(previous.rows_processed.min(total));
                checkpoint = previous;
            }
        }
        let start_offset = resumed_from.unwrap_or(0);
        let start_batch = checkpoint.batch_index;

        // Checkpoints are skipped for short runs
        let planned_batches = total.div_ceil(plan.batch_size().max(1));
        let persist_checkpoints = planned_batches > self.config.checkpoint_threshold_batches;

        let upload_target = if self.config.use_staging {
            self.emit(PublishState::Staging, total, start_offset, 0, plan.batch_size());
            self.staging.create(target).await?
        } else {
            if resumed_from.is_none() {
                // Fresh full replace: stale trailing rows must not survive
                self.store.clear_range(target, RowRange::all()).await?;
            }
            target.clone()
        };
        let staging_target = self.config.use_staging.then(|| upload_target.clone());

        let mut offset = start_offset;
        let mut batch_index = checkpoint.batch_index;
        let mut retries = 0usize;

        while offset < total {
            self.emit(PublishState::Uploading, total, offset, batch_index, plan.batch_size());

            let written = match self
                .upload_batch(&upload_target, rows, offset, &mut plan, batch_index, &mut retries, &mut checkpoint)
                .await
            {
                Ok(written) => written,
                Err(SyncError::ExhaustedRetries { message, .. }) => {
                    // Persist progress for resume; no rollback, the snapshot
                    // reference keeps a manual recovery path open
                    self.checkpoints.save(&checkpoint).await?;
                    self.emit(PublishState::Failed, total, offset, batch_index, plan.batch_size());
                    return Err(SyncError::ExhaustedRetries {
                        message,
                        snapshot: snapshot_path.display().to_string(),
                    });
                }
                Err(e) => {
                    return self
                        .recover(target, staging_target.as_ref(), &captured.snapshot, &plan, total, e)
                        .await;
                }
            };

            offset += written;
            batch_index += 1;
            checkpoint.advance(written, plan.batch_size());
            if persist_checkpoints {
                self.checkpoints.save(&checkpoint).await?;
            }

            if offset < total && self.config.inter_batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.inter_batch_delay_ms)).await;
            }
        }

        self.emit(PublishState::Validating, total, offset, batch_index, plan.batch_size());
        if let Err(e) = self.validate(&upload_target, rows).await {
            return self
                .recover(target, staging_target.as_ref(), &captured.snapshot, &plan, total, e)
                .await;
        }

        if let Some(staging) = &staging_target {
            self.emit(PublishState::CuttingOver, total, offset, batch_index, plan.batch_size());
            // On failure the original is untouched and staging holds the
            // validated upload; both are left in place for inspection
            self.staging.promote(target, staging).await?;
        }

        // Commit: the only point prior run-state is discarded
        self.checkpoints.delete(target).await?;
        self.emit(PublishState::Committed, total, offset, batch_index, plan.batch_size());

        let report = PublishReport {
            target_id: target.clone(),
            rows_published: offset - start_offset,
            batches: batch_index - start_batch,
            retries,
            initial_batch_size,
            final_batch_size: plan.batch_size(),
            resumed_from,
            staging_used: self.config.use_staging,
            snapshot_path,
        };
        tracing::info!(
            target_id = %target,
            rows_published = report.rows_published,
            batches = report.batches,
            retries = report.retries,
            "Publish run committed"
        );
        Ok(report)
    }

    /// Upload the batch starting at `offset`, retrying per the error
    /// taxonomy. Returns the number of rows committed.
    async fn upload_batch(
        &self,
        upload_target: &TargetId,
        rows: &[Vec<String>],
        offset: usize,
        plan: &mut BatchPlan,
        batch_index: usize,
        retries: &mut usize,
        checkpoint: &mut Checkpoint,
    ) -> Result<usize> {
        let mut attempt: u32 = 0;
        loop {
            let end = (offset + plan.batch_size()).min(rows.len());
            let batch = &rows[offset..end];
            let range = RowRange::new(offset, batch.len());

            let failure = match self.store.update_range(upload_target, range, batch).await {
                Ok(outcome) if outcome.updated_row_count == batch.len() => {
                    return Ok(batch.len());
                }
                // The store accepted the call but did not commit the whole
                // batch; retried like a network fault
                Ok(outcome) => format!(
                    "store reported {} rows written for a batch of {}",
                    outcome.updated_row_count,
                    batch.len()
                ),
                Err(SyncError::Store(e)) if e.is_overload() => {
                    *retries += 1;
                    checkpoint.record_error(format!("batch {batch_index}: {e}"));
                    if plan.shrink() {
                        tracing::warn!(
                            batch_index,
                            batch_size = plan.batch_size(),
                            error = %e,
                            "Store rejected the batch; retrying range halved"
                        );
                        continue;
                    }
                    format!("rejected at minimum batch size: {e}")
                }
                Err(SyncError::Store(e)) if e.is_transient() => e.to_string(),
                // Not retryable at the batch level
                Err(e) => return Err(e),
            };

            attempt += 1;
            *retries += 1;
            checkpoint.record_error(format!("batch {batch_index} attempt {attempt}: {failure}"));
            if attempt >= self.config.max_retries {
                return Err(SyncError::ExhaustedRetries {
                    message: format!(
                        "batch {batch_index} failed after {attempt} attempts: {failure}"
                    ),
                    snapshot: String::new(),
                });
            }

            let delay = self
                .config
                .retry_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt - 1));
            tracing::warn!(
                batch_index,
                attempt,
                delay_ms = delay,
                error = %failure,
                "Transient upload failure; backing off"
            );
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }
    }

    /// Post-upload validation: total count, then an even-stride primary key
    /// sample of at least `max(10, 1%)` rows.
    async fn validate(&self, upload_target: &TargetId, rows: &[Vec<String>]) -> Result<()> {
        let remote = self.store.get_range(upload_target, RowRange::all()).await?;
        if remote.len() != rows.len() {
            return Err(SyncError::Validation(format!(
                "row count mismatch: uploaded {} rows but the store holds {}",
                rows.len(),
                remote.len()
            )));
        }
        if rows.is_empty() {
            return Ok(());
        }

        let sample_target = (rows.len() / 100).max(10).min(rows.len());
        let stride = (rows.len() / sample_target).max(1);
        for index in (0..rows.len()).step_by(stride) {
            let expected = rows[index].first().map(String::as_str).unwrap_or("");
            let actual = remote[index].first().map(String::as_str).unwrap_or("");
            if expected != actual {
                return Err(SyncError::Validation(format!(
                    "primary key mismatch at row {index}: expected {expected:?}, store holds {actual:?}"
                )));
            }
        }
        tracing::info!(
            rows = rows.len(),
            sampled = rows.len().div_ceil(stride),
            "Upload validated"
        );
        Ok(())
    }

    /// Failure recovery: discard staging (original untouched) or replay the
    /// snapshot into the target. Best-effort; the original error is returned
    /// either way.
    async fn recover(
        &self,
        target: &TargetId,
        staging: Option<&TargetId>,
        snapshot: &Snapshot,
        plan: &BatchPlan,
        total: usize,
        error: SyncError,
    ) -> Result<PublishReport> {
        if let Some(staging) = staging {
            tracing::warn!(target_id = %target, error = %error, "Run failed; discarding staging structure");
            if let Err(e) = self.staging.discard(staging).await {
                tracing::warn!(staging = %staging, error = %e, "Failed to discard staging structure");
            }
            self.emit(PublishState::Failed, total, 0, 0, plan.batch_size());
            return Err(error);
        }

        self.emit(PublishState::RollingBack, total, 0, 0, plan.batch_size());
        tracing::warn!(target_id = %target, error = %error, "Run failed; rolling back from snapshot");
        match self.rollback(target, snapshot, plan.batch_size()).await {
            Ok(()) => {
                self.emit(PublishState::RolledBack, total, 0, 0, plan.batch_size());
                tracing::info!(target_id = %target, rows = snapshot.row_count, "Rollback complete");
            }
            Err(e) => {
                self.emit(PublishState::Failed, total, 0, 0, plan.batch_size());
                tracing::error!(
                    target_id = %target,
                    error = %e,
                    "Rollback failed; restore manually from the snapshot file"
                );
            }
        }
        Err(error)
    }

    /// Clear the target and replay the snapshot's rows, batched as in the
    /// forward path.
    async fn rollback(&self, target: &TargetId, snapshot: &Snapshot, batch_size: usize) -> Result<()> {
        self.store.clear_range(target, RowRange::all()).await?;
        let mut offset = 0;
        while offset < snapshot.rows.len() {
            let end = (offset + batch_size.max(1)).min(snapshot.rows.len());
            let batch = &snapshot.rows[offset..end];
            let outcome = self
                .store
                .update_range(target, RowRange::new(offset, batch.len()), batch)
                .await?;
            if outcome.updated_row_count != batch.len() {
                return Err(SyncError::Snapshot(format!(
                    "snapshot replay wrote {} of {} rows at offset {offset}",
                    outcome.updated_row_count,
                    batch.len()
                )));
            }
            offset = end;
        }
        Ok(())
    }
}
