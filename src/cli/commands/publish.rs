//! Publish command implementation

use crate::adapters::store::{create_store, InMemoryStore, RemoteStore};
use crate::cli::commands::load_config_or_default;
use crate::core::publish::Publisher;
use crate::core::snapshot::SnapshotManager;
use crate::core::state::FileCheckpointStore;
use crate::domain::ids::TargetId;
use crate::domain::SyncError;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the publish command
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Remote target structure name
    #[arg(long)]
    pub target: String,

    /// Merged file to publish (defaults to <output_dir>/merged.tsv)
    #[arg(long)]
    pub input: Option<String>,

    /// Upload directly into the target instead of a staging structure
    #[arg(long)]
    pub no_staging: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Run the full pipeline against an in-memory store, leaving the remote
    /// store untouched
    #[arg(long)]
    pub dry_run: bool,
}

impl PublishArgs {
    /// Execute the publish command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(target = %self.target, "Starting publish command");

        let mut config = load_config_or_default(config_path)?;
        if self.no_staging {
            config.publish.use_staging = false;
        }

        let input = self
            .input
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(&config.merge.output_dir).join("merged.tsv"));
        if !input.exists() {
            eprintln!("Input file not found: {} (run `tabsync merge` first)", input.display());
            return Ok(2);
        }

        let rows = read_rows(&input)?;
        if rows.is_empty() {
            eprintln!("Input file is empty: {}", input.display());
            return Ok(2);
        }

        let target = TargetId::new(&self.target)?;

        if !self.yes && !self.dry_run && !confirm_replace(&target, rows.len())? {
            println!("Aborted");
            return Ok(2);
        }

        let store: Arc<dyn RemoteStore> = if self.dry_run {
            // The pipeline runs end to end against an empty in-memory target
            let memory = Arc::new(InMemoryStore::new());
            memory.seed(&target, Vec::new()).await;
            tracing::info!(target_id = %target, "Dry run: publishing into an in-memory store");
            memory
        } else {
            create_store(&config.store)?
        };

        // Dry runs keep their checkpoint and snapshot state separate so a
        // rehearsal cannot delete a real run's resume point
        let checkpoint_dir = state_dir(&config.state.checkpoint_dir, self.dry_run);
        let snapshot_dir = state_dir(&config.snapshot.snapshot_dir, self.dry_run);

        // Expired snapshots are pruned before a new one is captured
        let janitor = SnapshotManager::new(&snapshot_dir, config.snapshot.retention_days);
        if let Err(e) = janitor.cleanup_expired().await {
            tracing::warn!(error = %e, "Snapshot cleanup failed, continuing");
        }

        let publisher = Publisher::new(
            store,
            Arc::new(FileCheckpointStore::new(&checkpoint_dir)),
            SnapshotManager::new(&snapshot_dir, config.snapshot.retention_days),
            config.publish.to_publish_config(),
        )
        .with_progress(Box::new(|progress| {
            tracing::info!(
                state = %progress.state,
                rows_processed = progress.rows_processed,
                rows_total = progress.rows_total,
                batch_size = progress.batch_size,
                "Publish progress"
            );
        }));

        match publisher.publish(&target, &rows).await {
            Ok(report) => {
                let prefix = if self.dry_run { "[dry run] " } else { "" };
                println!(
                    "{}Published {} rows to {} in {} batches ({} retries)",
                    prefix, report.rows_published, report.target_id, report.batches, report.retries
                );
                if let Some(offset) = report.resumed_from {
                    println!("Resumed from row {offset}");
                }
                println!("Snapshot: {}", report.snapshot_path.display());
                Ok(0)
            }
            Err(SyncError::ExhaustedRetries { message, snapshot }) => {
                eprintln!("Publish failed: {message}");
                eprintln!("A checkpoint was saved; re-run to resume. Snapshot: {snapshot}");
                Ok(3)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Ask the operator to confirm a full-content replacement.
fn confirm_replace(target: &TargetId, rows: usize) -> std::io::Result<bool> {
    use std::io::Write;
    print!("Replace the full content of {target} with {rows} rows? [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// State directory for this run, isolated under `dry-run` for rehearsals.
fn state_dir(base: &str, dry_run: bool) -> PathBuf {
    let base = PathBuf::from(base);
    if dry_run {
        base.join("dry-run")
    } else {
        base
    }
}

/// Read a merged file into opaque rows, one per non-empty line.
fn read_rows(path: &PathBuf) -> std::io::Result<Vec<Vec<String>>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| l.split('\t').map(str::to_string).collect())
        .collect())
}
