//! Snapshot manager
//!
//! Captures the full remote content of a target before any mutation so a
//! failed run can be rolled back, and so a human operator always has a
//! manual recovery path. Snapshot files carry a SHA-256 content checksum
//! verified on load, and are cleaned up after a retention window unless
//! marked protected.

use crate::adapters::store::traits::{RemoteStore, RowRange};
use crate::domain::ids::TargetId;
use crate::domain::{Result, SyncError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Pre-publish capture of a target's full remote content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub target_id: TargetId,
    pub captured_at: DateTime<Utc>,
    pub row_count: usize,
    pub rows: Vec<Vec<String>>,
    /// Protected snapshots are exempt from retention cleanup
    pub protected: bool,
    /// SHA-256 over the row content, hex encoded
    pub checksum: String,
}

impl Snapshot {
    /// Capture rows into a snapshot entity for `target`.
    pub fn from_rows(target_id: TargetId, rows: Vec<Vec<String>>, protected: bool) -> Self {
        let checksum = content_checksum(&rows);
        Self {
            target_id,
            captured_at: Utc::now(),
            row_count: rows.len(),
            rows,
            protected,
            checksum,
        }
    }

    /// Recompute the content checksum and compare with the stored one.
    pub fn verify_checksum(&self) -> bool {
        content_checksum(&self.rows) == self.checksum
    }
}

/// SHA-256 over rows in a canonical form (fields joined by tab, rows by
/// newline), hex encoded.
fn content_checksum(rows: &[Vec<String>]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        hasher.update(row.join("\t").as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// A saved snapshot: the entity plus where it lives on disk
#[derive(Debug, Clone)]
pub struct CapturedSnapshot {
    pub snapshot: Snapshot,
    pub path: PathBuf,
}

/// Writes, loads, and expires snapshot files
pub struct SnapshotManager {
    dir: PathBuf,
    retention_days: i64,
}

impl SnapshotManager {
    pub fn new(dir: impl AsRef<Path>, retention_days: i64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            retention_days,
        }
    }

    /// Capture the target's full current content and persist it.
    ///
    /// Called before any mutation; a failure here aborts the run with no
    /// side effects on the store.
    pub async fn capture(
        &self,
        store: &dyn RemoteStore,
        target: &TargetId,
        protected: bool,
    ) -> Result<CapturedSnapshot> {
        let rows = store.get_range(target, RowRange::all()).await?;
        let snapshot = Snapshot::from_rows(target.clone(), rows, protected);

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            SyncError::Snapshot(format!(
                "failed to create snapshot directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let path = self.dir.join(format!(
            "{}_{}.snapshot.json",
            target.file_stem(),
            snapshot.captured_at.format("%Y%m%dT%H%M%S%3f")
        ));
        let contents = serde_json::to_string(&snapshot)?;
        tokio::fs::write(&path, contents).await.map_err(|e| {
            SyncError::Snapshot(format!("failed to write snapshot {}: {e}", path.display()))
        })?;

        tracing::info!(
            target_id = %target,
            row_count = snapshot.row_count,
            path = %path.display(),
            "Captured pre-publish snapshot"
        );

        Ok(CapturedSnapshot { snapshot, path })
    }

    /// Load a snapshot file and verify its content checksum.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Snapshot> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            SyncError::Snapshot(format!("failed to read snapshot {}: {e}", path.display()))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&contents)?;
        if !snapshot.verify_checksum() {
            return Err(SyncError::Snapshot(format!(
                "snapshot checksum mismatch: {}",
                path.display()
            )));
        }
        Ok(snapshot)
    }

    /// List snapshot files, newest first, optionally filtered by target.
    pub async fn list(&self, target: Option<&TargetId>) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(paths),
            Err(e) => {
                return Err(SyncError::Snapshot(format!(
                    "failed to list snapshots in {}: {e}",
                    self.dir.display()
                )))
            }
        };

        while let Some(entry) = entries.next_entry().await.map_err(SyncError::from)? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(".snapshot.json") {
                continue;
            }
            if let Some(target) = target {
                if !name.starts_with(&format!("{}_", target.file_stem())) {
                    continue;
                }
            }
            paths.push(path);
        }
        paths.sort();
        paths.reverse();
        Ok(paths)
    }

    /// Delete snapshots older than the retention window.
    ///
    /// Protected snapshots are kept regardless of age. Returns the number of
    /// files removed.
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(self.retention_days);
        let mut removed = 0;

        for path in self.list(None).await? {
            let snapshot = match self.load(&path).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable snapshot");
                    continue;
                }
            };
            if snapshot.protected || snapshot.captured_at >= cutoff {
                continue;
            }
            tokio::fs::remove_file(&path).await.map_err(|e| {
                SyncError::Snapshot(format!(
                    "failed to delete expired snapshot {}: {e}",
                    path.display()
                ))
            })?;
            tracing::info!(
                path = %path.display(),
                captured_at = %snapshot.captured_at,
                "Deleted expired snapshot"
            );
            removed += 1;
        }
        Ok(removed)
    }
}
