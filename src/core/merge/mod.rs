//! Merge pipeline: timestamp extraction, record merging, reporting
//!
//! Combines N tab-separated snapshot files into one deduplicated,
//! timestamp-ordered record set with per-record update history.

pub mod merger;
pub mod report;
pub mod timestamp;

pub use merger::{merge_sources, MergeOutcome};
pub use report::MergeReport;
pub use timestamp::extract_timestamp;

use crate::domain::record::{Row, SourceFile};
use crate::domain::{Result, SyncError};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Load a snapshot file from disk.
///
/// Row 0 is the header; remaining non-empty lines are data rows. The file
/// timestamp comes from the file name when a pattern matches, else from the
/// file's modification time.
pub fn load_source_file(path: impl AsRef<Path>) -> Result<SourceFile> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| SyncError::Merge(format!("not a file path: {}", path.display())))?;

    let metadata = std::fs::metadata(path)?;
    let contents = std::fs::read_to_string(path)?;

    let mut lines = contents.lines();
    let header = Row::from_tsv_line(
        lines
            .next()
            .ok_or_else(|| SyncError::Merge(format!("empty source file: {name}")))?,
    );
    let rows: Vec<Row> = lines
        .filter(|l| !l.is_empty())
        .map(Row::from_tsv_line)
        .collect();

    let file_timestamp = match timestamp::extract_timestamp(&name) {
        Some(ts) => ts,
        None => {
            let modified = metadata.modified()?;
            let ts: DateTime<Utc> = modified.into();
            tracing::debug!(
                file = %name,
                mtime = %ts,
                "No timestamp in file name, using modification time"
            );
            ts
        }
    };

    Ok(SourceFile {
        path: path.to_path_buf(),
        name,
        header,
        rows,
        file_timestamp,
        size_bytes: metadata.len(),
    })
}

/// Load every snapshot file in `paths`, failing on the first unreadable one.
pub fn load_source_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<SourceFile>> {
    paths.iter().map(load_source_file).collect()
}
