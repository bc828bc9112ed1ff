//! Source record merger
//!
//! Folds an ordered list of snapshot files into one deduplicated record map
//! with last-write-wins conflict resolution and per-record update history.

use crate::core::merge::timestamp::extract_timestamp;
use crate::domain::record::{HistoryEntry, MergeStats, MergedRecord, Row, SourceFile};
use crate::domain::{Result, SyncError};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Result of merging a set of snapshot files
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Header row, taken once from the first processed file
    pub header: Row,
    /// Merged records sorted descending by primary key
    pub records: Vec<MergedRecord>,
    /// Merge counters
    pub stats: MergeStats,
}

impl MergeOutcome {
    /// Render the outcome as publishable rows: header first, then records.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.fields.clone())
            .chain(self.records.iter().map(|r| r.fields.fields.clone()))
            .collect()
    }

    /// Render the outcome as tab-delimited text.
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.header.to_tsv_line());
        out.push('\n');
        for record in &self.records {
            out.push_str(&record.fields.to_tsv_line());
            out.push('\n');
        }
        out
    }
}

/// Merge snapshot files into one record set.
///
/// Files are processed in ascending `file_timestamp` order, rows in file
/// order. The ordering value of a row is the timestamp extracted from its
/// provenance marker when one is present, else the file's timestamp. An
/// unseen key inserts; a strictly greater ordering value overwrites and
/// appends a history entry with the changed field indexes; anything else is
/// counted as a duplicate and never mutates the stored record. Equal
/// ordering values keep the incumbent.
///
/// Output is sorted descending by primary key (numeric when both keys parse
/// as integers, else lexicographic), and every output row has its provenance
/// field back-filled so a subsequent merge pass has a row-level ordering key.
pub fn merge_sources(files: &[SourceFile]) -> Result<MergeOutcome> {
    if files.is_empty() {
        return Err(SyncError::Merge("no source files to merge".to_string()));
    }

    let mut ordered: Vec<&SourceFile> = files.iter().collect();
    ordered.sort_by_key(|f| f.file_timestamp);

    let header = ordered[0].header.clone();
    let mut stats = MergeStats {
        total_files: files.len(),
        ..MergeStats::default()
    };
    // BTreeMap keeps the fold deterministic so merging the same inputs twice
    // yields byte-identical output.
    let mut records: BTreeMap<String, MergedRecord> = BTreeMap::new();

    for file in &ordered {
        tracing::debug!(
            file = %file.name,
            rows = file.rows.len(),
            timestamp = %file.file_timestamp,
            "Merging source file"
        );

        for row in &file.rows {
            stats.total_records += 1;

            let key = row.key().to_string();
            if key.is_empty() {
                tracing::warn!(file = %file.name, "Skipping row with empty primary key");
                continue;
            }

            let ordering_value = row_ordering_value(row, file.file_timestamp);
            let provenance = row
                .provenance()
                .unwrap_or(file.name.as_str())
                .to_string();

            match records.get_mut(&key) {
                None => {
                    records.insert(
                        key.clone(),
                        MergedRecord {
                            key,
                            fields: row.clone(),
                            timestamp: ordering_value,
                            provenance,
                            history: vec![HistoryEntry {
                                timestamp: ordering_value,
                                source: file.name.clone(),
                                changed_fields: Vec::new(),
                            }],
                        },
                    );
                }
                Some(existing) if ordering_value > existing.timestamp => {
                    let changed_fields = existing.fields.diff_fields(row);
                    existing.history.push(HistoryEntry {
                        timestamp: ordering_value,
                        source: file.name.clone(),
                        changed_fields,
                    });
                    existing.fields = row.clone();
                    existing.timestamp = ordering_value;
                    existing.provenance = provenance;
                    stats.updates += 1;
                }
                Some(_) => {
                    // Not strictly greater; ties keep the incumbent.
                    stats.duplicates += 1;
                }
            }
        }
    }

    stats.unique_records = records.len();

    let mut merged: Vec<MergedRecord> = records.into_values().collect();
    for record in &mut merged {
        if record.fields.provenance().is_none() {
            let provenance = record.provenance.clone();
            record.fields.set_provenance(&provenance);
        }
    }
    // Stable sort over the BTreeMap order, so numeric ties stay lexicographic.
    merged.sort_by(|a, b| compare_keys(&a.key, &b.key).reverse());

    tracing::info!(
        total_files = stats.total_files,
        total_records = stats.total_records,
        unique_records = stats.unique_records,
        duplicates = stats.duplicates,
        updates = stats.updates,
        "Merge completed"
    );

    Ok(MergeOutcome {
        header,
        records: merged,
        stats,
    })
}

/// Ordering value for a row: provenance-marker timestamp when extractable,
/// else the file timestamp.
fn row_ordering_value(row: &Row, file_timestamp: DateTime<Utc>) -> DateTime<Utc> {
    row.provenance()
        .and_then(extract_timestamp)
        .unwrap_or(file_timestamp)
}

/// Ascending key comparison: numeric when both keys parse as integers,
/// lexicographic otherwise.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(na), Ok(nb)) => na.cmp(&nb),
        _ => a.cmp(b),
    }
}
