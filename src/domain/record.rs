//! Record model for snapshot files and merged output
//!
//! A snapshot file is newline-delimited, tab-separated text: a header row
//! followed by data rows. The first field of every row is the primary key;
//! field index 22 (when present) carries the provenance marker, the name of
//! the file the row originally came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Field index of the primary key
pub const PRIMARY_KEY_FIELD: usize = 0;

/// Field index of the provenance marker (originating file name)
pub const PROVENANCE_FIELD: usize = 22;

/// One tab-separated row of ordered string fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub fields: Vec<String>,
}

impl Row {
    /// Create a row from owned fields
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Parse a row from a tab-separated line
    pub fn from_tsv_line(line: &str) -> Self {
        Self {
            fields: line.split('\t').map(str::to_string).collect(),
        }
    }

    /// Render the row as a tab-separated line
    pub fn to_tsv_line(&self) -> String {
        self.fields.join("\t")
    }

    /// The primary key field, empty string if the row is short
    pub fn key(&self) -> &str {
        self.fields
            .get(PRIMARY_KEY_FIELD)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// The provenance marker, `None` when absent or empty
    pub fn provenance(&self) -> Option<&str> {
        self.fields
            .get(PROVENANCE_FIELD)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Set the provenance marker, padding the row with empty fields if needed
    pub fn set_provenance(&mut self, source: &str) {
        if self.fields.len() <= PROVENANCE_FIELD {
            self.fields.resize(PROVENANCE_FIELD + 1, String::new());
        }
        self.fields[PROVENANCE_FIELD] = source.to_string();
    }

    /// Field indexes where this row differs from `other`
    ///
    /// Compares up to the longer of the two rows; a missing field counts as
    /// differing from a present non-empty one.
    pub fn diff_fields(&self, other: &Row) -> Vec<usize> {
        let len = self.fields.len().max(other.fields.len());
        let empty = String::new();
        (0..len)
            .filter(|&i| {
                let a = self.fields.get(i).unwrap_or(&empty);
                let b = other.fields.get(i).unwrap_or(&empty);
                a != b
            })
            .collect()
    }
}

/// A loaded snapshot file
///
/// `file_timestamp` is derived from the file name when a pattern matches,
/// otherwise from the file's modification time.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path the file was loaded from
    pub path: PathBuf,
    /// File name used as provenance for rows it contributes
    pub name: String,
    /// Header row (row 0 of the file)
    pub header: Row,
    /// Data rows in file order
    pub rows: Vec<Row>,
    /// Ordering timestamp for this file
    pub file_timestamp: DateTime<Utc>,
    /// File size in bytes, reported in the merge report
    pub size_bytes: u64,
}

/// One entry in a merged record's update history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Ordering value of the row that produced this entry
    pub timestamp: DateTime<Utc>,
    /// Name of the file the row came from
    pub source: String,
    /// Field indexes changed by this update (empty for the initial insert)
    pub changed_fields: Vec<usize>,
}

/// A deduplicated record keyed by primary key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedRecord {
    /// Primary key (field 0)
    pub key: String,
    /// Winning row
    pub fields: Row,
    /// Winning ordering value
    pub timestamp: DateTime<Utc>,
    /// Name of the file the winning row came from
    pub provenance: String,
    /// Append-only update history; length is 1 + accepted updates
    pub history: Vec<HistoryEntry>,
}

impl MergedRecord {
    /// Number of accepted updates after the initial insert
    pub fn update_count(&self) -> usize {
        self.history.len().saturating_sub(1)
    }
}

/// Counters accumulated over one merge run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Number of source files processed
    pub total_files: usize,
    /// Total data rows seen across all files
    pub total_records: usize,
    /// Distinct primary keys in the output
    pub unique_records: usize,
    /// Rows skipped because their ordering value did not win
    pub duplicates: usize,
    /// Rows that overwrote an existing record
    pub updates: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_tsv_round_trip() {
        let row = Row::from_tsv_line("k1\talice\t42");
        assert_eq!(row.fields.len(), 3);
        assert_eq!(row.key(), "k1");
        assert_eq!(row.to_tsv_line(), "k1\talice\t42");
    }

    #[test]
    fn test_row_key_empty_row() {
        let row = Row::new(vec![]);
        assert_eq!(row.key(), "");
    }

    #[test]
    fn test_provenance_absent_on_short_row() {
        let row = Row::from_tsv_line("k1\talice");
        assert!(row.provenance().is_none());
    }

    #[test]
    fn test_provenance_empty_field_is_none() {
        let mut fields = vec![String::new(); PROVENANCE_FIELD + 1];
        fields[0] = "k1".to_string();
        let row = Row::new(fields);
        assert!(row.provenance().is_none());
    }

    #[test]
    fn test_set_provenance_pads_row() {
        let mut row = Row::from_tsv_line("k1\talice");
        row.set_provenance("export_2024_01_05.tsv");
        assert_eq!(row.fields.len(), PROVENANCE_FIELD + 1);
        assert_eq!(row.provenance(), Some("export_2024_01_05.tsv"));
    }

    #[test]
    fn test_set_provenance_overwrites_existing() {
        let mut row = Row::from_tsv_line("k1\talice");
        row.set_provenance("old.tsv");
        row.set_provenance("new.tsv");
        assert_eq!(row.provenance(), Some("new.tsv"));
        assert_eq!(row.fields.len(), PROVENANCE_FIELD + 1);
    }

    #[test]
    fn test_diff_fields() {
        let a = Row::from_tsv_line("k1\talice\t42");
        let b = Row::from_tsv_line("k1\tbob\t42\textra");
        assert_eq!(a.diff_fields(&b), vec![1, 3]);
    }

    #[test]
    fn test_diff_fields_identical() {
        let a = Row::from_tsv_line("k1\talice");
        assert!(a.diff_fields(&a.clone()).is_empty());
    }

    #[test]
    fn test_diff_fields_missing_vs_empty() {
        // A missing trailing field equals an explicit empty one
        let a = Row::from_tsv_line("k1\talice");
        let b = Row::from_tsv_line("k1\talice\t");
        assert!(a.diff_fields(&b).is_empty());
    }

    #[test]
    fn test_update_count() {
        let record = MergedRecord {
            key: "k1".to_string(),
            fields: Row::from_tsv_line("k1\talice"),
            timestamp: Utc::now(),
            provenance: "a.tsv".to_string(),
            history: vec![
                HistoryEntry {
                    timestamp: Utc::now(),
                    source: "a.tsv".to_string(),
                    changed_fields: vec![],
                },
                HistoryEntry {
                    timestamp: Utc::now(),
                    source: "b.tsv".to_string(),
                    changed_fields: vec![1],
                },
            ],
        };
        assert_eq!(record.update_count(), 1);
    }
}
