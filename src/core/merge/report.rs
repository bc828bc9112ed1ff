//! Merge report
//!
//! JSON summary written next to the merged output. The wire format is
//! camelCase and `conflictResolution` is always `"latest_wins"`.

use crate::core::merge::merger::MergeOutcome;
use crate::domain::record::SourceFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many records appear under `topUpdates`
const TOP_UPDATES_LIMIT: usize = 10;

/// JSON report describing one merge run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// When the report was generated
    pub timestamp: DateTime<Utc>,
    pub summary: ReportSummary,
    /// Per-input-file entries
    pub files: Vec<ReportFile>,
    /// Most-updated records, highest update count first
    pub top_updates: Vec<TopUpdate>,
    /// Conflict resolution policy; always `latest_wins`
    pub conflict_resolution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_files: usize,
    pub total_records: usize,
    pub unique_records: usize,
    pub duplicates: usize,
    pub updates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFile {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpdate {
    pub key: String,
    pub update_count: usize,
    pub last_update: DateTime<Utc>,
    /// Distinct source file names that contributed, in history order
    pub sources: Vec<String>,
}

impl MergeReport {
    /// Build a report from a merge outcome and the files that produced it.
    pub fn from_outcome(outcome: &MergeOutcome, files: &[SourceFile]) -> Self {
        let mut most_updated: Vec<&crate::domain::record::MergedRecord> = outcome
            .records
            .iter()
            .filter(|r| r.update_count() > 0)
            .collect();
        most_updated.sort_by(|a, b| {
            b.update_count()
                .cmp(&a.update_count())
                .then_with(|| a.key.cmp(&b.key))
        });

        let top_updates = most_updated
            .into_iter()
            .take(TOP_UPDATES_LIMIT)
            .map(|record| {
                let mut sources = Vec::new();
                for entry in &record.history {
                    if !sources.contains(&entry.source) {
                        sources.push(entry.source.clone());
                    }
                }
                TopUpdate {
                    key: record.key.clone(),
                    update_count: record.update_count(),
                    last_update: record.timestamp,
                    sources,
                }
            })
            .collect();

        Self {
            timestamp: Utc::now(),
            summary: ReportSummary {
                total_files: outcome.stats.total_files,
                total_records: outcome.stats.total_records,
                unique_records: outcome.stats.unique_records,
                duplicates: outcome.stats.duplicates,
                updates: outcome.stats.updates,
            },
            files: files
                .iter()
                .map(|f| ReportFile {
                    name: f.name.clone(),
                    timestamp: f.file_timestamp,
                    size: f.size_bytes,
                })
                .collect(),
            top_updates,
            conflict_resolution: "latest_wins".to_string(),
        }
    }

    /// Serialize the report as pretty-printed JSON.
    pub fn to_json(&self) -> crate::domain::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Log a one-line summary of the report.
    pub fn log_summary(&self) {
        tracing::info!(
            total_files = self.summary.total_files,
            total_records = self.summary.total_records,
            unique_records = self.summary.unique_records,
            duplicates = self.summary.duplicates,
            updates = self.summary.updates,
            "Merge report"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::merge::merger::merge_sources;
    use crate::domain::record::Row;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn source(name: &str, day: u32, lines: &[&str]) -> SourceFile {
        SourceFile {
            path: PathBuf::from(name),
            name: name.to_string(),
            header: Row::from_tsv_line("id\tname"),
            rows: lines.iter().map(|l| Row::from_tsv_line(l)).collect(),
            file_timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            size_bytes: 128,
        }
    }

    #[test]
    fn test_report_summary_matches_stats() {
        let files = vec![
            source("a.tsv", 1, &["1\talice", "2\tbob"]),
            source("b.tsv", 2, &["1\talicia"]),
        ];
        let outcome = merge_sources(&files).unwrap();
        let report = MergeReport::from_outcome(&outcome, &files);

        assert_eq!(report.summary.total_files, 2);
        assert_eq!(report.summary.total_records, 3);
        assert_eq!(report.summary.unique_records, 2);
        assert_eq!(report.summary.updates, 1);
        assert_eq!(report.conflict_resolution, "latest_wins");
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].size, 128);
    }

    #[test]
    fn test_top_updates_ordering_and_sources() {
        let files = vec![
            source("a.tsv", 1, &["1\tv1", "2\tw1"]),
            source("b.tsv", 2, &["1\tv2", "2\tw2"]),
            source("c.tsv", 3, &["1\tv3"]),
        ];
        let outcome = merge_sources(&files).unwrap();
        let report = MergeReport::from_outcome(&outcome, &files);

        assert_eq!(report.top_updates.len(), 2);
        assert_eq!(report.top_updates[0].key, "1");
        assert_eq!(report.top_updates[0].update_count, 2);
        assert_eq!(
            report.top_updates[0].sources,
            vec!["a.tsv".to_string(), "b.tsv".to_string(), "c.tsv".to_string()]
        );
        assert_eq!(report.top_updates[1].key, "2");
    }

    #[test]
    fn test_report_wire_format_is_camel_case() {
        let files = vec![source("a.tsv", 1, &["1\talice"])];
        let outcome = merge_sources(&files).unwrap();
        let report = MergeReport::from_outcome(&outcome, &files);
        let json = report.to_json().unwrap();

        assert!(json.contains("\"totalFiles\""));
        assert!(json.contains("\"uniqueRecords\""));
        assert!(json.contains("\"topUpdates\""));
        assert!(json.contains("\"conflictResolution\": \"latest_wins\""));
        assert!(!json.contains("total_files"));
    }
}
