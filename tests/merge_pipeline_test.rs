//! Integration tests for the merge pipeline: loading snapshot files from
//! disk, merging, and reporting.

use tabsync::core::merge::{load_source_files, merge_sources, MergeReport};
use std::path::PathBuf;

/// Write a snapshot file and return its path.
fn write_snapshot(dir: &std::path::Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

const HEADER: &str = "id\tc1\tc2\tc3\tc4\tc5\tc6";

#[test]
fn test_three_generations_of_one_key() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        write_snapshot(
            dir.path(),
            "export_2024_01_01_00_00_00.tsv",
            &[HEADER, "A1\tx\tx\tx\tx\tfirst\tx"],
        ),
        write_snapshot(
            dir.path(),
            "export_2024_02_01_00_00_00.tsv",
            &[HEADER, "A1\tx\tx\tx\tx\tsecond\tx"],
        ),
        write_snapshot(
            dir.path(),
            "export_2024_03_01_00_00_00.tsv",
            &[HEADER, "A1\tx\tx\tx\tx\tthird\tx"],
        ),
    ];

    let sources = load_source_files(&paths).unwrap();
    let outcome = merge_sources(&sources).unwrap();

    assert_eq!(outcome.records.len(), 1);
    let record = &outcome.records[0];
    assert_eq!(record.key, "A1");
    // Latest generation wins and every generation left a history entry
    assert_eq!(record.fields.fields[5], "third");
    assert_eq!(record.history.len(), 3);
    assert_eq!(outcome.stats.updates, 2);
}

#[test]
fn test_last_write_wins_is_input_order_independent() {
    let dir = tempfile::tempdir().unwrap();
    // Newest file listed first; ordering values, not list order, decide
    let paths = vec![
        write_snapshot(
            dir.path(),
            "export_2024_06_01_00_00_00.tsv",
            &[HEADER, "K\tx\tx\tx\tx\tnewest\tx"],
        ),
        write_snapshot(
            dir.path(),
            "export_2024_01_01_00_00_00.tsv",
            &[HEADER, "K\tx\tx\tx\tx\toldest\tx"],
        ),
    ];

    let sources = load_source_files(&paths).unwrap();
    let outcome = merge_sources(&sources).unwrap();
    assert_eq!(outcome.records[0].fields.fields[5], "newest");
}

#[test]
fn test_merge_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        write_snapshot(
            dir.path(),
            "export_2024_01_01_00_00_00.tsv",
            &[HEADER, "30\ta\tb\tc\td\te\tf", "7\ta\tb\tc\td\te\tf"],
        ),
        write_snapshot(
            dir.path(),
            "export_2024_02_01_00_00_00.tsv",
            &[HEADER, "7\tA\tB\tC\tD\tE\tF", "100\ta\tb\tc\td\te\tf"],
        ),
    ];

    let sources = load_source_files(&paths).unwrap();
    let first = merge_sources(&sources).unwrap().to_tsv();
    let second = merge_sources(&sources).unwrap().to_tsv();
    assert_eq!(first, second);
}

#[test]
fn test_output_sorted_descending_by_numeric_key() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![write_snapshot(
        dir.path(),
        "export_2024_01_01_00_00_00.tsv",
        &[HEADER, "2\ta\tb\tc\td\te\tf", "100\ta\tb\tc\td\te\tf", "30\ta\tb\tc\td\te\tf"],
    )];

    let sources = load_source_files(&paths).unwrap();
    let outcome = merge_sources(&sources).unwrap();
    let keys: Vec<&str> = outcome.records.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["100", "30", "2"]);
}

#[test]
fn test_every_output_row_carries_provenance() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![write_snapshot(
        dir.path(),
        "export_2024_01_01_00_00_00.tsv",
        &[HEADER, "A\ta\tb\tc\td\te\tf"],
    )];

    let sources = load_source_files(&paths).unwrap();
    let outcome = merge_sources(&sources).unwrap();
    for record in &outcome.records {
        assert!(record.fields.provenance().is_some(), "key {}", record.key);
    }
}

#[test]
fn test_report_wire_format() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        write_snapshot(
            dir.path(),
            "export_2024_01_01_00_00_00.tsv",
            &[HEADER, "A\ta\tb\tc\td\tv1\tf"],
        ),
        write_snapshot(
            dir.path(),
            "export_2024_02_01_00_00_00.tsv",
            &[HEADER, "A\ta\tb\tc\td\tv2\tf"],
        ),
    ];

    let sources = load_source_files(&paths).unwrap();
    let outcome = merge_sources(&sources).unwrap();
    let report = MergeReport::from_outcome(&outcome, &sources);
    let json = report.to_json().unwrap();

    assert!(json.contains("\"totalFiles\": 2"));
    assert!(json.contains("\"uniqueRecords\": 1"));
    assert!(json.contains("\"conflictResolution\": \"latest_wins\""));
    assert!(json.contains("\"topUpdates\""));
    assert!(json.contains("export_2024_01_01_00_00_00.tsv"));
}

#[test]
fn test_history_counts_only_strict_increases() {
    let dir = tempfile::tempdir().unwrap();
    // Second file repeats the first file's content under the same timestamp
    // marker; equal ordering values keep the incumbent
    let paths = vec![
        write_snapshot(
            dir.path(),
            "export_2024_01_01_00_00_00.tsv",
            &[HEADER, "A\ta\tb\tc\td\te\tf"],
        ),
        write_snapshot(
            dir.path(),
            "copy_2024_01_01_00_00_00.tsv",
            &[HEADER, "A\tz\tz\tz\tz\tz\tz"],
        ),
    ];

    let sources = load_source_files(&paths).unwrap();
    let outcome = merge_sources(&sources).unwrap();
    assert_eq!(outcome.records[0].history.len(), 1);
    assert_eq!(outcome.records[0].fields.fields[1], "a");
    assert_eq!(outcome.stats.duplicates, 1);
}
