//! Merge command implementation

use crate::cli::commands::load_config_or_default;
use crate::core::merge::{load_source_files, merge_sources, MergeReport};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the merge command
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Directory containing source snapshot files (overrides config)
    #[arg(long)]
    pub source_dir: Option<String>,

    /// Output directory for the merged file and report (overrides config)
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Skip writing the JSON merge report
    #[arg(long)]
    pub no_report: bool,
}

impl MergeArgs {
    /// Execute the merge command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting merge command");

        let mut config = load_config_or_default(config_path)?;
        if let Some(dir) = &self.source_dir {
            config.merge.source_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.merge.output_dir = dir.clone();
        }
        if self.no_report {
            config.merge.write_report = false;
        }

        let paths = source_paths(&config.merge.source_dir)?;
        if paths.is_empty() {
            eprintln!("No source files found in {}", config.merge.source_dir);
            return Ok(2);
        }
        tracing::info!(files = paths.len(), dir = %config.merge.source_dir, "Loading source files");

        let sources = load_source_files(&paths)?;
        let outcome = merge_sources(&sources)?;

        let output_dir = PathBuf::from(&config.merge.output_dir);
        std::fs::create_dir_all(&output_dir)?;

        let merged_path = output_dir.join("merged.tsv");
        std::fs::write(&merged_path, outcome.to_tsv())?;
        tracing::info!(path = %merged_path.display(), records = outcome.records.len(), "Wrote merged output");

        let report = MergeReport::from_outcome(&outcome, &sources);
        report.log_summary();
        if config.merge.write_report {
            let report_path = output_dir.join("merge_report.json");
            std::fs::write(&report_path, report.to_json()?)?;
            tracing::info!(path = %report_path.display(), "Wrote merge report");
        }

        println!(
            "Merged {} files: {} records, {} unique, {} duplicates, {} updates",
            report.summary.total_files,
            report.summary.total_records,
            report.summary.unique_records,
            report.summary.duplicates,
            report.summary.updates
        );
        println!("Output: {}", merged_path.display());

        Ok(0)
    }
}

/// Regular files in the source directory, sorted by name for a stable
/// processing order.
fn source_paths(dir: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}
