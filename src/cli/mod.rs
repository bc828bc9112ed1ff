//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for tabsync using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// tabsync - snapshot merge and resilient publishing tool
#[derive(Parser, Debug)]
#[command(name = "tabsync")]
#[command(version, about, long_about = None)]
#[command(author = "Tabsync Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "tabsync.toml", env = "TABSYNC_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TABSYNC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge source snapshot files into one deduplicated record set
    Merge(commands::merge::MergeArgs),

    /// Publish a merged record set to the remote store
    Publish(commands::publish::PublishArgs),

    /// Show checkpoint and snapshot state for a target
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_merge() {
        let cli = Cli::parse_from(["tabsync", "merge"]);
        assert_eq!(cli.config, "tabsync.toml");
        assert!(matches!(cli.command, Commands::Merge(_)));
    }

    #[test]
    fn test_cli_parse_publish_with_target() {
        let cli = Cli::parse_from(["tabsync", "publish", "--target", "roster"]);
        match cli.command {
            Commands::Publish(args) => assert_eq!(args.target, "roster"),
            _ => panic!("expected publish command"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["tabsync", "--config", "custom.toml", "merge"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["tabsync", "--log-level", "debug", "merge"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["tabsync", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["tabsync", "status"]);
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["tabsync", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
