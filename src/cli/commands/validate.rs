//! Validate-config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        match load_config(config_path) {
            Ok(config) => {
                println!("Configuration is valid: {config_path}");
                println!("  store backend:   {:?}", config.store.backend);
                println!("  source dir:      {}", config.merge.source_dir);
                println!("  output dir:      {}", config.merge.output_dir);
                println!("  staging:         {}", config.publish.use_staging);
                println!("  max batch size:  {}", config.publish.max_batch_size);
                println!("  snapshot dir:    {}", config.snapshot.snapshot_dir);
                Ok(0)
            }
            Err(e) => {
                eprintln!("Configuration is invalid: {e}");
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_validate_valid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[store]\nbackend = \"memory\"\n").unwrap();
        file.flush().unwrap();

        let args = ValidateArgs {};
        let code = args
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_validate_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[publish]\nmax_retries = 0\n").unwrap();
        file.flush().unwrap();

        let args = ValidateArgs {};
        let code = args
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let args = ValidateArgs {};
        let code = args.execute("nonexistent.toml").await.unwrap();
        assert_eq!(code, 1);
    }
}
