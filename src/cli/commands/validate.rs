//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the clinanon configuration file.

use crate::config::load_config;
use crate::config::ClinAnonConfig;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        match config.validate() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                println!();
                print!("{}", Self::summary(&config));
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(2)
            }
        }
    }

    fn summary(config: &ClinAnonConfig) -> String {
        let anon = &config.anonymization;
        let mut lines = vec![
            "Configuration Summary:".to_string(),
            format!("  Log Level: {}", config.application.log_level),
            format!("  Date Redaction: {:?}", anon.date_redaction_policy),
            format!("  Catch-all Numeric: {}", anon.enable_catch_all_numeric),
            format!("  Dry Run: {}", anon.dry_run),
            format!(
                "  Chunking: {} units, {} overlap",
                anon.chunking.chunk_size, anon.chunking.overlap
            ),
            format!("  Max Concurrency: {}", anon.pipeline.max_concurrency),
            format!("  Deep Scan: {}", anon.pipeline.deep_scan),
            format!("  Exclusion Words: {}", anon.user_exclusion_words.len()),
            format!("  Inclusion Words: {}", anon.user_inclusion_words.len()),
        ];
        if let Some(ref path) = anon.pattern_library {
            lines.push(format!("  Pattern Library: {}", path.display()));
        }
        if let Some(ref path) = anon.dictionary_path {
            lines.push(format!("  Dictionary: {}", path.display()));
        }
        if anon.audit.enabled {
            lines.push(format!("  Audit Log: {}", anon.audit.log_path.display()));
        }
        if config.logging.local_enabled {
            lines.push(format!(
                "  Log Files: {} ({})",
                config.logging.local_path, config.logging.local_rotation
            ));
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_summary_lists_settings() {
        let mut config = ClinAnonConfig::default();
        config.anonymization.pipeline.deep_scan = true;
        let summary = ValidateArgs::summary(&config);
        assert!(summary.contains("Deep Scan: true"));
        assert!(summary.contains("Chunking: 4000 units"));
        assert!(!summary.contains("Audit Log"));
    }

    #[tokio::test]
    async fn test_execute_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[application]\nlog_level = \"warn\"\n").unwrap();
        file.flush().unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_execute_missing_file() {
        let code = ValidateArgs {}.execute("does-not-exist.toml").await.unwrap();
        assert_eq!(code, 2);
    }
}
