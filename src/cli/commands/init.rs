//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "clinanon.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing clinanon configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Add practice-specific names to user_inclusion_words");
                println!("  3. Validate configuration: clinanon validate-config");
                println!("  4. Anonymize a note: clinanon anonymize -i note.txt -o note.anon.txt");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# clinanon Configuration File
# Reversible anonymization for clinical notes

[application]
log_level = "info"

[anonymization]
enable_catch_all_numeric = false
date_redaction_policy = "full"
dry_run = false
user_exclusion_words = []

[anonymization.user_inclusion_words]

[anonymization.chunking]
chunk_size = 4000
overlap = 200

[anonymization.pipeline]
max_concurrency = 4
deep_scan = false

[anonymization.audit]
enabled = false

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# clinanon Configuration File
# Reversible anonymization for clinical notes
#
# This file contains all configuration options with examples and explanations.
# Every setting can also be overridden with a CLINANON_<SECTION>_<KEY>
# environment variable, and values may reference ${VARIABLES}.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Anonymization
# ============================================================================
[anonymization]
# Treat any long digit run as an identifier
enable_catch_all_numeric = false

# How dates are rewritten
# - full: "[DATE_A]"
# - keep_year: "[DATE_A] 1978"
date_redaction_policy = "full"

# Shortest capitalized word the deep scan compares against known names
min_fuzzy_name_length = 3

# Detect only; leave the text unchanged
dry_run = false

# Words never treated as identifying (case-insensitive)
user_exclusion_words = ["Monday", "Panadol"]

# Optional: custom pattern library
# pattern_library = "patterns/pii_patterns.toml"

# Optional: extra dictionary words, one per line
# dictionary_path = "${CLINANON_DICTIONARY}"

# Words always treated as identifying, with their type
[anonymization.user_inclusion_words]
"Kauri Lodge" = "location"
"Wiremu" = "person_client"

# ============================================================================
# Chunking (sizes in UTF-16 code units)
# ============================================================================
[anonymization.chunking]
chunk_size = 4000
overlap = 200

# How far back to look for a sentence or word break
boundary_search_window = 500

# ============================================================================
# Pipeline
# ============================================================================
[anonymization.pipeline]
# Chunks recognized in parallel
max_concurrency = 4

# Second pass for near-miss names and missed identifiers
deep_scan = false

# Minimum confidence for external detector results
detector_threshold = 0.5
deep_scan_threshold = 0.3

# Edit-distance limits for fuzzy name matching
fuzzy_long_name_length = 6
fuzzy_short_distance = 1
fuzzy_long_distance = 2

# Compiled size cap for the combined name matcher, in bytes
matcher_size_limit = 67108864

# ============================================================================
# Audit Log (values are stored as SHA-256 hashes only)
# ============================================================================
[anonymization.audit]
enabled = false
log_path = "./audit/anonymization.log"
json_format = true

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local file logging
local_enabled = false

# Local log file path
local_path = "./logs"

# Log rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClinAnonConfig;
    use tempfile::tempdir;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "clinanon.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "clinanon.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generate_minimal_config_parses() {
        let content = InitArgs::generate_minimal_config();
        let config: ClinAnonConfig = toml::from_str(&content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.anonymization.chunking.overlap, 200);
    }

    #[test]
    fn test_generate_config_with_examples_parses() {
        let content = InitArgs::generate_config_with_examples();
        assert!(content.contains("# clinanon Configuration File"));

        let config: ClinAnonConfig = toml::from_str(&content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.anonymization.user_inclusion_words.len(), 2);
        assert_eq!(config.anonymization.user_exclusion_words.len(), 2);
    }

    #[tokio::test]
    async fn test_execute_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clinanon.toml");
        fs::write(&path, "# existing").unwrap();

        let args = InitArgs {
            output: path.display().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "# existing");

        let forced = InitArgs { force: true, ..args };
        assert_eq!(forced.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&path).unwrap().contains("[anonymization]"));
    }
}
