//! Configuration management for clinanon.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! clinanon uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for every setting
//! - `CLINANON_*` environment overrides
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use clinanon::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("clinanon.toml")?;
//! println!("Chunk size: {}", config.anonymization.chunking.chunk_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`AnonymizationConfig`] - Recognizers, chunking, pipeline and audit
//! - [`LoggingConfig`] - Local log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [anonymization]
//! date_redaction_policy = "keep_year"
//! user_exclusion_words = ["Monday"]
//! dictionary_path = "${CLINANON_DICTIONARY}"
//!
//! [anonymization.user_inclusion_words]
//! "Kauri Lodge" = "location"
//!
//! [anonymization.pipeline]
//! max_concurrency = 4
//! deep_scan = true
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use crate::anonymization::config::AnonymizationConfig;
pub use loader::{load_config, parse_config};
pub use schema::{ApplicationConfig, ClinAnonConfig, LoggingConfig};
