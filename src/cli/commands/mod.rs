//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod anonymize;
pub mod init;
pub mod restore;
pub mod validate;

use crate::config::{load_config, parse_config, ClinAnonConfig};
use crate::domain::Result;
use std::path::Path;

/// Load the configuration file, or the defaults when it does not exist
pub(crate) fn load_or_default(config_path: &str) -> Result<ClinAnonConfig> {
    if Path::new(config_path).exists() {
        load_config(config_path)
    } else {
        tracing::debug!(config_path = %config_path, "No configuration file, using defaults");
        parse_config("")
    }
}
