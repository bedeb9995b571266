//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for clinanon using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// clinanon - reversible anonymization for clinical notes
#[derive(Parser, Debug)]
#[command(name = "clinanon")]
#[command(version, about, long_about = None)]
#[command(author = "clinanon Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "clinanon.toml", env = "CLINANON_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CLINANON_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace identifying details in a note with placeholder codes
    Anonymize(commands::anonymize::AnonymizeArgs),

    /// Restore an anonymized note from its ledger
    Restore(commands::restore::RestoreArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
