//! Restore command implementation
//!
//! This module implements the `restore` command for turning an anonymized
//! note back into its original text using the ledger written at
//! anonymization time.

use crate::anonymization::{reidentifier, LedgerFile};
use anyhow::Context;
use clap::Args;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Arguments for the restore command
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Anonymized note
    #[arg(short, long)]
    pub input: String,

    /// Ledger produced by `anonymize`
    #[arg(long)]
    pub ledger: String,

    /// Where to write the restored text (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Replace a code with different text, e.g. `[CLIENT_A]=Mere`
    #[arg(long = "override", value_parser = parse_override)]
    pub overrides: Vec<(String, String)>,
}

/// Parse a `CODE=TEXT` pair
fn parse_override(s: &str) -> Result<(String, String), String> {
    let (code, text) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid override '{s}', expected CODE=TEXT"))?;
    let code = code.trim();
    if code.is_empty() {
        return Err(format!("invalid override '{s}', code is empty"));
    }
    Ok((code.to_string(), text.to_string()))
}

impl RestoreArgs {
    /// Execute the restore command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input, ledger = %self.ledger, "Restoring note");

        let ledger = match LedgerFile::read(Path::new(&self.ledger)) {
            Ok(ledger) => ledger,
            Err(e) => {
                eprintln!("❌ Failed to load ledger");
                eprintln!("   Error: {e:#}");
                return Ok(2);
            }
        };

        let anonymized = fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read input: {}", self.input))?;

        let overrides: HashMap<String, String> = self.overrides.iter().cloned().collect();
        let restored = match reidentifier::restore(
            &anonymized,
            &ledger.entities,
            ledger.date_redaction_policy,
            &overrides,
        ) {
            Ok(text) => text,
            Err(e) => {
                crate::log_error_with_context!(e, "Restore failed");
                eprintln!("❌ Restore failed: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        match self.output {
            Some(ref path) => {
                fs::write(path, &restored)
                    .with_context(|| format!("Failed to write output: {path}"))?;
                eprintln!(
                    "✅ Restored {} codes from session {} into {path}",
                    ledger.entities.len(),
                    ledger.session_id
                );
            }
            None => print!("{restored}"),
        }

        Ok(0)
    }
}
