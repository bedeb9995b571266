//! Anonymize command implementation
//!
//! This module implements the `anonymize` command: read a note, replace
//! identifying details with codes and write the text plus its ledger.
//! Status lines go to stderr so the anonymized text can be piped.

use super::load_or_default;
use crate::anonymization::recognizer::{Detector, PrecomputedDetector};
use crate::anonymization::{
    AnonymizationEngine, AnonymizationReport, AnonymizationSession, AnonymizedDocument, LedgerFile,
};
use crate::domain::AnonError;
use anyhow::Context;
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the anonymize command
#[derive(Args, Debug)]
pub struct AnonymizeArgs {
    /// Note to anonymize
    #[arg(short, long)]
    pub input: String,

    /// Where to write the anonymized text (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Where to write the ledger (defaults to `<output>.ledger.json`)
    #[arg(long)]
    pub ledger: Option<String>,

    /// Detect only; leave the text unchanged
    #[arg(long)]
    pub dry_run: bool,

    /// Run the deep scan after the regular pipeline
    #[arg(long)]
    pub deep_scan: bool,

    /// JSON file of entities from an external detector
    #[arg(long)]
    pub detections: Option<String>,

    /// Write a JSON report to this path
    #[arg(long)]
    pub report: Option<String>,
}

impl AnonymizeArgs {
    /// Execute the anonymize command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input, dry_run = self.dry_run, "Anonymizing note");

        let mut config = match load_or_default(config_path) {
            Ok(c) => c.anonymization,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };
        if self.dry_run {
            config.dry_run = true;
        }
        if self.deep_scan {
            config.pipeline.deep_scan = true;
        }

        let engine = match self.build_engine(config) {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("❌ Failed to initialize anonymization engine");
                eprintln!("   Error: {e:#}");
                return Ok(2);
            }
        };

        let note = fs::read_to_string(&self.input)
            .with_context(|| format!("Failed to read input: {}", self.input))?;

        let mut session = AnonymizationSession::new();
        let result = match engine
            .anonymize_with_signal(&mut session, &note, shutdown_signal)
            .await
        {
            Ok(result) => result,
            Err(AnonError::Cancelled) => {
                eprintln!("⚠️  Anonymization cancelled, nothing was written");
                return Ok(130); // SIGINT exit code
            }
            Err(AnonError::EmptyInput) => {
                eprintln!("❌ Input is empty: {}", self.input);
                return Ok(1);
            }
            Err(e) => {
                crate::log_error_with_context!(e, "Anonymization failed");
                eprintln!("❌ Anonymization failed: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        self.write_outputs(&result)?;

        let mut report = AnonymizationReport::new();
        report.add_document(&result);
        eprintln!("{}", report.format_console());
        if let Some(ref path) = self.report {
            report
                .write_to_file(Path::new(path))
                .with_context(|| format!("Failed to write report: {path}"))?;
            eprintln!("✅ Report written: {path}");
        }

        Ok(0)
    }

    fn build_engine(
        &self,
        config: crate::anonymization::AnonymizationConfig,
    ) -> anyhow::Result<AnonymizationEngine> {
        match self.detections {
            Some(ref path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read detections: {path}"))?;
                let detector: Arc<dyn Detector> = Arc::new(PrecomputedDetector::from_json(&json)?);
                AnonymizationEngine::with_detector(config, detector)
            }
            None => AnonymizationEngine::new(config),
        }
    }

    fn write_outputs(&self, result: &AnonymizedDocument) -> anyhow::Result<()> {
        match self.output {
            Some(ref path) => {
                fs::write(path, &result.text)
                    .with_context(|| format!("Failed to write output: {path}"))?;
                eprintln!("✅ Anonymized text written: {path}");
            }
            None => print!("{}", result.text),
        }

        match self.ledger_path() {
            Some(path) => {
                LedgerFile::from_document(result).write(&path)?;
                eprintln!("✅ Ledger written: {}", path.display());
            }
            None => {
                tracing::warn!("No ledger path given; the text cannot be restored later");
                eprintln!("⚠️  No ledger written (use --ledger or --output)");
            }
        }
        Ok(())
    }

    fn ledger_path(&self) -> Option<PathBuf> {
        match (&self.ledger, &self.output) {
            (Some(ledger), _) => Some(PathBuf::from(ledger)),
            (None, Some(output)) => Some(PathBuf::from(format!("{output}.ledger.json"))),
            (None, None) => None,
        }
    }
}
