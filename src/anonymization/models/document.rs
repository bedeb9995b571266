//! Anonymization results

use super::entity::{Entity, EntityType};
use crate::anonymization::config::DateRedactionPolicy;
use super::finding::PiiFinding;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Result of anonymizing one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizedDocument {
    /// Session the codes belong to
    pub session_id: String,
    /// Anonymized text (the original text on a dry run)
    pub text: String,
    /// Entity ledger, ordered by first occurrence
    pub ledger: Vec<Entity>,
    /// Deep-scan findings not yet promoted to the ledger
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<PiiFinding>,
    /// Whether the text was left unmodified
    #[serde(default)]
    pub dry_run: bool,
    /// How dates were rewritten
    #[serde(default)]
    pub date_redaction_policy: DateRedactionPolicy,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Timestamp of anonymization
    pub timestamp: DateTime<Utc>,
    /// Ledger entries by type
    pub stats_by_type: BTreeMap<EntityType, usize>,
}

impl AnonymizedDocument {
    /// Create a result, computing per-type statistics from the ledger
    pub fn new(
        session_id: String,
        text: String,
        ledger: Vec<Entity>,
        findings: Vec<PiiFinding>,
        processing_time_ms: u64,
    ) -> Self {
        let mut stats_by_type = BTreeMap::new();
        for entity in &ledger {
            *stats_by_type.entry(entity.entity_type).or_insert(0) += 1;
        }

        Self {
            session_id,
            text,
            ledger,
            findings,
            dry_run: false,
            date_redaction_policy: DateRedactionPolicy::default(),
            processing_time_ms,
            timestamp: Utc::now(),
            stats_by_type,
        }
    }

    /// Mark as a dry run
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Record the date policy used for the rewrite
    pub fn with_date_policy(mut self, policy: DateRedactionPolicy) -> Self {
        self.date_redaction_policy = policy;
        self
    }

    /// Total number of ledger entries
    pub fn total_entities(&self) -> usize {
        self.ledger.len()
    }

    /// Total number of replaced occurrences
    pub fn total_occurrences(&self) -> usize {
        self.ledger.iter().map(|e| e.positions.len()).sum()
    }

    /// Check if anything was detected
    pub fn has_entities(&self) -> bool {
        !self.ledger.is_empty()
    }
}

/// Persisted ledger, the record needed to restore a document later
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerFile {
    /// Session the codes belong to
    pub session_id: String,
    /// When the document was anonymized
    pub timestamp: DateTime<Utc>,
    /// Date policy the text was written with; decides whether restore
    /// consumes a year after a date code
    #[serde(default)]
    pub date_redaction_policy: DateRedactionPolicy,
    /// Ledger entries
    pub entities: Vec<Entity>,
    /// Unreviewed deep-scan findings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<PiiFinding>,
}

impl LedgerFile {
    /// Capture the ledger of an anonymized document
    pub fn from_document(document: &AnonymizedDocument) -> Self {
        Self {
            session_id: document.session_id.clone(),
            timestamp: document.timestamp,
            date_redaction_policy: document.date_redaction_policy,
            entities: document.ledger.clone(),
            findings: document.findings.clone(),
        }
    }

    /// Read a ledger from a JSON file
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ledger: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse ledger: {}", path.display()))
    }

    /// Write the ledger as pretty JSON
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize ledger")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write ledger: {}", path.display()))
    }
}
