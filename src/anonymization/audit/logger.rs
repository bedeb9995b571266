//! Audit logger for anonymization runs

use crate::anonymization::config::AuditConfig;
use crate::anonymization::models::{AnonymizedDocument, Entity};
use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    session_id: String,
    entity_count: usize,
    occurrence_count: usize,
    finding_count: usize,
    dry_run: bool,
    processing_time_ms: u64,
    entities: Vec<AuditEntity>,
}

/// Audit entity entry (with hashed PII)
#[derive(Debug, Serialize)]
struct AuditEntity {
    entity_type: String,
    code: String,
    occurrences: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f32>,
    /// SHA-256 hash of original text (never log plaintext PII)
    value_hash: String,
}

/// Appends one line per anonymization run
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
        })
    }

    /// Create from audit configuration
    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        Self::new(config.log_path.clone(), config.json_format, config.enabled)
    }

    /// Log an anonymized document
    pub fn log_anonymization(&self, document: &AnonymizedDocument) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: document.timestamp.to_rfc3339(),
            session_id: document.session_id.clone(),
            entity_count: document.total_entities(),
            occurrence_count: document.total_occurrences(),
            finding_count: document.findings.len(),
            dry_run: document.dry_run,
            processing_time_ms: document.processing_time_ms,
            entities: document
                .ledger
                .iter()
                .map(|e| self.create_audit_entity(e))
                .collect(),
        };

        self.write_entry(&entry)
    }

    fn create_audit_entity(&self, entity: &Entity) -> AuditEntity {
        AuditEntity {
            entity_type: entity.entity_type.label().to_string(),
            code: entity.replacement_code.clone(),
            occurrences: entity.positions.len(),
            confidence: entity.confidence,
            value_hash: hash_value(&entity.original_text),
        }
    }

    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        if self.json_format {
            let json_line =
                serde_json::to_string(entry).context("Failed to serialize audit entry")?;
            writeln!(file, "{json_line}").context("Failed to write audit entry")?;
        } else {
            writeln!(
                file,
                "[{}] Session: {} | Entities: {} | Occurrences: {} | Dry run: {} | Time: {}ms",
                entry.timestamp,
                entry.session_id,
                entry.entity_count,
                entry.occurrence_count,
                entry.dry_run,
                entry.processing_time_ms
            )
            .context("Failed to write audit entry")?;
        }

        Ok(())
    }
}

/// Hash a PII value using SHA-256
fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}
