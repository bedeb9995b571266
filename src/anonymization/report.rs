//! Run reporting for anonymization
//!
//! Summarises one or more anonymized documents: entity counts per type,
//! sample replacements, deep-scan findings and timings. Used by the CLI for
//! dry runs and after a real run.

use crate::anonymization::models::{AnonymizedDocument, Entity, EntityType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest original text shown in a sample
const SAMPLE_TEXT_LIMIT: usize = 50;

/// Report over anonymized documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationReport {
    /// Total documents processed
    pub total_documents: usize,

    /// Total distinct entities in the ledgers
    pub total_entities: usize,

    /// Total replaced occurrences
    pub total_occurrences: usize,

    /// Entities by type
    pub entities_by_type: BTreeMap<EntityType, usize>,

    /// Sample replacements
    pub samples: Vec<ReplacementSample>,

    /// Deep-scan findings awaiting review
    pub findings: usize,

    /// Warnings for the operator
    pub warnings: Vec<String>,

    /// Processing statistics
    pub stats: ProcessingStats,
}

/// One sample replacement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementSample {
    /// Original text (truncated)
    pub original: String,

    /// Placeholder code
    pub code: String,

    /// Entity type
    pub entity_type: EntityType,

    /// Number of occurrences
    pub occurrences: usize,

    /// Confidence score, if any
    pub confidence: Option<f32>,
}

/// Processing statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Average processing time per document (ms)
    pub avg_processing_time_ms: u64,

    /// Total processing time (ms)
    pub total_processing_time_ms: u64,

    /// Documents with at least one entity
    pub documents_with_pii: usize,

    /// Documents without entities
    pub documents_without_pii: usize,
}

impl AnonymizationReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            total_documents: 0,
            total_entities: 0,
            total_occurrences: 0,
            entities_by_type: BTreeMap::new(),
            samples: Vec::new(),
            findings: 0,
            warnings: Vec::new(),
            stats: ProcessingStats::default(),
        }
    }

    /// Add results from an anonymized document
    pub fn add_document(&mut self, document: &AnonymizedDocument) {
        self.total_documents += 1;
        self.stats.total_processing_time_ms += document.processing_time_ms;
        self.findings += document.findings.len();

        if document.ledger.is_empty() {
            self.stats.documents_without_pii += 1;
        } else {
            self.stats.documents_with_pii += 1;
            self.total_entities += document.total_entities();
            self.total_occurrences += document.total_occurrences();

            for (entity_type, count) in &document.stats_by_type {
                *self.entities_by_type.entry(*entity_type).or_insert(0) += count;
            }

            for entity in document.ledger.iter().take(5) {
                self.add_sample(entity);
            }
        }

        for entity in document.ledger.iter().filter(|e| e.source == "leak_repair") {
            self.add_warning(format!(
                "{} absorbed a longer form during leak repair",
                entity.replacement_code
            ));
        }

        if !document.findings.is_empty() {
            self.add_warning(format!(
                "{} deep-scan finding(s) need review before release",
                document.findings.len()
            ));
        }

        self.stats.avg_processing_time_ms =
            self.stats.total_processing_time_ms / self.total_documents as u64;
    }

    fn add_sample(&mut self, entity: &Entity) {
        if self.samples.len() >= 20 {
            return;
        }

        let original = if entity.original_text.chars().count() > SAMPLE_TEXT_LIMIT {
            let head: String = entity.original_text.chars().take(SAMPLE_TEXT_LIMIT - 3).collect();
            format!("{head}...")
        } else {
            entity.original_text.clone()
        };

        self.samples.push(ReplacementSample {
            original,
            code: entity.replacement_code.clone(),
            entity_type: entity.entity_type,
            occurrences: entity.positions.len(),
            confidence: entity.confidence,
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                    ANONYMIZATION REPORT                       \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "  Documents Processed:         {}\n",
            self.total_documents
        ));
        output.push_str(&format!(
            "  Documents with PII:          {}\n",
            self.stats.documents_with_pii
        ));
        output.push_str(&format!(
            "  Distinct Entities:           {}\n",
            self.total_entities
        ));
        output.push_str(&format!(
            "  Replaced Occurrences:        {}\n",
            self.total_occurrences
        ));
        output.push_str(&format!("  Deep-Scan Findings:          {}\n", self.findings));
        output.push_str(&format!(
            "  Avg Processing Time:         {} ms\n",
            self.stats.avg_processing_time_ms
        ));
        output.push('\n');

        if !self.entities_by_type.is_empty() {
            output.push_str("🔍 ENTITIES BY TYPE\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");

            let mut types: Vec<_> = self.entities_by_type.iter().collect();
            types.sort_by(|a, b| b.1.cmp(a.1));

            for (entity_type, count) in types {
                output.push_str(&format!("  {:30} {:>5}\n", entity_type.label(), count));
            }
            output.push('\n');
        }

        if !self.samples.is_empty() {
            output.push_str("📝 SAMPLE REPLACEMENTS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");

            for sample in self.samples.iter().take(10) {
                let confidence = sample
                    .confidence
                    .map(|c| format!("{:.0}%", c * 100.0))
                    .unwrap_or_else(|| "pattern".to_string());
                output.push_str(&format!(
                    "  {:16} ×{:<3} {:>8}  \"{}\"\n",
                    sample.code, sample.occurrences, confidence, sample.original
                ));
            }
            output.push('\n');
        }

        if !self.warnings.is_empty() {
            output.push_str("⚠️  WARNINGS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for warning in &self.warnings {
                output.push_str(&format!("  • {warning}\n"));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write report to file
    pub fn write_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        let json = self.format_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for AnonymizationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::PiiFinding;

    fn document(ledger: Vec<Entity>, findings: Vec<PiiFinding>, ms: u64) -> AnonymizedDocument {
        AnonymizedDocument::new("s".into(), String::new(), ledger, findings, ms)
    }

    #[test]
    fn test_report_creation() {
        let report = AnonymizationReport::new();
        assert_eq!(report.total_documents, 0);
        assert_eq!(report.total_entities, 0);
        assert!(report.entities_by_type.is_empty());
        assert!(report.samples.is_empty());
    }

    #[test]
    fn test_add_document_without_pii() {
        let mut report = AnonymizationReport::new();
        report.add_document(&document(vec![], vec![], 10));

        assert_eq!(report.total_documents, 1);
        assert_eq!(report.stats.documents_without_pii, 1);
        assert_eq!(report.stats.avg_processing_time_ms, 10);
    }

    #[test]
    fn test_add_document_with_pii() {
        let mut report = AnonymizationReport::new();
        let mut entity = Entity::with_span("Aroha", EntityType::PersonClient, 0, 5);
        entity.merge_positions([crate::anonymization::models::Span::new(10, 15)]);
        entity.replacement_code = "[CLIENT_A]".into();
        let finding = PiiFinding::new("Tamsin", EntityType::PersonOther, "dictionary", 0.4);

        report.add_document(&document(vec![entity], vec![finding], 20));
        report.add_document(&document(vec![], vec![], 10));

        assert_eq!(report.total_documents, 2);
        assert_eq!(report.total_entities, 1);
        assert_eq!(report.total_occurrences, 2);
        assert_eq!(report.entities_by_type.get(&EntityType::PersonClient), Some(&1));
        assert_eq!(report.samples[0].code, "[CLIENT_A]");
        assert_eq!(report.findings, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.stats.avg_processing_time_ms, 15);
    }

    #[test]
    fn test_sample_truncation() {
        let mut report = AnonymizationReport::new();
        let long = "A".repeat(80);
        report.add_document(&document(
            vec![Entity::with_span(long, EntityType::Location, 0, 80)],
            vec![],
            1,
        ));
        assert_eq!(report.samples[0].original.chars().count(), SAMPLE_TEXT_LIMIT);
        assert!(report.samples[0].original.ends_with("..."));
    }

    #[test]
    fn test_format_console() {
        let mut report = AnonymizationReport::new();
        report.total_documents = 3;
        report.total_entities = 5;
        report.stats.avg_processing_time_ms = 12;

        let output = report.format_console();
        assert!(output.contains("ANONYMIZATION REPORT"));
        assert!(output.contains("Documents Processed:         3"));
        assert!(output.contains("Distinct Entities:           5"));
    }
}
