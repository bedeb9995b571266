//! Integration tests for the anonymization pipeline with synthetic clinical notes

use clinanon::anonymization::recognizer::{Detector, PrecomputedDetector};
use clinanon::anonymization::{
    AnonymizationConfig, AnonymizationEngine, AnonymizationReport, AnonymizationSession,
    LedgerFile,
};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::tempdir;

/// Create a synthetic session note with PII
fn create_synthetic_note() -> String {
    [
        "Client: Aroha Ngata",
        "Referred by: Dr Smith",
        "Aroha attended with her mother Mere on 12/03/2024.",
        "She reports sleeping better. Mere is supportive.",
        "Dr Smith will review. Contact 021 555 1234 or aroha.ngata@example.com.",
    ]
    .join("\n")
}

fn small_chunks() -> AnonymizationConfig {
    let mut config = AnonymizationConfig::default();
    config.chunking.chunk_size = 120;
    config.chunking.overlap = 30;
    config.chunking.boundary_search_window = 40;
    config
}

#[tokio::test]
async fn test_full_pipeline_removes_pii() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let mut session = AnonymizationSession::new();
    let note = create_synthetic_note();

    let result = engine.anonymize(&mut session, &note).await.unwrap();

    for value in ["Aroha", "Ngata", "Smith", "Mere", "12/03/2024", "021 555 1234", "aroha.ngata@example.com"] {
        assert!(!result.text.contains(value), "{value} leaked: {}", result.text);
    }
    assert!(result.text.contains("Referred by: Dr [PROVIDER_A]"));
    assert!(result.text.contains("[DATE_A]"));
    assert!(result.text.contains("[CONTACT_A]"));
    assert_eq!(result.session_id, session.id());
}

#[tokio::test]
async fn test_full_pipeline_round_trip() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let mut session = AnonymizationSession::new();
    let note = create_synthetic_note();

    let result = engine.anonymize(&mut session, &note).await.unwrap();
    let restored = engine
        .restore(&result.text, &result.ledger, &HashMap::new())
        .unwrap();

    assert_eq!(restored, note);
}

#[tokio::test]
async fn test_ledger_positions_point_at_originals() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let mut session = AnonymizationSession::new();
    let note = create_synthetic_note();
    let units: Vec<u16> = note.encode_utf16().collect();

    let result = engine.anonymize(&mut session, &note).await.unwrap();

    for entity in result.ledger.iter().filter(|e| e.source != "leak_repair") {
        assert!(!entity.positions.is_empty());
        for span in &entity.positions {
            let found = String::from_utf16(&units[span.start..span.end]).unwrap();
            assert_eq!(
                found.to_lowercase(),
                entity.original_text.to_lowercase(),
                "span {span:?} of {}",
                entity.replacement_code
            );
        }
    }
}

#[tokio::test]
async fn test_codes_unique_per_value() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let mut session = AnonymizationSession::new();

    let result = engine
        .anonymize(&mut session, &create_synthetic_note())
        .await
        .unwrap();

    let mut by_code: HashMap<&str, &str> = HashMap::new();
    for entity in &result.ledger {
        if let Some(previous) = by_code.insert(&entity.replacement_code, &entity.original_text) {
            // Only leak-repair extensions may share a code
            assert!(
                result
                    .ledger
                    .iter()
                    .any(|e| e.source == "leak_repair" && e.replacement_code == entity.replacement_code),
                "{} used for {previous} and {}",
                entity.replacement_code,
                entity.original_text
            );
        }
    }
}

#[tokio::test]
async fn test_session_reuses_codes_across_documents() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let mut session = AnonymizationSession::new();

    let first = engine
        .anonymize(&mut session, "Referred by: Dr Smith")
        .await
        .unwrap();
    let second = engine
        .anonymize(&mut session, "Dr Jones spoke with Dr Smith on the phone.")
        .await
        .unwrap();

    assert_eq!(first.text, "Referred by: Dr [PROVIDER_A]");
    assert_eq!(second.text, "Dr [PROVIDER_B] spoke with Dr [PROVIDER_A] on the phone.");
    assert_eq!(session.mapping().code_for("smith"), Some("[PROVIDER_A]"));
}

#[tokio::test]
async fn test_separate_sessions_are_independent() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let mut first = AnonymizationSession::new();
    let mut second = AnonymizationSession::new();

    engine.anonymize(&mut first, "Dr Jones called.").await.unwrap();
    let result = engine.anonymize(&mut second, "Dr Smith called.").await.unwrap();

    assert_eq!(result.text, "Dr [PROVIDER_A] called.");
    assert_ne!(first.id(), second.id());
}

#[tokio::test]
async fn test_multi_chunk_matches_single_chunk() {
    let note = std::iter::repeat(create_synthetic_note())
        .take(6)
        .collect::<Vec<_>>()
        .join("\n\n");

    let single = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let chunked = AnonymizationEngine::new(small_chunks()).unwrap();

    let a = single
        .anonymize(&mut AnonymizationSession::new(), &note)
        .await
        .unwrap();
    let b = chunked
        .anonymize(&mut AnonymizationSession::new(), &note)
        .await
        .unwrap();

    assert_eq!(a.text, b.text);
    assert_eq!(a.total_occurrences(), b.total_occurrences());

    let restored = chunked.restore(&b.text, &b.ledger, &HashMap::new()).unwrap();
    assert_eq!(restored, note);
}

#[tokio::test]
async fn test_overlap_produces_no_duplicate_positions() {
    let note = "Dr Smith reviewed the plan. ".repeat(40);
    let engine = AnonymizationEngine::new(small_chunks()).unwrap();

    let result = engine
        .anonymize(&mut AnonymizationSession::new(), &note)
        .await
        .unwrap();

    let smith = result
        .ledger
        .iter()
        .find(|e| e.original_text == "Smith")
        .unwrap();
    let mut positions = smith.positions.clone();
    positions.sort_by_key(|p| p.start);
    positions.dedup();
    assert_eq!(positions.len(), 40);
    assert_eq!(smith.positions.len(), 40);
}

#[tokio::test]
async fn test_external_detector_entities_are_replaced() {
    let detector: Arc<dyn Detector> = Arc::new(
        PrecomputedDetector::from_json(r#"[{"text": "Wiremu", "label": "person", "score": 0.9}]"#)
            .unwrap(),
    );
    let engine =
        AnonymizationEngine::with_detector(AnonymizationConfig::default(), detector).unwrap();

    let result = engine
        .anonymize(&mut AnonymizationSession::new(), "Spoke with Wiremu about the plan.")
        .await
        .unwrap();

    assert!(!result.text.contains("Wiremu"));
    assert!(result.text.contains("[PERSON_A]"));
}

#[tokio::test]
async fn test_deep_scan_reports_unflagged_names() {
    let mut config = AnonymizationConfig::default();
    config.pipeline.deep_scan = true;
    let engine = AnonymizationEngine::new(config).unwrap();

    let result = engine
        .anonymize(&mut AnonymizationSession::new(), "Met with Tamsin today.")
        .await
        .unwrap();

    let tamsin = result.findings.iter().find(|f| f.text == "Tamsin").unwrap();
    assert!(tamsin.suggested_type.is_person());

    // Findings are reported, not replaced
    assert_eq!(result.text, "Met with Tamsin today.");
}

#[tokio::test]
async fn test_ledger_file_restores_later() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("note.ledger.json");
    let note = create_synthetic_note();

    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let result = engine
        .anonymize(&mut AnonymizationSession::new(), &note)
        .await
        .unwrap();
    LedgerFile::from_document(&result).write(&path).unwrap();

    let ledger = LedgerFile::read(&path).unwrap();
    let restored = engine
        .restore(&result.text, &ledger.entities, &HashMap::new())
        .unwrap();
    assert_eq!(restored, note);
}

#[tokio::test]
async fn test_report_summarizes_run() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let result = engine
        .anonymize(&mut AnonymizationSession::new(), &create_synthetic_note())
        .await
        .unwrap();

    let mut report = AnonymizationReport::new();
    report.add_document(&result);

    assert_eq!(report.total_documents, 1);
    assert_eq!(report.total_entities, result.total_entities());
    assert_eq!(report.stats.documents_with_pii, 1);
    assert!(report.format_console().contains("ANONYMIZATION REPORT"));
    assert!(report.format_json().unwrap().contains("entities_by_type"));
}

#[tokio::test]
async fn test_audit_log_hashes_values() {
    let dir = tempdir().unwrap();
    let mut config = AnonymizationConfig::default();
    config.audit.enabled = true;
    config.audit.log_path = dir.path().join("audit.log");
    let engine = AnonymizationEngine::new(config).unwrap();

    engine
        .anonymize(&mut AnonymizationSession::new(), &create_synthetic_note())
        .await
        .unwrap();

    let content = std::fs::read_to_string(dir.path().join("audit.log")).unwrap();
    assert!(content.contains("value_hash"));
    assert!(!content.contains("Aroha"));
    assert!(!content.contains("021 555 1234"));
}
