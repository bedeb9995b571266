//! Error handling tests for the anonymization engine

use clinanon::anonymization::recognizer::detector::DetectorResponse;
use clinanon::anonymization::recognizer::patterns::PatternRegistry;
use clinanon::anonymization::recognizer::PrecomputedDetector;
use clinanon::anonymization::{AnonymizationConfig, AnonymizationEngine, AnonymizationSession};
use clinanon::domain::AnonError;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::watch;

#[test]
fn test_invalid_pattern_library_path() {
    let config = AnonymizationConfig {
        pattern_library: Some(PathBuf::from("/nonexistent/path/patterns.toml")),
        ..Default::default()
    };

    let result = AnonymizationEngine::new(config);
    assert!(result.is_err());
    let error = format!("{:#}", result.err().unwrap());
    assert!(error.contains("Pattern library file not found"));
}

#[test]
fn test_invalid_dictionary_path() {
    let config = AnonymizationConfig {
        dictionary_path: Some(PathBuf::from("/nonexistent/words.txt")),
        ..Default::default()
    };
    assert!(AnonymizationEngine::new(config).is_err());
}

#[test]
fn test_malformed_pattern_library() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(b"[patterns.broken\ncategory = ").unwrap();
    file.flush().unwrap();

    let config = AnonymizationConfig {
        pattern_library: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    assert!(AnonymizationEngine::new(config).is_err());
}

#[test]
fn test_invalid_regex_is_skipped_and_reported() {
    let toml = r#"
[patterns.good]
category = "identifier"
patterns = ['\bREF-\d{4}\b']

[patterns.bad]
category = "identifier"
patterns = ['(unclosed']
"#;
    let registry = PatternRegistry::from_toml(toml).unwrap();

    assert_eq!(registry.all_patterns().len(), 1);
    assert_eq!(registry.invalid().len(), 1);
    assert!(matches!(
        &registry.invalid()[0],
        AnonError::RecognizerPatternInvalid { name, .. } if name == "bad"
    ));
}

#[test]
fn test_invalid_chunking() {
    let mut config = AnonymizationConfig::default();
    config.chunking.chunk_size = 0;
    assert!(AnonymizationEngine::new(config).is_err());
}

#[test]
fn test_invalid_concurrency() {
    let mut config = AnonymizationConfig::default();
    config.pipeline.max_concurrency = 0;
    assert!(AnonymizationEngine::new(config).is_err());
}

#[tokio::test]
async fn test_empty_input() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let result = engine.anonymize(&mut AnonymizationSession::new(), "").await;
    assert!(matches!(result, Err(AnonError::EmptyInput)));
}

#[tokio::test]
async fn test_empty_input_deep_scan() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let result = engine.deep_scan("  ", &[]).await;
    assert!(matches!(result, Err(AnonError::EmptyInput)));
}

#[tokio::test]
async fn test_cancellation_discards_work() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let mut session = AnonymizationSession::new();
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let note = "Client: Aroha Ngata. Dr Smith reviewed. ".repeat(200);
    let result = engine.anonymize_with_signal(&mut session, &note, rx).await;

    assert!(matches!(result, Err(AnonError::Cancelled)));
    assert!(session.mapping().is_empty());

    // The session is still usable afterwards
    let result = engine.anonymize(&mut session, "Dr Smith").await.unwrap();
    assert_eq!(result.text, "Dr [PROVIDER_A]");
}

#[tokio::test]
async fn test_replacement_failure_aborts_without_side_effects() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let mut session = AnonymizationSession::new();
    engine.anonymize(&mut session, "Seen by Dr Smith.").await.unwrap();
    let before = session.mapping().clone();

    let mut config = AnonymizationConfig::default();
    config.pipeline.matcher_size_limit = 1;
    let starved = AnonymizationEngine::new(config).unwrap();

    let note = "Phone 021 555 1234 on 12/03/2024.";
    let result = starved.anonymize(&mut session, note).await;

    let err = match result {
        Err(err) => err,
        Ok(document) => panic!("expected failure, got text {:?}", document.text),
    };
    assert!(matches!(err, AnonError::ReplacementVerificationFailure(_)));
    assert!(err.is_fatal());
    assert_eq!(session.mapping(), &before);
    assert!(session.mapping().code_for("12/03/2024").is_none());

    // The session carries on with a working engine
    let result = engine.anonymize(&mut session, note).await.unwrap();
    assert!(result.text.contains("[DATE_A]"));
    assert_eq!(
        engine.anonymize(&mut session, "Dr Smith").await.unwrap().text,
        "Dr [PROVIDER_A]"
    );
}

#[tokio::test]
async fn test_rescan_failure_aborts_run() {
    let mut config = AnonymizationConfig::default();
    config.pipeline.matcher_size_limit = 1;
    let engine = AnonymizationEngine::new(config).unwrap();
    let mut session = AnonymizationSession::new();

    let result = engine.anonymize(&mut session, "Client: Aroha Ngata.").await;
    assert!(matches!(
        result,
        Err(AnonError::ReplacementVerificationFailure(_))
    ));
    assert!(session.mapping().is_empty());
}

#[test]
fn test_error_severity() {
    assert!(AnonError::Cancelled.is_fatal());
    assert!(AnonError::ReplacementVerificationFailure("x".into()).is_fatal());
    assert!(!AnonError::Detector("timeout".into()).is_fatal());
}

#[test]
fn test_detector_error_response() {
    let result = PrecomputedDetector::from_json(r#"{"error": "model not loaded"}"#);
    assert!(matches!(result, Err(AnonError::Detector(ref m)) if m == "model not loaded"));

    let response = DetectorResponse::from_json("[]").unwrap();
    assert!(response.into_result().unwrap().is_empty());
}

#[test]
fn test_detector_malformed_json() {
    assert!(PrecomputedDetector::from_json("not json").is_err());
}

#[tokio::test]
async fn test_restore_with_empty_ledger_is_identity() {
    let engine = AnonymizationEngine::new(AnonymizationConfig::default()).unwrap();
    let text = "Seen by Dr [PROVIDER_A].";
    let restored = engine.restore(text, &[], &Default::default()).unwrap();
    assert_eq!(restored, text);
}
