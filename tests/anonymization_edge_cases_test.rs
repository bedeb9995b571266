//! Edge case tests for anonymization

use clinanon::anonymization::chunker::Chunker;
use clinanon::anonymization::config::DateRedactionPolicy;
use clinanon::anonymization::offsets::utf16_len;
use clinanon::anonymization::orchestrator::merge::remove_overlaps;
use clinanon::anonymization::replacer::Replacer;
use clinanon::anonymization::{
    AnonymizationConfig, AnonymizationEngine, AnonymizationSession, Entity, EntityType, Span,
};
use std::collections::HashMap;
use test_case::test_case;

fn engine() -> AnonymizationEngine {
    AnonymizationEngine::new(AnonymizationConfig::default()).unwrap()
}

#[tokio::test]
async fn test_whitespace_only_input() {
    let result = engine()
        .anonymize(&mut AnonymizationSession::new(), "   \n\t ")
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_note_without_pii() {
    let note = "Session focused on sleep hygiene and breathing exercises.";
    let result = engine()
        .anonymize(&mut AnonymizationSession::new(), note)
        .await
        .unwrap();

    assert_eq!(result.text, note);
    assert!(!result.has_entities());
}

#[tokio::test]
async fn test_possessive_keeps_suffix() {
    let note = "Dr Smith reviewed Dr Smith's notes.";
    let engine = engine();
    let result = engine
        .anonymize(&mut AnonymizationSession::new(), note)
        .await
        .unwrap();

    assert_eq!(result.text, "Dr [PROVIDER_A] reviewed Dr [PROVIDER_A]'s notes.");
    let restored = engine
        .restore(&result.text, &result.ledger, &HashMap::new())
        .unwrap();
    assert_eq!(restored, note);
}

#[tokio::test]
async fn test_case_variants_share_code() {
    let result = engine()
        .anonymize(
            &mut AnonymizationSession::new(),
            "Dr Smith phoned. SMITH asked for a copy.",
        )
        .await
        .unwrap();

    assert_eq!(
        result.text,
        "Dr [PROVIDER_A] phoned. [PROVIDER_A] asked for a copy."
    );
}

#[tokio::test]
async fn test_name_inside_longer_word_untouched() {
    let mut config = AnonymizationConfig::default();
    config
        .user_inclusion_words
        .insert("Ana".to_string(), EntityType::PersonOther);
    let engine = AnonymizationEngine::new(config).unwrap();

    let result = engine
        .anonymize(
            &mut AnonymizationSession::new(),
            "Ana discussed her banana smoothie habit.",
        )
        .await
        .unwrap();

    assert_eq!(result.text, "[PERSON_A] discussed her banana smoothie habit.");
}

#[tokio::test]
async fn test_multibyte_positions_are_utf16() {
    let note = "Client: Māia Ngata 🙂 attended. Māia Ngata was calm.";
    let engine = engine();
    let result = engine
        .anonymize(&mut AnonymizationSession::new(), note)
        .await
        .unwrap();

    let client = result
        .ledger
        .iter()
        .find(|e| e.original_text == "Māia Ngata")
        .unwrap();
    assert_eq!(client.entity_type, EntityType::PersonClient);
    assert_eq!(client.positions[0], Span::new(8, 18));
    // The emoji is two UTF-16 units
    assert_eq!(client.positions[1], Span::new(32, 42));

    assert!(!result.text.contains("Māia"));
    let restored = engine
        .restore(&result.text, &result.ledger, &HashMap::new())
        .unwrap();
    assert_eq!(restored, note);
}

#[tokio::test]
async fn test_entity_at_document_edges() {
    let note = "Dr Smith";
    let result = engine()
        .anonymize(&mut AnonymizationSession::new(), note)
        .await
        .unwrap();
    assert_eq!(result.text, "Dr [PROVIDER_A]");
    let smith = &result.ledger[0];
    assert_eq!(smith.positions, vec![Span::new(3, 8)]);
}

#[tokio::test]
async fn test_keep_year_policy() {
    let config = AnonymizationConfig {
        date_redaction_policy: DateRedactionPolicy::KeepYear,
        ..Default::default()
    };
    let engine = AnonymizationEngine::new(config).unwrap();
    let note = "Born 12/03/1978.";

    let result = engine
        .anonymize(&mut AnonymizationSession::new(), note)
        .await
        .unwrap();
    assert_eq!(result.text, "Born [DATE_A] 1978.");
    assert_eq!(
        engine
            .restore(&result.text, &result.ledger, &HashMap::new())
            .unwrap(),
        note
    );
}

#[test_case(100, 10 ; "small chunks")]
#[test_case(250, 60 ; "wide overlap")]
#[test_case(80, 0 ; "no overlap")]
fn test_chunks_partition_document(chunk_size: usize, overlap: usize) {
    let note = "Client: Aroha Ngata attended with her mother Mere. ".repeat(12);
    let chunks = Chunker::new(chunk_size, overlap).split(&note);
    assert!(chunks.len() > 1);

    let mut cursor = 0;
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index, i);
        let content = chunk.content_span();
        assert_eq!(content.start, cursor);
        cursor = content.end;
    }
    assert_eq!(cursor, utf16_len(&note));
}

#[test]
fn test_overlapping_candidates_keep_one() {
    let full = Entity::with_span("Aroha Ngata", EntityType::PersonClient, 8, 19)
        .with_confidence(Some(0.95));
    let surname = Entity::with_span("Ngata", EntityType::PersonOther, 14, 19)
        .with_confidence(Some(0.6));
    let unrelated = Entity::with_span("Mere", EntityType::PersonOther, 30, 34);

    let kept = remove_overlaps(vec![surname, full, unrelated]);

    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].original_text, "Aroha Ngata");
    assert_eq!(kept[1].original_text, "Mere");
}

#[test]
fn test_longest_alternative_wins() {
    let replacer = Replacer::new(DateRedactionPolicy::Full).unwrap();
    let mut short = Entity::with_span("Kauri", EntityType::Location, 0, 5);
    short.replacement_code = "[LOCATION_A]".to_string();
    let mut long = Entity::with_span("Kauri Lodge", EntityType::Location, 10, 21);
    long.replacement_code = "[LOCATION_B]".to_string();

    let replacement = replacer
        .replace("Kauri and Kauri Lodge", &[short, long])
        .unwrap();
    assert_eq!(replacement.text, "[LOCATION_A] and [LOCATION_B]");
}

#[test]
fn test_partial_leak_is_repaired() {
    let replacer = Replacer::new(DateRedactionPolicy::Full).unwrap();
    let mut owner = Entity::with_span("Ar", EntityType::PersonOther, 0, 2);
    owner.replacement_code = "[PERSON_A]".to_string();

    let (text, extended) = replacer.repair_leaks(
        "[PERSON_A] ran the [PERSON_A]rray check.",
        "Ar ran the Array check.",
        &[owner],
    );

    assert_eq!(text, "[PERSON_A] ran the [PERSON_A] check.");
    assert_eq!(extended.len(), 1);
    assert_eq!(extended[0].original_text, "Array");
    assert_eq!(extended[0].positions, vec![Span::new(11, 16)]);
}
