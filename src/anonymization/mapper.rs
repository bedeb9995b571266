//! Entity mapping: stable replacement codes per session
//!
//! Codes look like `[CLIENT_A]`. Each entity type has its own letter
//! counter running `A..Z, AA, AB, ...`. The mapping is keyed by normalized
//! text, so `Aroha`, `AROHA` and ` aroha ` all share one code.

use crate::anonymization::models::{normalize_text, EntityType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Session-scoped ledger of text ↔ code assignments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMapping {
    /// Normalized original text → code
    forward: HashMap<String, String>,
    /// Code → original text as first seen
    reverse: BTreeMap<String, String>,
    /// Codes issued so far per type
    counters: HashMap<EntityType, usize>,
}

impl EntityMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the code for `original`, allocating the next one for `entity_type` if new
    ///
    /// Lookup is by normalized text only. A text first seen with one type
    /// keeps that code if it later arrives with another.
    pub fn get_or_create_code(&mut self, original: &str, entity_type: EntityType) -> String {
        let key = normalize_text(original);
        if let Some(code) = self.forward.get(&key) {
            return code.clone();
        }

        let counter = self.counters.entry(entity_type).or_insert(0);
        *counter += 1;
        let code = format!("[{}_{}]", entity_type.label(), letter_suffix(*counter));

        self.forward.insert(key, code.clone());
        self.reverse.insert(code.clone(), original.trim().to_string());
        code
    }

    /// Existing code for a text, if any
    pub fn code_for(&self, original: &str) -> Option<&str> {
        self.forward.get(&normalize_text(original)).map(String::as_str)
    }

    /// Original text recorded for a code
    pub fn original_for(&self, code: &str) -> Option<&str> {
        self.reverse.get(code).map(String::as_str)
    }

    /// Record an additional text under an existing code
    ///
    /// Used when leak repair discovers a longer form of a known entity.
    pub fn alias(&mut self, original: &str, code: &str) {
        self.forward
            .entry(normalize_text(original))
            .or_insert_with(|| code.to_string());
    }

    /// Number of distinct codes issued
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    /// True if no code was issued
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// Clear every assignment and counter
    pub fn reset(&mut self) {
        self.forward.clear();
        self.reverse.clear();
        self.counters.clear();
    }
}

/// Bijective base-26 letters: 1 → `A`, 26 → `Z`, 27 → `AA`
pub fn letter_suffix(mut n: usize) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, "A")]
    #[test_case(2, "B")]
    #[test_case(26, "Z")]
    #[test_case(27, "AA")]
    #[test_case(28, "AB")]
    #[test_case(52, "AZ")]
    #[test_case(53, "BA")]
    #[test_case(702, "ZZ")]
    #[test_case(703, "AAA")]
    fn test_letter_suffix(n: usize, expected: &str) {
        assert_eq!(letter_suffix(n), expected);
    }

    #[test]
    fn test_code_is_idempotent() {
        let mut mapping = EntityMapping::new();
        let first = mapping.get_or_create_code("Aroha", EntityType::PersonClient);
        let second = mapping.get_or_create_code("Aroha", EntityType::PersonClient);
        assert_eq!(first, "[CLIENT_A]");
        assert_eq!(first, second);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_normalized_variants_share_code() {
        let mut mapping = EntityMapping::new();
        let a = mapping.get_or_create_code("Aroha  Ngata", EntityType::PersonClient);
        let b = mapping.get_or_create_code(" AROHA NGATA", EntityType::PersonClient);
        assert_eq!(a, b);
        assert_eq!(mapping.original_for(&a), Some("Aroha  Ngata"));
    }

    #[test]
    fn test_counters_are_per_type() {
        let mut mapping = EntityMapping::new();
        assert_eq!(
            mapping.get_or_create_code("Smith", EntityType::PersonProvider),
            "[PROVIDER_A]"
        );
        assert_eq!(
            mapping.get_or_create_code("12/03/2024", EntityType::Date),
            "[DATE_A]"
        );
        assert_eq!(
            mapping.get_or_create_code("Jones", EntityType::PersonProvider),
            "[PROVIDER_B]"
        );
        assert_eq!(
            mapping.get_or_create_code("Mere", EntityType::PersonOther),
            "[PERSON_A]"
        );
    }

    #[test]
    fn test_type_conflict_keeps_first_code() {
        let mut mapping = EntityMapping::new();
        let first = mapping.get_or_create_code("Manukau", EntityType::Location);
        let second = mapping.get_or_create_code("Manukau", EntityType::Organization);
        assert_eq!(first, second);
    }

    #[test]
    fn test_alias_and_reset() {
        let mut mapping = EntityMapping::new();
        let code = mapping.get_or_create_code("Ar", EntityType::PersonOther);
        mapping.alias("Array", &code);
        assert_eq!(mapping.code_for("array"), Some(code.as_str()));
        assert_eq!(mapping.len(), 1);

        mapping.reset();
        assert!(mapping.is_empty());
        assert_eq!(
            mapping.get_or_create_code("Hemi", EntityType::PersonOther),
            "[PERSON_A]"
        );
    }

    #[test]
    fn test_mapping_serializes() {
        let mut mapping = EntityMapping::new();
        mapping.get_or_create_code("Aroha", EntityType::PersonClient);
        let json = serde_json::to_string(&mapping).unwrap();
        let restored: EntityMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.code_for("aroha"), Some("[CLIENT_A]"));
    }
}
