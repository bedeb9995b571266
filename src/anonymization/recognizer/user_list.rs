//! Caller-supplied inclusion words

use super::Recognizer;
use crate::anonymization::models::{Entity, EntityType};
use crate::anonymization::offsets::Utf16Map;
use crate::domain::{AnonError, Result};
use regex::Regex;
use std::collections::BTreeMap;

/// Wrap `escaped` in word boundaries where the literal starts or ends with
/// a word character
pub(crate) fn bounded(literal: &str, escaped: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if literal.chars().next().is_some_and(is_word) {
        r"\b"
    } else {
        ""
    };
    let trail = if literal.chars().next_back().is_some_and(is_word) {
        r"\b"
    } else {
        ""
    };
    format!("{lead}{escaped}{trail}")
}

/// Always flags the configured words, case-insensitively, with their type
pub struct UserListRecognizer {
    words: Vec<(Regex, EntityType)>,
}

impl UserListRecognizer {
    /// Compile one matcher per inclusion word
    ///
    /// Blank words are ignored. A word whose matcher fails to build is
    /// skipped and logged.
    pub fn new(words: &BTreeMap<String, EntityType>) -> Self {
        let mut compiled = Vec::with_capacity(words.len());
        for (word, entity_type) in words {
            let word = word.trim();
            if word.is_empty() {
                continue;
            }
            let pattern = format!("(?i){}", bounded(word, &regex::escape(word)));
            match Regex::new(&pattern) {
                Ok(regex) => compiled.push((regex, *entity_type)),
                Err(e) => {
                    let error = AnonError::RecognizerPatternInvalid {
                        name: "user_inclusion_words".to_string(),
                        pattern,
                        reason: e.to_string(),
                    };
                    tracing::warn!(error = %error, "Skipping inclusion word");
                }
            }
        }
        Self { words: compiled }
    }

    /// Number of active inclusion words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True if no inclusion words are configured
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Recognizer for UserListRecognizer {
    fn name(&self) -> &str {
        "user_list"
    }

    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        if self.words.is_empty() {
            return Ok(Vec::new());
        }

        let map = Utf16Map::new(text);
        let mut entities = Vec::new();
        for (regex, entity_type) in &self.words {
            for m in regex.find_iter(text) {
                entities.push(
                    Entity::with_span(
                        m.as_str(),
                        *entity_type,
                        map.to_units(m.start()),
                        map.to_units(m.end()),
                    )
                    .with_source("user_list"),
                );
            }
        }
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::Span;

    #[test]
    fn test_bounded() {
        assert_eq!(bounded("abc", "abc"), r"\babc\b");
        assert_eq!(bounded("#tag", r"\#tag"), r"\#tag\b");
    }

    #[test]
    fn test_matches_case_insensitively() {
        let mut words = BTreeMap::new();
        words.insert("Kauri Lodge".to_string(), EntityType::Location);
        let recognizer = UserListRecognizer::new(&words);

        let entities = recognizer
            .recognize("Moved to kauri lodge. Kauri Lodge staff agreed.")
            .unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].original_text, "kauri lodge");
        assert_eq!(entities[0].positions, vec![Span::new(9, 20)]);
        assert_eq!(entities[0].entity_type, EntityType::Location);
        assert_eq!(entities[0].confidence, None);
    }

    #[test]
    fn test_respects_word_boundaries() {
        let mut words = BTreeMap::new();
        words.insert("Ana".to_string(), EntityType::PersonClient);
        let recognizer = UserListRecognizer::new(&words);
        assert!(recognizer.recognize("Banana analysis").unwrap().is_empty());
    }

    #[test]
    fn test_blank_words_ignored() {
        let mut words = BTreeMap::new();
        words.insert("   ".to_string(), EntityType::PersonOther);
        assert!(UserListRecognizer::new(&words).is_empty());
    }
}
