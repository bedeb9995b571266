//! Lower-confidence PII candidates

use super::entity::{Entity, EntityType, Span};
use crate::anonymization::offsets::Utf16Map;
use serde::{Deserialize, Serialize};

/// Candidate produced by the deep scan or an out-of-process detector
///
/// Findings are not part of the ledger until the caller promotes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiFinding {
    /// Candidate text
    pub text: String,
    /// Suggested entity type
    pub suggested_type: EntityType,
    /// Provenance string
    pub reason: String,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
}

impl PiiFinding {
    /// Create a new finding
    pub fn new(
        text: impl Into<String>,
        suggested_type: EntityType,
        reason: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            text: text.into(),
            suggested_type,
            reason: reason.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Promote this finding to an entity by locating every whole-word
    /// occurrence of its text in `document`
    ///
    /// Returns `None` if the text never occurs.
    pub fn promote(&self, document: &str) -> Option<Entity> {
        let needle = self.text.trim();
        if needle.is_empty() {
            return None;
        }

        let map = Utf16Map::new(document);
        let mut positions = Vec::new();
        for (byte, matched) in document.match_indices(needle) {
            let end = byte + matched.len();
            let before_ok = document[..byte]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            let after_ok = document[end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
            if before_ok && after_ok {
                positions.push(Span::new(map.to_units(byte), map.to_units(end)));
            }
        }

        if positions.is_empty() {
            return None;
        }

        let mut entity = Entity::new(needle, self.suggested_type)
            .with_confidence(Some(self.confidence))
            .with_source(self.reason.clone());
        entity.positions = positions;
        Some(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promote_finds_whole_words() {
        let finding = PiiFinding::new("Kiri", EntityType::PersonOther, "dictionary", 0.4);
        let entity = finding.promote("Kiri and Kirin met Kiri.").unwrap();
        assert_eq!(entity.positions, vec![Span::new(0, 4), Span::new(19, 23)]);
        assert_eq!(entity.confidence, Some(0.4));
    }

    #[test]
    fn test_promote_absent_text() {
        let finding = PiiFinding::new("Hemi", EntityType::PersonOther, "fuzzy", 0.5);
        assert!(finding.promote("Nobody here").is_none());
    }
}
