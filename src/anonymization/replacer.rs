//! Single-pass placeholder rewriting
//!
//! All entity strings are compiled into one case-insensitive
//! [`LiteralMatcher`], longest first, and the document is rewritten right
//! to left. A matched possessive suffix on a person name is kept after the
//! placeholder, so `Sean's` becomes `[PERSON_A]'s` and `Seans` becomes
//! `[PERSON_A]s`.

use crate::anonymization::config::DateRedactionPolicy;
use crate::anonymization::matcher::{resolve_owner, Literal, LiteralMatcher, DEFAULT_SIZE_LIMIT};
use crate::anonymization::models::{normalize_text, Entity, EntityType, Span};
use crate::anonymization::offsets::Utf16Map;
use crate::domain::{AnonError, Result};
use std::collections::HashMap;

/// Output of a replacement pass
#[derive(Debug, Clone, Default)]
pub struct Replacement {
    /// Anonymized text
    pub text: String,
    /// Longer forms of known entities found by leak repair
    pub extended: Vec<Entity>,
    /// Number of substitutions made
    pub replaced: usize,
}

/// Rewrites documents using the codes carried by each entity
#[derive(Debug, Clone)]
pub struct Replacer {
    policy: DateRedactionPolicy,
    size_limit: usize,
    leak: regex::Regex,
}

impl Replacer {
    /// Create a replacer for a date policy
    pub fn new(policy: DateRedactionPolicy) -> anyhow::Result<Self> {
        Ok(Self {
            policy,
            size_limit: DEFAULT_SIZE_LIMIT,
            leak: regex::Regex::new(r"\[([A-Z]+_[A-Z]+)\]([A-Za-z]+)")?,
        })
    }

    /// Cap the compiled size of the combined matcher, in bytes
    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Text substituted for an entity
    ///
    /// Under [`DateRedactionPolicy::KeepYear`] a date keeps its year after
    /// the code, e.g. `[DATE_A] 1978`.
    pub fn replacement_text(&self, entity: &Entity) -> String {
        if self.policy == DateRedactionPolicy::KeepYear
            && entity.entity_type == EntityType::Date
        {
            if let Some(year) = extract_year(&entity.original_text) {
                return format!("{} {}", entity.replacement_code, year);
            }
        }
        entity.replacement_code.clone()
    }

    /// Replace every occurrence of every entity in one pass
    ///
    /// Entities without a code or text are ignored. Fails with
    /// [`AnonError::ReplacementVerificationFailure`] if the combined matcher
    /// cannot be built; the document is never partially rewritten.
    pub fn replace(&self, document: &str, entities: &[Entity]) -> Result<Replacement> {
        let mut owners: HashMap<String, usize> = HashMap::new();
        for (i, entity) in entities.iter().enumerate() {
            if entity.replacement_code.is_empty() || entity.original_text.trim().is_empty() {
                continue;
            }
            owners.entry(entity.normalized_text()).or_insert(i);
        }

        if owners.is_empty() {
            return Ok(Replacement {
                text: document.to_string(),
                ..Default::default()
            });
        }

        let literals: Vec<Literal<'_>> = owners
            .values()
            .map(|&i| Literal {
                text: entities[i].original_text.as_str(),
                possessive: entities[i].is_person(),
            })
            .collect();
        let matcher = LiteralMatcher::build(&literals, self.size_limit).map_err(|e| {
            AnonError::ReplacementVerificationFailure(format!(
                "combined matcher over {} entities: {e}",
                literals.len()
            ))
        })?;

        let mut edits: Vec<(usize, usize, String)> = Vec::new();
        for found in matcher.find_iter(document) {
            let Some((owner, suffix)) = resolve_owner(found.as_str(), &owners) else {
                tracing::warn!(start = found.start(), "Match without owning entity skipped");
                continue;
            };
            let replacement = format!("{}{}", self.replacement_text(&entities[owner]), suffix);
            edits.push((found.start(), found.end(), replacement));
        }

        let mut text = document.to_string();
        for (start, end, replacement) in edits.iter().rev() {
            text.replace_range(*start..*end, replacement);
        }

        let (text, extended) = self.repair_leaks(&text, document, entities);

        tracing::debug!(
            replaced = edits.len(),
            entities = matcher.len(),
            extended = extended.len(),
            "Replacement pass complete"
        );

        Ok(Replacement {
            text,
            extended,
            replaced: edits.len(),
        })
    }

    /// Remove residual letters glued to a placeholder
    ///
    /// For `[CODE]letters`, if the code's original text followed by those
    /// letters occurs in `document` (case-insensitive), the letters are
    /// dropped and an entity for the longer form is returned. A bare `s`
    /// after a person placeholder is a kept possessive, not a leak.
    pub fn repair_leaks(
        &self,
        anonymized: &str,
        document: &str,
        entities: &[Entity],
    ) -> (String, Vec<Entity>) {
        let mut by_code: HashMap<&str, &Entity> = HashMap::new();
        for entity in entities {
            if !entity.replacement_code.is_empty() {
                by_code.entry(entity.replacement_code.as_str()).or_insert(entity);
            }
        }

        let map = Utf16Map::new(document);
        let mut extended: Vec<Entity> = Vec::new();
        let mut edits: Vec<(usize, usize, String)> = Vec::new();

        for captures in self.leak.captures_iter(anonymized) {
            let (Some(whole), Some(label), Some(letters)) =
                (captures.get(0), captures.get(1), captures.get(2))
            else {
                continue;
            };
            let code = format!("[{}]", label.as_str());
            let Some(owner) = by_code.get(code.as_str()) else {
                continue;
            };
            if owner.is_person() && letters.as_str() == "s" {
                continue;
            }

            let candidate = format!("{}{}", owner.original_text.trim(), letters.as_str());
            let Ok(finder) = regex::Regex::new(&format!("(?i){}", regex::escape(&candidate)))
            else {
                continue;
            };

            let spans: Vec<_> = finder
                .find_iter(document)
                .map(|m| (m.as_str().to_string(), map.to_units(m.start()), map.to_units(m.end())))
                .collect();
            let Some((found_text, _, _)) = spans.first() else {
                continue;
            };

            edits.push((whole.start(), whole.end(), code.clone()));

            let key = normalize_text(found_text);
            if !extended.iter().any(|e| e.normalized_text() == key) {
                let mut entity = Entity::new(found_text.clone(), owner.entity_type)
                    .with_confidence(owner.confidence)
                    .with_source("leak_repair");
                entity.replacement_code = code;
                entity.merge_positions(
                    spans
                        .iter()
                        .map(|(_, s, e)| Span::new(*s, *e)),
                );
                extended.push(entity);
            }
        }

        if edits.is_empty() {
            return (anonymized.to_string(), extended);
        }

        tracing::info!(repaired = edits.len(), "Partial placeholder leaks repaired");

        let mut text = anonymized.to_string();
        for (start, end, code) in edits.iter().rev() {
            text.replace_range(*start..*end, code);
        }
        (text, extended)
    }
}

/// Four-digit year (19xx or 20xx) standing on its own in a date string
pub(crate) fn extract_year(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    (0..bytes.len().saturating_sub(3)).find_map(|i| {
        let window = &bytes[i..i + 4];
        let digits = window.iter().all(u8::is_ascii_digit);
        let century = window.starts_with(b"19") || window.starts_with(b"20");
        let before = i == 0 || !bytes[i - 1].is_ascii_digit();
        let after = i + 4 == bytes.len() || !bytes[i + 4].is_ascii_digit();
        (digits && century && before && after).then(|| &text[i..i + 4])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coded(text: &str, ty: EntityType, code: &str) -> Entity {
        let mut entity = Entity::new(text, ty);
        entity.replacement_code = code.to_string();
        entity
    }

    fn replacer() -> Replacer {
        Replacer::new(DateRedactionPolicy::Full).unwrap()
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("12/03/1978"), Some("1978"));
        assert_eq!(extract_year("3 March 2024"), Some("2024"));
        assert_eq!(extract_year("12/03/78"), None);
        assert_eq!(extract_year("ID 119784"), None);
    }

    #[test]
    fn test_possessive_forms_share_code() {
        let entities = vec![coded("Sean", EntityType::PersonOther, "[PERSON_A]")];
        let result = replacer()
            .replace("Sean's book and Seans hat", &entities)
            .unwrap();
        assert_eq!(result.text, "[PERSON_A]'s book and [PERSON_A]s hat");
        assert_eq!(result.replaced, 2);
        assert!(result.extended.is_empty());
    }

    #[test]
    fn test_longest_match_wins() {
        let entities = vec![
            coded("Smith", EntityType::PersonOther, "[PERSON_A]"),
            coded("Dr. Smith", EntityType::PersonProvider, "[PROVIDER_A]"),
        ];
        let result = replacer().replace("Dr. Smith arrived", &entities).unwrap();
        assert_eq!(result.text, "[PROVIDER_A] arrived");
    }

    #[test]
    fn test_case_insensitive_and_word_bounded() {
        let entities = vec![coded("Ana", EntityType::PersonClient, "[CLIENT_A]")];
        let result = replacer()
            .replace("ANA said Anaesthesia was fine; ana agreed.", &entities)
            .unwrap();
        assert_eq!(
            result.text,
            "[CLIENT_A] said Anaesthesia was fine; [CLIENT_A] agreed."
        );
    }

    #[test]
    fn test_keep_year_policy() {
        let replacer = Replacer::new(DateRedactionPolicy::KeepYear).unwrap();
        let entities = vec![coded("12/03/1978", EntityType::Date, "[DATE_A]")];
        let result = replacer.replace("Born 12/03/1978.", &entities).unwrap();
        assert_eq!(result.text, "Born [DATE_A] 1978.");
    }

    #[test]
    fn test_non_word_edges() {
        let entities = vec![coded("+64 21 555 1234", EntityType::Contact, "[CONTACT_A]")];
        let result = replacer()
            .replace("Phone:+64 21 555 1234.", &entities)
            .unwrap();
        assert_eq!(result.text, "Phone:[CONTACT_A].");
    }

    #[test]
    fn test_multibyte_document() {
        let entities = vec![coded("Māia", EntityType::PersonOther, "[PERSON_A]")];
        let result = replacer()
            .replace("Kia ora Māia, Māia’s whānau visited.", &entities)
            .unwrap();
        assert_eq!(
            result.text,
            "Kia ora [PERSON_A], [PERSON_A]’s whānau visited."
        );
    }

    #[test]
    fn test_no_entities_returns_document() {
        let result = replacer().replace("Nothing here.", &[]).unwrap();
        assert_eq!(result.text, "Nothing here.");
        assert_eq!(result.replaced, 0);
    }

    #[test]
    fn test_long_document_is_rewritten() {
        let entities: Vec<Entity> = (0..20)
            .map(|i| {
                coded(
                    &format!("Surname{i:02}"),
                    EntityType::PersonProvider,
                    &format!("[PROVIDER_{}]", crate::anonymization::mapper::letter_suffix(i + 1)),
                )
            })
            .collect();
        let mut document: String = (0..20)
            .map(|i| format!("Seen by Dr Surname{i:02} on review.\n"))
            .collect();
        document.push_str(&"Mood stable, sleeping well, eating regularly. ".repeat(1800));
        assert!(document.len() > 80_000);

        let result = replacer().replace(&document, &entities).unwrap();
        assert_eq!(result.replaced, 20);
        assert!(!result.text.contains("Surname"));
        assert!(result.text.starts_with("Seen by Dr [PROVIDER_A] on review."));
    }

    #[test]
    fn test_oversized_matcher_fails_whole_document() {
        let replacer = replacer().with_size_limit(1);
        let entities = vec![coded("Smith", EntityType::PersonProvider, "[PROVIDER_A]")];
        let result = replacer.replace("Seen by Dr Smith.", &entities);
        assert!(matches!(
            result,
            Err(AnonError::ReplacementVerificationFailure(_))
        ));
    }

    #[test]
    fn test_leak_repair() {
        let mut owner = coded("Ar", EntityType::PersonOther, "[PERSON_A]");
        owner.positions = vec![Span::new(0, 2)];
        let document = "Ar said the Array test passed.";
        let (text, extended) =
            replacer().repair_leaks("[PERSON_A] said the [PERSON_A]rray test passed.", document, &[owner]);

        assert_eq!(text, "[PERSON_A] said the [PERSON_A] test passed.");
        assert_eq!(extended.len(), 1);
        assert_eq!(extended[0].original_text, "Array");
        assert_eq!(extended[0].replacement_code, "[PERSON_A]");
        assert_eq!(
            extended[0].positions,
            vec![Span::new(12, 17)]
        );
    }

    #[test]
    fn test_leak_left_when_form_absent() {
        let owner = coded("Ar", EntityType::PersonOther, "[PERSON_A]");
        let (text, extended) = replacer().repair_leaks("[PERSON_A]rgh", "Ar said hello", &[owner]);
        assert_eq!(text, "[PERSON_A]rgh");
        assert!(extended.is_empty());
    }
}
