//! Context-driven person name recognizers
//!
//! Each recognizer looks for a name in a specific context: after an
//! honorific, after a field label, after a relationship word, or matching
//! the shape of a te reo Māori name.

use super::Recognizer;
use crate::anonymization::dictionary::{is_common_word, SpellChecker};
use crate::anonymization::models::{Entity, EntityType};
use crate::anonymization::offsets::Utf16Map;
use crate::domain::Result;
use anyhow::Context;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// One capitalized name token: `Smith`, `McDonald`, `O'Brien`, `Te-Aroha`
const NAME_TOKEN: &str = r"\p{Lu}\p{Ll}+(?:\p{Lu}\p{Ll}+)?(?:['’-]\p{Lu}\p{Ll}+)?";

/// Honorifics that may precede a name
const TITLES: &[&str] = &[
    "dr", "doctor", "prof", "professor", "mr", "mrs", "ms", "miss", "mx",
];

/// Check whether `word` is an honorific (case-insensitive, trailing dot ignored)
pub fn is_title(word: &str) -> bool {
    let lower = word.trim().trim_end_matches('.').to_lowercase();
    TITLES.contains(&lower.as_str())
}

/// Relationship words after which a capitalized word is taken as a name
pub const RELATIONSHIP_WORDS: &[&str] = &[
    "mother", "father", "sister", "brother", "son", "daughter",
    "grandmother", "grandfather", "grandma", "grandpa",
    "aunt", "uncle", "cousin", "niece", "nephew",
    "stepmother", "stepfather", "stepsister", "stepbrother",
    "whanau", "whangai",
    "wife", "husband", "partner", "spouse", "fiance", "fiancee",
    "boyfriend", "girlfriend", "ex-wife", "ex-husband",
    "friend", "flatmate", "roommate", "colleague", "coworker",
    "neighbor", "neighbour", "mate", "buddy",
];

const MAORI_FIRST_NAMES: &[&str] = &[
    "Wiremu", "Hemi", "Pita", "Rawiri", "Mikaere", "Tane", "Rangi", "Tamati", "Hohepa",
    "Aperahama", "Timoti", "Hone", "Paora", "Aroha", "Kiri", "Mere", "Hana", "Anahera", "Moana",
    "Ngaire", "Whetu", "Kahu", "Ataahua", "Hinewai", "Hine", "Marama", "Ariana",
];

const MAORI_LAST_NAMES: &[&str] = &[
    "Ngata", "Te Ao", "Tawhiri", "Wairua", "Takiri", "Parata", "Ngati", "Whaanga", "Eruera",
];

/// English words the phonetic pattern would otherwise flag
const PHONETIC_FALSE_POSITIVES: &[&str] = &[
    "Where", "When", "What", "Thing", "Something", "Anything", "Whither", "Whether", "Whence",
];

/// Drop trailing tokens that are common words or titles
///
/// Returns `None` when nothing name-like is left.
fn trim_name(candidate: &str) -> Option<&str> {
    let mut head = candidate.trim_end();
    loop {
        let last_start = head
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        let last = &head[last_start..];
        if !is_common_word(last) && !is_title(last) {
            return Some(head);
        }
        if last_start == 0 {
            return None;
        }
        head = head[..last_start].trim_end();
    }
}

/// Build an entity from the name captured at `group`, trimming stray
/// trailing words
fn name_entity(
    text: &str,
    map: &Utf16Map,
    captures: &regex::Captures<'_>,
    group: usize,
    entity_type: EntityType,
    confidence: f32,
    source: &str,
) -> Option<Entity> {
    let matched = captures.get(group)?;
    let name = trim_name(matched.as_str())?;
    let start = matched.start();
    let end = start + name.len();
    debug_assert!(text.is_char_boundary(end));

    Some(
        Entity::with_span(name, entity_type, map.to_units(start), map.to_units(end))
            .with_confidence(Some(confidence))
            .with_source(source),
    )
}

/// Names after an honorific: `Dr Smith`, `Mrs. Aroha Ngata`
///
/// `Dr`/`Doctor`/`Prof`/`Professor` mark a provider; other titles mark an
/// unrelated person. The title itself is not part of the entity.
pub struct TitledNameRecognizer {
    regex: Regex,
}

impl TitledNameRecognizer {
    /// Compile the recognizer
    pub fn new() -> anyhow::Result<Self> {
        let pattern = format!(
            r"\b(Dr|Doctor|Prof|Professor|Mr|Mrs|Ms|Miss|Mx)\.?[ \t]+({NAME_TOKEN}(?:[ \t]+{NAME_TOKEN})?)"
        );
        let regex = Regex::new(&pattern).context("Failed to compile titled name pattern")?;
        Ok(Self { regex })
    }
}

impl Recognizer for TitledNameRecognizer {
    fn name(&self) -> &str {
        "titled_name"
    }

    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let map = Utf16Map::new(text);
        let entities = self
            .regex
            .captures_iter(text)
            .filter_map(|captures| {
                let entity_type = match captures.get(1).map(|m| m.as_str()) {
                    Some("Dr" | "Doctor" | "Prof" | "Professor") => EntityType::PersonProvider,
                    _ => EntityType::PersonOther,
                };
                name_entity(text, &map, &captures, 2, entity_type, 0.9, "titled_name")
            })
            .collect();
        Ok(entities)
    }
}

/// Names after a field label: `Client: Aroha Ngata`, `GP: Dr Jones`
pub struct LabelledNameRecognizer {
    regex: Regex,
}

impl LabelledNameRecognizer {
    /// Compile the recognizer
    pub fn new() -> anyhow::Result<Self> {
        let pattern = format!(
            r"\b(?i:(client|patient|name|referrer|gp|clinician|therapist|counsell?or)[ \t]*[:\-]|(referred[ \t]+by)[ \t]*:?)[ \t]*(?:(?:Dr|Mr|Mrs|Ms|Miss|Mx|Prof)\.?[ \t]+)?({NAME_TOKEN}(?:[ \t]+{NAME_TOKEN}){{0,2}})"
        );
        let regex = Regex::new(&pattern).context("Failed to compile labelled name pattern")?;
        Ok(Self { regex })
    }
}

impl Recognizer for LabelledNameRecognizer {
    fn name(&self) -> &str {
        "labelled_name"
    }

    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let map = Utf16Map::new(text);
        let entities = self
            .regex
            .captures_iter(text)
            .filter_map(|captures| {
                let label = captures
                    .get(1)
                    .map(|m| m.as_str().to_lowercase())
                    .unwrap_or_default();
                let entity_type = match label.as_str() {
                    "client" | "patient" | "name" => EntityType::PersonClient,
                    _ => EntityType::PersonProvider,
                };
                name_entity(text, &map, &captures, 3, entity_type, 0.95, "labelled_name")
            })
            .collect();
        Ok(entities)
    }
}

/// Names after a relationship word: `mother Aroha`, `partner James Smith`
pub struct RelationshipNameRecognizer {
    regex: Regex,
}

impl RelationshipNameRecognizer {
    /// Compile the recognizer
    pub fn new() -> anyhow::Result<Self> {
        let mut words: Vec<&str> = RELATIONSHIP_WORDS.to_vec();
        words.sort_by_key(|w| std::cmp::Reverse(w.len()));
        let alternation = words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = format!(
            r"\b(?i:{alternation})[ \t]+({NAME_TOKEN}(?:[ \t]+{NAME_TOKEN})?)"
        );
        let regex = Regex::new(&pattern).context("Failed to compile relationship pattern")?;
        Ok(Self { regex })
    }
}

impl Recognizer for RelationshipNameRecognizer {
    fn name(&self) -> &str {
        "relationship_name"
    }

    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let map = Utf16Map::new(text);
        let entities = self
            .regex
            .captures_iter(text)
            .filter_map(|captures| {
                name_entity(
                    text,
                    &map,
                    &captures,
                    1,
                    EntityType::PersonOther,
                    0.9,
                    "relationship_name",
                )
            })
            .collect();
        Ok(entities)
    }
}

/// Te reo Māori names by dictionary and by phonetic shape
///
/// Dictionary hits score 0.95. Phonetic hits (`wh`/`ng` clusters, leading
/// vowel runs) score 0.6 and are discarded when the word is ordinary
/// English according to the spell checker.
pub struct MaoriNameRecognizer {
    dictionary: Regex,
    phonetic: Regex,
    names: HashSet<&'static str>,
    spell: Arc<dyn SpellChecker>,
}

impl MaoriNameRecognizer {
    /// Compile the recognizer
    pub fn new(spell: Arc<dyn SpellChecker>) -> anyhow::Result<Self> {
        let mut names: Vec<&'static str> = MAORI_FIRST_NAMES
            .iter()
            .chain(MAORI_LAST_NAMES.iter())
            .copied()
            .collect();
        names.sort_by_key(|n| std::cmp::Reverse(n.len()));

        let alternation = names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");
        let dictionary = Regex::new(&format!(r"\b(?:{alternation})\b"))
            .context("Failed to compile Māori name dictionary")?;
        let phonetic =
            Regex::new(r"\b[A-Z][a-z]*(?:wh|ng)[a-z]+\b|\b[A-Z][aeiouAEIOU]{2,}[a-z]*\b")
                .context("Failed to compile Māori phonetic pattern")?;

        Ok(Self {
            dictionary,
            phonetic,
            names: names.into_iter().collect(),
            spell,
        })
    }

    fn is_phonetic_candidate(&self, word: &str) -> bool {
        word.chars().count() >= 4
            && !self.names.contains(word)
            && !PHONETIC_FALSE_POSITIVES.contains(&word)
            && !is_common_word(word)
            && !self.spell.is_known_word(word)
    }
}

impl Recognizer for MaoriNameRecognizer {
    fn name(&self) -> &str {
        "maori_name"
    }

    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let map = Utf16Map::new(text);
        let mut entities = Vec::new();

        for m in self.dictionary.find_iter(text) {
            entities.push(
                Entity::with_span(
                    m.as_str(),
                    EntityType::PersonOther,
                    map.to_units(m.start()),
                    map.to_units(m.end()),
                )
                .with_confidence(Some(0.95))
                .with_source("maori_dictionary"),
            );
        }

        for m in self.phonetic.find_iter(text) {
            if !self.is_phonetic_candidate(m.as_str()) {
                continue;
            }
            entities.push(
                Entity::with_span(
                    m.as_str(),
                    EntityType::PersonOther,
                    map.to_units(m.start()),
                    map.to_units(m.end()),
                )
                .with_confidence(Some(0.6))
                .with_source("maori_phonetic"),
            );
        }

        Ok(entities)
    }
}
