//! Secondary, lower-precision deep scan
//!
//! Produces [`PiiFinding`]s only for text the primary pass did not already
//! cover. Three sources feed it: an optional tagger re-run at a lower
//! threshold, fuzzy matches against known names, and capitalized words
//! the spell checker does not know.

use crate::anonymization::chunker::Chunker;
use crate::anonymization::config::AnonymizationConfig;
use crate::anonymization::dictionary::{is_common_word, SpellChecker};
use crate::anonymization::models::{Entity, EntityType, PiiFinding};
use crate::anonymization::recognizer::detector::{map_label, Detector, DetectorRequest};
use crate::anonymization::recognizer::names::is_title;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// Levenshtein edit distance over chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Edit-distance policy for fuzzy name matching
#[derive(Debug, Clone, Copy)]
pub struct FuzzyPolicy {
    /// Known names shorter than this use `short_distance`
    pub long_name_length: usize,
    /// Maximum distance for short names
    pub short_distance: usize,
    /// Maximum distance for long names
    pub long_distance: usize,
    /// Shortest candidate word considered
    pub min_word_length: usize,
}

impl Default for FuzzyPolicy {
    fn default() -> Self {
        Self {
            long_name_length: 6,
            short_distance: 1,
            long_distance: 2,
            min_word_length: 3,
        }
    }
}

impl FuzzyPolicy {
    fn max_distance(&self, known: &str) -> usize {
        if known.chars().count() < self.long_name_length {
            self.short_distance
        } else {
            self.long_distance
        }
    }
}

/// Deep-scan pass over a whole document
pub struct DeepScanner {
    tagger: Option<Arc<dyn Detector>>,
    spell: Arc<dyn SpellChecker>,
    chunker: Chunker,
    threshold: f32,
    fuzzy: FuzzyPolicy,
    exclusions: HashSet<String>,
    words: Regex,
}

impl DeepScanner {
    /// Create a scanner without a tagger
    pub fn new(spell: Arc<dyn SpellChecker>) -> anyhow::Result<Self> {
        Ok(Self {
            tagger: None,
            spell,
            chunker: Chunker::new(4000, 200),
            threshold: 0.3,
            fuzzy: FuzzyPolicy::default(),
            exclusions: HashSet::new(),
            words: Regex::new(r"\b\p{Lu}\p{Ll}+\b")?,
        })
    }

    /// Create a scanner from configuration
    pub fn from_config(
        config: &AnonymizationConfig,
        spell: Arc<dyn SpellChecker>,
        tagger: Option<Arc<dyn Detector>>,
    ) -> anyhow::Result<Self> {
        let mut scanner = Self::new(spell)?;
        scanner.tagger = tagger;
        scanner.chunker = Chunker::from_config(&config.chunking);
        scanner.threshold = config.pipeline.deep_scan_threshold;
        scanner.fuzzy = FuzzyPolicy {
            long_name_length: config.pipeline.fuzzy_long_name_length,
            short_distance: config.pipeline.fuzzy_short_distance,
            long_distance: config.pipeline.fuzzy_long_distance,
            min_word_length: config.min_fuzzy_name_length,
        };
        scanner.exclusions = super::merge::exclusion_set(&config.user_exclusion_words);
        Ok(scanner)
    }

    /// Override the fuzzy matching policy
    pub fn with_fuzzy_policy(mut self, policy: FuzzyPolicy) -> Self {
        self.fuzzy = policy;
        self
    }

    /// Scan `document` and return findings not covered by `existing`
    pub fn scan(&self, document: &str, existing: &[Entity]) -> Vec<PiiFinding> {
        let mut findings = self.tagger_findings(document);

        let known: Vec<(String, EntityType)> = existing
            .iter()
            .filter(|e| e.is_person())
            .flat_map(|e| {
                e.original_text
                    .split_whitespace()
                    .filter(|t| t.chars().count() >= 2)
                    .map(|t| (t.to_string(), e.entity_type))
                    .collect::<Vec<_>>()
            })
            .collect();

        findings.extend(self.fuzzy_findings(document, &known));
        findings.extend(self.dictionary_findings(document));

        let covered: Vec<String> = existing.iter().map(|e| e.normalized_text()).collect();
        let mut seen = HashSet::new();
        let delta: Vec<PiiFinding> = findings
            .into_iter()
            .filter(|f| {
                let text = f.text.trim().to_lowercase();
                !text.is_empty()
                    && !self.exclusions.contains(&text)
                    && !is_covered(&text, &covered)
                    && seen.insert(text)
            })
            .collect();

        tracing::debug!(findings = delta.len(), "Deep scan complete");
        delta
    }

    fn tagger_findings(&self, document: &str) -> Vec<PiiFinding> {
        let Some(tagger) = &self.tagger else {
            return Vec::new();
        };

        let mut findings = Vec::new();
        for chunk in self.chunker.split(document) {
            let request = DetectorRequest::new(chunk.text.clone(), self.threshold);
            let reported = match tagger.detect(&request) {
                Ok(reported) => reported,
                Err(e) => {
                    tracing::warn!(
                        chunk = chunk.index,
                        detector = tagger.name(),
                        error = %e,
                        "Deep scan chunk failed"
                    );
                    continue;
                }
            };

            for item in reported {
                let Some(entity_type) = map_label(&item.label) else {
                    continue;
                };
                let confidence = item.confidence.unwrap_or(self.threshold);
                if confidence < self.threshold {
                    continue;
                }
                findings.push(PiiFinding::new(
                    item.text,
                    entity_type,
                    format!("{} deep scan ({})", tagger.name(), item.label),
                    confidence,
                ));
            }
        }
        findings
    }

    /// Capitalized words long enough to be names, minus titles and common words
    ///
    /// Dictionary words stay in: a misspelt name can be an English word.
    fn capitalized_words<'a>(&'a self, document: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.words.find_iter(document).map(|m| m.as_str()).filter(move |w| {
            w.chars().count() >= self.fuzzy.min_word_length && !is_common_word(w) && !is_title(w)
        })
    }

    fn fuzzy_findings(&self, document: &str, known: &[(String, EntityType)]) -> Vec<PiiFinding> {
        if known.is_empty() {
            return Vec::new();
        }

        let mut findings = Vec::new();
        for word in self.capitalized_words(document) {
            let lower = word.to_lowercase();
            if known.iter().any(|(k, _)| k.to_lowercase() == lower) {
                continue;
            }

            let best = known
                .iter()
                .map(|(k, ty)| (levenshtein(&lower, &k.to_lowercase()), k, *ty))
                .filter(|(d, k, _)| *d > 0 && *d <= self.fuzzy.max_distance(k))
                .min_by_key(|(d, _, _)| *d);

            if let Some((distance, _, entity_type)) = best {
                findings.push(PiiFinding::new(
                    word,
                    entity_type,
                    format!("fuzzy match to a known name (distance {distance})"),
                    0.7 - 0.1 * (distance.saturating_sub(1)) as f32,
                ));
            }
        }
        findings
    }

    fn dictionary_findings(&self, document: &str) -> Vec<PiiFinding> {
        self.capitalized_words(document)
            .filter(|word| !self.spell.is_known_word(word))
            .map(|word| {
                PiiFinding::new(
                    word,
                    EntityType::PersonOther,
                    "capitalized word not in dictionary",
                    0.4,
                )
            })
            .collect()
    }
}

/// Covered by exact match or substring containment in either direction
fn is_covered(text: &str, covered: &[String]) -> bool {
    covered
        .iter()
        .any(|c| c == text || c.contains(text) || text.contains(c.as_str()))
}
