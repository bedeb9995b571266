//! Word lists used to filter name candidates
//!
//! Two distinct lists live here: a short, fixed set of common words that
//! are never person names on their own, and a spell-check word list used by
//! the deep scan to decide whether a capitalized word is ordinary English.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Words that are never treated as a person name on their own
const COMMON_WORDS: &[&str] = &[
    // articles and conjunctions
    "the", "a", "an", "and", "but", "or", "nor", "for", "yet", "so",
    // prepositions
    "in", "on", "at", "to", "from", "with", "by", "of", "about",
    // pronouns
    "he", "she", "it", "they", "we", "you", "i", "him", "her", "them", "us", "me", "his",
    "its", "their", "our", "your", "my",
    // verbs
    "is", "was", "are", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did",
    "this", "that", "these", "those", "when", "where", "what", "which", "who", "why", "how",
    // clinical
    "patient", "client", "treatment", "therapy", "care", "health", "medical", "clinical",
    "hospital", "clinic", "doctor", "session", "plan",
    // relationships
    "mother", "father", "sister", "brother", "son", "daughter", "wife", "husband", "partner",
    "friend", "family", "whanau",
];

/// Check whether `word` is on the fixed common-word list (case-insensitive)
pub fn is_common_word(word: &str) -> bool {
    let lower = word.trim().to_lowercase();
    COMMON_WORDS.contains(&lower.as_str())
}

/// Spell-check oracle consulted by the dictionary deep-scan pass
pub trait SpellChecker: Send + Sync {
    /// True if `word` is an ordinary dictionary word
    fn is_known_word(&self, word: &str) -> bool;
}

/// Case-insensitive word list
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: HashSet<String>,
}

impl WordList {
    /// Built-in English word list
    pub fn embedded() -> Self {
        Self::parse(include_str!("../../resources/english_words.txt"))
    }

    /// Load a newline-separated word list
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read dictionary: {}", path.as_ref().display())
        })?;
        Ok(Self::parse(&content))
    }

    /// Parse word list content; blank lines and `#` comments are skipped
    pub fn parse(content: &str) -> Self {
        let words = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .collect();
        Self { words }
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True if the list holds no words
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Add every word of another list
    pub fn merge(&mut self, other: WordList) {
        self.words.extend(other.words);
    }
}

impl SpellChecker for WordList {
    fn is_known_word(&self, word: &str) -> bool {
        self.words.contains(&word.trim().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_common_words() {
        assert!(is_common_word("The"));
        assert!(is_common_word(" patient "));
        assert!(!is_common_word("Aroha"));
    }

    #[test]
    fn test_embedded_list() {
        let words = WordList::embedded();
        assert!(words.len() > 500);
        assert!(words.is_known_word("Session"));
        assert!(words.is_known_word("ongoing"));
        assert!(!words.is_known_word("Wiremu"));
        assert!(!words.is_known_word("# Common English words"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# custom").unwrap();
        writeln!(file, "Kaupapa").unwrap();
        writeln!(file).unwrap();
        let words = WordList::from_file(file.path()).unwrap();
        assert_eq!(words.len(), 1);
        assert!(words.is_known_word("kaupapa"));
    }

    #[test]
    fn test_merge_custom_words() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Wiremu").unwrap();

        let mut words = WordList::embedded();
        let before = words.len();
        words.merge(WordList::from_file(file.path()).unwrap());
        assert_eq!(words.len(), before + 1);
        assert!(words.is_known_word("wiremu"));
    }

    #[test]
    fn test_missing_file() {
        assert!(WordList::from_file("/nonexistent/words.txt").is_err());
    }
}
