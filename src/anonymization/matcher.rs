//! Word-bounded literal matching
//!
//! The occurrence rescan and the replacer both need every occurrence of a
//! set of known strings, case-insensitively, without matching inside longer
//! words. Both build one [`LiteralMatcher`] over the whole set and resolve
//! each match back to its owner with [`resolve_owner`].
//!
//! The matcher is a `regex` alternation. Edges that start or end with a
//! word character get a `\b`, which the `regex` crate evaluates in linear
//! time, so document length never makes a search fail.

use crate::anonymization::models::normalize_text;
use std::collections::HashMap;

/// Default cap on the compiled matcher size in bytes
pub const DEFAULT_SIZE_LIMIT: usize = 64 * (1 << 20);

/// Possessive suffixes kept after a person placeholder
const POSSESSIVE_SUFFIXES: [&str; 6] = ["'s", "’s", "'S", "’S", "s", "S"];

/// One literal in a matcher
#[derive(Debug, Clone, Copy)]
pub struct Literal<'a> {
    /// Text to find
    pub text: &'a str,
    /// Also match `'s`, `’s` or a bare `s` directly after the text
    pub possessive: bool,
}

/// Compiled alternation over a set of literals, longest first
#[derive(Debug, Clone)]
pub struct LiteralMatcher {
    regex: regex::Regex,
    literals: usize,
}

impl LiteralMatcher {
    /// Build a matcher; empty or whitespace-only literals are ignored
    pub fn build(literals: &[Literal<'_>], size_limit: usize) -> Result<Self, regex::Error> {
        let mut ordered: Vec<Literal<'_>> = literals
            .iter()
            .map(|l| Literal {
                text: l.text.trim(),
                possessive: l.possessive,
            })
            .filter(|l| !l.text.is_empty())
            .collect();
        ordered.sort_by(|a, b| {
            b.text
                .chars()
                .count()
                .cmp(&a.text.chars().count())
                .then_with(|| a.text.cmp(b.text))
        });
        ordered.dedup_by(|a, b| a.text == b.text && a.possessive == b.possessive);

        let alternation = if ordered.is_empty() {
            // never matches
            r"\b\B".to_string()
        } else {
            ordered.iter().map(alternative).collect::<Vec<_>>().join("|")
        };

        let regex = regex::RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .size_limit(size_limit)
            .build()?;

        Ok(Self {
            regex,
            literals: ordered.len(),
        })
    }

    /// Number of distinct alternatives
    pub fn len(&self) -> usize {
        self.literals
    }

    /// True if nothing can match
    pub fn is_empty(&self) -> bool {
        self.literals == 0
    }

    /// Every non-overlapping match, left to right
    pub fn find_iter<'r, 'h>(&'r self, haystack: &'h str) -> regex::Matches<'r, 'h> {
        self.regex.find_iter(haystack)
    }
}

/// Pattern for one literal
fn alternative(literal: &Literal<'_>) -> String {
    let text = literal.text;
    let escaped = regex::escape(text);
    let first_is_word = text.chars().next().is_some_and(is_word_char);
    let last_is_word = text.chars().last().is_some_and(is_word_char);

    let mut pattern = String::new();
    if first_is_word {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&escaped);
    match (literal.possessive, last_is_word) {
        (true, true) => pattern.push_str(r"(?:'s|’s|s)?\b"),
        (true, false) => pattern.push_str(r"(?:(?:'s|’s|s)\b)?"),
        (false, true) => pattern.push_str(r"\b"),
        (false, false) => {}
    }
    format!("(?:{pattern})")
}

/// Find the owner of a match and the possessive suffix that followed it
///
/// `owners` is keyed by [`normalize_text`]. The exact text wins over a
/// stripped possessive, so a name that itself ends in `s` keeps it.
pub fn resolve_owner<'a>(
    matched: &'a str,
    owners: &HashMap<String, usize>,
) -> Option<(usize, &'a str)> {
    if let Some(&owner) = owners.get(&normalize_text(matched)) {
        return Some((owner, ""));
    }
    for suffix in POSSESSIVE_SUFFIXES {
        if let Some(base) = matched.strip_suffix(suffix) {
            if let Some(&owner) = owners.get(&normalize_text(base)) {
                return Some((owner, &matched[base.len()..]));
            }
        }
    }
    None
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `text[start..end]` would be matched by a [`LiteralMatcher`]
///
/// A word-character edge must not touch another word character.
pub(crate) fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let inner = &text[start..end];
    let head_ok = match (inner.chars().next(), text[..start].chars().next_back()) {
        (Some(first), Some(before)) => !(is_word_char(first) && is_word_char(before)),
        _ => true,
    };
    let tail_ok = match (inner.chars().next_back(), text[end..].chars().next()) {
        (Some(last), Some(after)) => !(is_word_char(last) && is_word_char(after)),
        _ => true,
    };
    head_ok && tail_ok
}
