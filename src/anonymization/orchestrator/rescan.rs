//! Full-document occurrence rescan for person names
//!
//! Per-chunk recognizers only see a name where their context rule fires.
//! Once the entity set is known, every person string (and the components
//! of multi-word names) is matched across the whole document in one pass,
//! so headings, repeated mentions and possessive forms are all captured.

use super::merge::{deduplicate, resolve_cross_entity_overlaps};
use crate::anonymization::dictionary::is_common_word;
use crate::anonymization::matcher::{resolve_owner, Literal, LiteralMatcher};
use crate::anonymization::models::{normalize_text, Entity, Span};
use crate::anonymization::offsets::Utf16Map;
use crate::anonymization::recognizer::names::is_title;
use crate::domain::{AnonError, Result};
use std::collections::{HashMap, HashSet};

/// Shortest name component matched on its own
const MIN_COMPONENT_CHARS: usize = 3;

/// Strip a trailing `'s` / `’s` from a name
pub(crate) fn strip_possessive(text: &str) -> Option<&str> {
    let stripped = text
        .strip_suffix("'s")
        .or_else(|| text.strip_suffix("’s"))?
        .trim_end();
    (!stripped.is_empty()).then_some(stripped)
}

/// Normalize possessive person texts to their base name
fn normalize_possessives(entities: Vec<Entity>) -> Vec<Entity> {
    let mut changed = false;
    let entities: Vec<Entity> = entities
        .into_iter()
        .map(|mut entity| {
            if !entity.is_person() {
                return entity;
            }
            if let Some(base) = strip_possessive(&entity.original_text) {
                let base = base.to_string();
                let base_len = base.encode_utf16().count();
                entity.positions = entity
                    .positions
                    .iter()
                    .map(|s| Span::new(s.start, s.start + base_len))
                    .collect();
                entity.original_text = base;
                changed = true;
            }
            entity
        })
        .collect();

    if changed {
        deduplicate(entities)
    } else {
        entities
    }
}

/// Rescan the document for every known person string
///
/// Components of multi-word names become entities of the parent's type
/// unless they are short, titles, common words or excluded. Matches are
/// added to the owning entity's positions; a matched possessive suffix is
/// not part of the position. Finally overlapping spans across entities are
/// resolved in favour of the longer one.
///
/// Fails with [`AnonError::ReplacementVerificationFailure`] when the name
/// matcher cannot be built, since a partial rescan would leave occurrences
/// unreplaced.
pub fn rescan_occurrences(
    entities: Vec<Entity>,
    document: &str,
    map: &Utf16Map,
    exclusions: &HashSet<String>,
    size_limit: usize,
) -> Result<Vec<Entity>> {
    let mut entities = normalize_possessives(entities);

    let mut owners: HashMap<String, usize> = HashMap::new();
    let mut literals: Vec<String> = Vec::new();

    for i in 0..entities.len() {
        if !entities[i].is_person() {
            continue;
        }
        let key = entities[i].normalized_text();
        if !owners.contains_key(&key) {
            owners.insert(key, i);
            literals.push(entities[i].original_text.trim().to_string());
        }
    }

    let mut parents: Vec<usize> = owners
        .values()
        .copied()
        .filter(|&i| entities[i].original_text.split_whitespace().count() > 1)
        .collect();
    parents.sort_unstable();

    for parent in parents {
        let tokens: Vec<String> = entities[parent]
            .original_text
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .collect();

        for token in tokens {
            let key = normalize_text(&token);
            if token.chars().count() < MIN_COMPONENT_CHARS
                || is_title(&token)
                || is_common_word(&token)
                || exclusions.contains(&key)
                || owners.contains_key(&key)
            {
                continue;
            }

            let component = Entity::new(token.clone(), entities[parent].entity_type)
                .with_confidence(entities[parent].confidence)
                .with_source("rescan_component");
            owners.insert(key, entities.len());
            literals.push(token);
            entities.push(component);
        }
    }

    if literals.is_empty() {
        return Ok(entities);
    }

    let matcher = {
        let patterns: Vec<Literal<'_>> = literals
            .iter()
            .map(|text| Literal {
                text: text.as_str(),
                possessive: true,
            })
            .collect();
        LiteralMatcher::build(&patterns, size_limit).map_err(|e| {
            AnonError::ReplacementVerificationFailure(format!(
                "occurrence rescan over {} names: {e}",
                literals.len()
            ))
        })?
    };

    let mut found: HashMap<usize, Vec<Span>> = HashMap::new();
    for matched in matcher.find_iter(document) {
        let Some((owner, suffix)) = resolve_owner(matched.as_str(), &owners) else {
            continue;
        };
        let end = matched.end() - suffix.len();
        found
            .entry(owner)
            .or_default()
            .push(Span::new(map.to_units(matched.start()), map.to_units(end)));
    }

    for (owner, spans) in found {
        entities[owner].merge_positions(spans);
    }

    let entities: Vec<Entity> = entities
        .into_iter()
        .filter(|e| !e.positions.is_empty())
        .collect();

    Ok(resolve_cross_entity_overlaps(entities))
}
