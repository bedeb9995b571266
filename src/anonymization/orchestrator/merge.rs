//! Candidate reconciliation
//!
//! Pure functions over entity lists, applied in order after the parallel
//! recognition barrier: overlap removal, deduplication, exclusions,
//! surname extension and position validation.

use crate::anonymization::dictionary::is_common_word;
use crate::anonymization::models::{normalize_text, Entity, EntityType, Span};
use crate::anonymization::offsets::Utf16Map;
use crate::anonymization::recognizer::names::is_title;
use crate::domain::AnonError;
use regex::Regex;
use std::cmp::{Ordering, Reverse};
use std::collections::{HashMap, HashSet};

/// Shortest normalized text kept by deduplication
const MIN_ENTITY_CHARS: usize = 2;

/// Split every entity into one candidate per position
pub fn flatten(entities: Vec<Entity>) -> Vec<Entity> {
    let mut candidates = Vec::with_capacity(entities.len());
    for entity in entities {
        if entity.positions.len() <= 1 {
            candidates.push(entity);
            continue;
        }
        for span in &entity.positions {
            let mut single = entity.clone();
            single.positions = vec![*span];
            candidates.push(single);
        }
    }
    candidates
}

/// Decide which of two overlapping candidates survives
///
/// Higher confidence wins; on a tie the longer text wins; otherwise the
/// incumbent stays.
fn prefer(incumbent: &Entity, challenger: &Entity) -> Ordering {
    incumbent
        .effective_confidence()
        .partial_cmp(&challenger.effective_confidence())
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            incumbent
                .original_text
                .chars()
                .count()
                .cmp(&challenger.original_text.chars().count())
        })
        .then(Ordering::Greater)
}

/// Remove candidates whose spans intersect
///
/// Candidates are sorted by start and swept left to right, always comparing
/// the currently kept candidate against the next one, so the rule applies
/// across a whole run of mutually overlapping spans. Expects one position
/// per candidate (see [`flatten`]).
pub fn remove_overlaps(candidates: Vec<Entity>) -> Vec<Entity> {
    let mut candidates: Vec<(Span, Entity)> = candidates
        .into_iter()
        .filter_map(|e| e.first_position().map(|span| (span, e)))
        .collect();
    candidates.sort_by_key(|(span, _)| (span.start, Reverse(span.end)));

    let mut kept: Vec<(Span, Entity)> = Vec::with_capacity(candidates.len());
    for (span, entity) in candidates {
        match kept.last_mut() {
            Some((last_span, last)) if last_span.overlaps(&span) => {
                if prefer(last, &entity) == Ordering::Less {
                    *last_span = span;
                    *last = entity;
                }
            }
            _ => kept.push((span, entity)),
        }
    }

    kept.into_iter().map(|(_, entity)| entity).collect()
}

/// Resolve the type of a merged group
fn merge_type(current: EntityType, incoming: EntityType) -> EntityType {
    if current == EntityType::Location && incoming.is_person() {
        incoming
    } else {
        current
    }
}

/// Merge candidates that share the same normalized text
///
/// Positions are unioned and the highest confidence kept (a deterministic
/// match outranks any score). The first-seen entity keeps its id and text.
pub fn deduplicate(entities: Vec<Entity>) -> Vec<Entity> {
    let mut merged: Vec<Entity> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entity in entities {
        let key = entity.normalized_text();
        if key.chars().count() < MIN_ENTITY_CHARS {
            continue;
        }

        match index.get(&key) {
            Some(&i) => {
                let existing = &mut merged[i];
                existing.entity_type = merge_type(existing.entity_type, entity.entity_type);
                existing.confidence = match (existing.confidence, entity.confidence) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    _ => None,
                };
                existing.merge_positions(entity.positions);
            }
            None => {
                index.insert(key, merged.len());
                let mut entity = entity;
                entity.merge_positions(Vec::new());
                merged.push(entity);
            }
        }
    }

    merged
}

/// Drop caller-excluded words and person candidates that are common words
/// or titles
pub fn apply_exclusions(entities: Vec<Entity>, exclusions: &HashSet<String>) -> Vec<Entity> {
    entities
        .into_iter()
        .filter(|entity| {
            let key = entity.normalized_text();
            if exclusions.contains(&key) {
                return false;
            }
            !(entity.is_person()
                && (is_common_word(&entity.original_text) || is_title(&entity.original_text)))
        })
        .collect()
}

/// Extend bare first names with a surname known from another entity
///
/// Surnames are the last tokens of multi-word person entities. A
/// single-word person is searched across the whole document as
/// `<word> <surname>`; when found, the entity takes the full name and its
/// positions become every occurrence of it. Groups are re-deduplicated
/// afterwards.
pub fn extend_surnames(entities: Vec<Entity>, document: &str, map: &Utf16Map) -> Vec<Entity> {
    let mut surnames: Vec<String> = entities
        .iter()
        .filter(|e| e.is_person())
        .filter_map(|e| {
            let tokens: Vec<&str> = e.original_text.split_whitespace().collect();
            (tokens.len() > 1).then(|| tokens[tokens.len() - 1].to_string())
        })
        .filter(|s| s.chars().count() >= MIN_ENTITY_CHARS)
        .collect();
    surnames.sort();
    surnames.dedup();

    if surnames.is_empty() {
        return entities;
    }

    let mut extended_any = false;
    let entities: Vec<Entity> = entities
        .into_iter()
        .map(|mut entity| {
            let word = entity.original_text.trim();
            if !entity.is_person() || word.contains(char::is_whitespace) {
                return entity;
            }

            for surname in &surnames {
                if surname.eq_ignore_ascii_case(word) {
                    continue;
                }
                let pattern = format!(
                    r"\b{}[ \t]+{}\b",
                    regex::escape(word),
                    regex::escape(surname)
                );
                let Ok(regex) = Regex::new(&pattern) else {
                    continue;
                };

                let positions: Vec<Span> = regex
                    .find_iter(document)
                    .map(|m| Span::new(map.to_units(m.start()), map.to_units(m.end())))
                    .collect();
                if let Some(first) = regex.find(document) {
                    entity.original_text = first.as_str().to_string();
                    entity.positions = positions;
                    extended_any = true;
                    break;
                }
            }
            entity
        })
        .collect();

    if extended_any {
        deduplicate(entities)
    } else {
        entities
    }
}

/// Drop out-of-bounds or inverted positions, and same-entity overlaps
///
/// An entity is dropped only when no valid position remains.
pub fn validate_positions(entities: Vec<Entity>, len: usize) -> Vec<Entity> {
    entities
        .into_iter()
        .filter_map(|mut entity| {
            let (valid, invalid): (Vec<Span>, Vec<Span>) = entity
                .positions
                .iter()
                .partition(|span| span.is_valid_for(len));

            for span in invalid {
                let error = AnonError::InvalidEntitySpan {
                    start: span.start,
                    end: span.end,
                    len,
                };
                tracing::warn!(
                    entity_type = %entity.entity_type,
                    source = %entity.source,
                    error = %error,
                    "Dropping invalid position"
                );
            }

            entity.positions = Vec::new();
            entity.merge_positions(valid);
            (!entity.positions.is_empty()).then_some(entity)
        })
        .collect()
}

/// Keep at most one entity per stretch of text
///
/// All positions across all entities are swept left to right; when two
/// spans overlap the longer one stays (the earlier on a tie). Entities left
/// without positions are dropped.
pub fn resolve_cross_entity_overlaps(entities: Vec<Entity>) -> Vec<Entity> {
    let mut spans: Vec<(Span, usize)> = entities
        .iter()
        .enumerate()
        .flat_map(|(i, e)| e.positions.iter().map(move |s| (*s, i)))
        .collect();
    spans.sort_by_key(|(span, _)| (span.start, Reverse(span.end)));

    let mut kept: Vec<(Span, usize)> = Vec::with_capacity(spans.len());
    for (span, owner) in spans {
        match kept.last_mut() {
            Some((last, last_owner)) if last.overlaps(&span) => {
                if span.len() > last.len() {
                    *last = span;
                    *last_owner = owner;
                }
            }
            _ => kept.push((span, owner)),
        }
    }

    let mut by_owner: HashMap<usize, Vec<Span>> = HashMap::new();
    for (span, owner) in kept {
        by_owner.entry(owner).or_default().push(span);
    }

    entities
        .into_iter()
        .enumerate()
        .filter_map(|(i, mut entity)| {
            let positions = by_owner.remove(&i)?;
            entity.positions = positions;
            Some(entity)
        })
        .collect()
}

/// Normalized exclusion set
pub fn exclusion_set(words: &[String]) -> HashSet<String> {
    words
        .iter()
        .map(|w| normalize_text(w))
        .filter(|w| !w.is_empty())
        .collect()
}
