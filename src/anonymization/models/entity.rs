//! PII entity data models

use crate::domain::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// The client/patient the note is about
    PersonClient,
    /// Clinicians, GPs, referrers
    PersonProvider,
    /// Any other named person (family, friends, colleagues)
    PersonOther,
    /// Calendar dates
    Date,
    /// Addresses, suburbs, cities, facilities
    Location,
    /// Organizations
    Organization,
    /// Medical/case/record identifiers
    Identifier,
    /// Phone numbers and e-mail addresses
    Contact,
    /// Catch-all numeric sequences
    NumericAll,
}

impl EntityType {
    /// Placeholder label used in replacement codes
    pub fn label(&self) -> &'static str {
        match self {
            Self::PersonClient => "CLIENT",
            Self::PersonProvider => "PROVIDER",
            Self::PersonOther => "PERSON",
            Self::Date => "DATE",
            Self::Location => "LOCATION",
            Self::Organization => "ORG",
            Self::Identifier => "ID",
            Self::Contact => "CONTACT",
            Self::NumericAll => "NUMBER",
        }
    }

    /// Check if this type names a person
    pub fn is_person(&self) -> bool {
        matches!(
            self,
            Self::PersonClient | Self::PersonProvider | Self::PersonOther
        )
    }

    /// Parse a type from a config/pattern-library string
    ///
    /// Accepts the snake_case serde names as well as the placeholder labels.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "person_client" | "client" => Some(Self::PersonClient),
            "person_provider" | "provider" => Some(Self::PersonProvider),
            "person_other" | "person" | "name" => Some(Self::PersonOther),
            "date" => Some(Self::Date),
            "location" | "address" => Some(Self::Location),
            "organization" | "organisation" | "org" => Some(Self::Organization),
            "identifier" | "id" => Some(Self::Identifier),
            "contact" | "phone" | "email" => Some(Self::Contact),
            "numeric_all" | "number" | "numeric" => Some(Self::NumericAll),
            _ => None,
        }
    }

    /// All types in declaration order
    pub fn all() -> [EntityType; 9] {
        [
            Self::PersonClient,
            Self::PersonProvider,
            Self::PersonOther,
            Self::Date,
            Self::Location,
            Self::Organization,
            Self::Identifier,
            Self::Contact,
            Self::NumericAll,
        ]
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Half-open `[start, end)` span in UTF-16 code units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start
    pub start: usize,
    /// Exclusive end
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in UTF-16 units
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True for zero-length or inverted spans
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check whether two spans share at least one unit
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check whether `other` lies entirely inside this span
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Shift by a global offset
    pub fn shifted(&self, offset: usize) -> Span {
        Span::new(self.start + offset, self.end + offset)
    }

    /// Valid for a document of `len` units
    pub fn is_valid_for(&self, len: usize) -> bool {
        self.start < self.end && self.end <= len
    }
}

/// Detected PII entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Opaque identifier, stable within a session
    pub id: EntityId,
    /// Exact text as found (case preserved)
    pub original_text: String,
    /// Placeholder code; empty until assigned by the mapper
    #[serde(default)]
    pub replacement_code: String,
    /// Entity type
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Ordered, non-overlapping positions in the original document
    #[serde(default)]
    pub positions: Vec<Span>,
    /// Confidence score (0.0 - 1.0); absent for deterministic patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Name of the recognizer that produced this entity
    #[serde(default, skip_serializing)]
    pub source: String,
}

impl Entity {
    /// Create a new entity without positions
    pub fn new(original_text: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id: EntityId::generate(),
            original_text: original_text.into(),
            replacement_code: String::new(),
            entity_type,
            positions: Vec::new(),
            confidence: None,
            source: String::new(),
        }
    }

    /// Create a new entity with one position
    pub fn with_span(
        original_text: impl Into<String>,
        entity_type: EntityType,
        start: usize,
        end: usize,
    ) -> Self {
        let mut entity = Self::new(original_text, entity_type);
        entity.positions.push(Span::new(start, end));
        entity
    }

    /// Set the confidence score
    pub fn with_confidence(mut self, confidence: Option<f32>) -> Self {
        self.confidence = confidence.map(|c| c.clamp(0.0, 1.0));
        self
    }

    /// Set the provenance
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Confidence used for comparisons; deterministic matches count as 1.0
    pub fn effective_confidence(&self) -> f32 {
        self.confidence.unwrap_or(1.0)
    }

    /// Case-insensitive, whitespace-trimmed lookup key
    pub fn normalized_text(&self) -> String {
        normalize_text(&self.original_text)
    }

    /// Check if this entity names a person
    pub fn is_person(&self) -> bool {
        self.entity_type.is_person()
    }

    /// First position, if any
    pub fn first_position(&self) -> Option<Span> {
        self.positions.first().copied()
    }

    /// Union another list of positions into this entity
    ///
    /// Keeps positions sorted and drops exact duplicates plus any span that
    /// overlaps one already kept.
    pub fn merge_positions(&mut self, others: impl IntoIterator<Item = Span>) {
        self.positions.extend(others);
        self.positions.sort();
        self.positions.dedup();

        let mut kept: Vec<Span> = Vec::with_capacity(self.positions.len());
        for span in self.positions.drain(..) {
            match kept.last() {
                Some(last) if last.overlaps(&span) => continue,
                _ => kept.push(span),
            }
        }
        self.positions = kept;
    }
}

/// Normalize entity text for ledger lookups: trim, lowercase, collapse
/// internal whitespace
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
