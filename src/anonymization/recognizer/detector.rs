//! External detector boundary
//!
//! Model-backed detectors (transformer NER, local or remote LLMs) live
//! outside this crate. They plug in through the [`Detector`] trait using
//! explicit request/response types; nothing here inspects untyped JSON
//! maps.

use super::Recognizer;
use crate::anonymization::matcher::is_word_bounded;
use crate::anonymization::models::{Entity, EntityType, Span};
use crate::anonymization::offsets::Utf16Map;
use crate::domain::{AnonError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Labels requested from a zero-shot tagger by default
pub const DEFAULT_LABELS: &[&str] = &[
    "person",
    "organization",
    "phone number",
    "email",
    "address",
    "date of birth",
    "social security number",
    "credit card number",
    "bank account number",
    "passport number",
    "driver license number",
    "health insurance id",
    "medical record number",
    "ip address",
    "url",
    "username",
    "password",
];

/// Request sent to a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorRequest {
    /// Text to scan
    pub text: String,
    /// Entity labels to look for
    pub labels: Vec<String>,
    /// Minimum confidence to report
    pub threshold: f32,
}

impl DetectorRequest {
    /// Request with the default label set
    pub fn new(text: impl Into<String>, threshold: f32) -> Self {
        Self {
            text: text.into(),
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            threshold,
        }
    }
}

/// One entity reported by a detector
///
/// Spans are optional. When present they are checked against the text and
/// re-located by search if they do not line up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorEntity {
    /// Matched text
    pub text: String,
    /// Detector label (`person`, `phone number`, ...)
    pub label: String,
    /// Start offset (UTF-16 units)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    /// End offset (UTF-16 units)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    /// Confidence score
    #[serde(default, alias = "score", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Response returned by a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetectorResponse {
    /// Successful scan
    Entities(Vec<DetectorEntity>),
    /// Detector-side failure
    Error {
        /// Error message
        error: String,
    },
}

impl DetectorResponse {
    /// Parse a JSON response
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert into the entity list, surfacing a detector-side error
    pub fn into_result(self) -> Result<Vec<DetectorEntity>> {
        match self {
            Self::Entities(entities) => Ok(entities),
            Self::Error { error } => Err(AnonError::Detector(error)),
        }
    }
}

/// Map a detector label to an entity type
///
/// Unknown labels are ignored by the caller.
pub fn map_label(label: &str) -> Option<EntityType> {
    match label.trim().to_lowercase().as_str() {
        "person" | "per" | "name" => Some(EntityType::PersonOther),
        "organization" | "organisation" | "org" => Some(EntityType::Organization),
        "phone number" | "email" | "url" => Some(EntityType::Contact),
        "address" | "location" | "loc" | "gpe" => Some(EntityType::Location),
        "date of birth" | "date" => Some(EntityType::Date),
        "social security number"
        | "credit card number"
        | "bank account number"
        | "passport number"
        | "driver license number"
        | "health insurance id"
        | "medical record number"
        | "ip address"
        | "username"
        | "password" => Some(EntityType::Identifier),
        _ => None,
    }
}

/// Capability implemented by any external entity detector
pub trait Detector: Send + Sync {
    /// Detector name, used in logs and provenance
    fn name(&self) -> &str {
        "detector"
    }

    /// Scan `request.text` and report entities
    fn detect(&self, request: &DetectorRequest) -> Result<Vec<DetectorEntity>>;
}

/// Detector that replays a previously captured response
///
/// Reported spans are discarded since they refer to whatever text the
/// response was produced for; entities are re-located by search in each
/// scanned text.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedDetector {
    entities: Vec<DetectorEntity>,
}

impl PrecomputedDetector {
    /// Wrap a list of entities
    pub fn new(entities: Vec<DetectorEntity>) -> Self {
        let entities = entities
            .into_iter()
            .map(|mut e| {
                e.start = None;
                e.end = None;
                e
            })
            .collect();
        Self { entities }
    }

    /// Build from a JSON response; an `{"error": ..}` response is an error
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(DetectorResponse::from_json(json)?.into_result()?))
    }
}

impl Detector for PrecomputedDetector {
    fn name(&self) -> &str {
        "precomputed"
    }

    fn detect(&self, request: &DetectorRequest) -> Result<Vec<DetectorEntity>> {
        Ok(self
            .entities
            .iter()
            .filter(|e| e.confidence.unwrap_or(1.0) >= request.threshold)
            .filter(|e| request.text.contains(e.text.as_str()))
            .cloned()
            .collect())
    }
}

/// Resolve detector-reported entity positions against `text`
///
/// A span that matches the entity text is trusted; otherwise every
/// occurrence of the text is used. Either way a position inside a longer
/// word is dropped, since the replacer never rewrites one.
pub(crate) fn locate(text: &str, map: &Utf16Map, entity: &DetectorEntity) -> Vec<Span> {
    let needle = entity.text.as_str();
    if needle.trim().is_empty() {
        return Vec::new();
    }

    if let (Some(start), Some(end)) = (entity.start, entity.end) {
        let span = Span::new(start, end);
        if span.is_valid_for(map.len_units()) {
            let (a, b) = (map.to_byte(start), map.to_byte(end));
            if map.to_units(a) == start
                && map.to_units(b) == end
                && &text[a..b] == needle
                && is_word_bounded(text, a, b)
            {
                return vec![span];
            }
        }
    }

    text.match_indices(needle)
        .filter(|(byte, m)| is_word_bounded(text, *byte, byte + m.len()))
        .map(|(byte, m)| Span::new(map.to_units(byte), map.to_units(byte + m.len())))
        .collect()
}

/// Adapter exposing a [`Detector`] as a [`Recognizer`]
pub struct DetectorRecognizer {
    detector: Arc<dyn Detector>,
    threshold: f32,
}

impl DetectorRecognizer {
    /// Wrap a detector with the default labels
    pub fn new(detector: Arc<dyn Detector>, threshold: f32) -> Self {
        Self { detector, threshold }
    }
}

impl Recognizer for DetectorRecognizer {
    fn name(&self) -> &str {
        self.detector.name()
    }

    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let request = DetectorRequest::new(text.to_string(), self.threshold);
        let reported = self.detector.detect(&request)?;
        let map = Utf16Map::new(text);

        let mut entities = Vec::new();
        for item in reported {
            let Some(entity_type) = map_label(&item.label) else {
                tracing::debug!(label = %item.label, "Ignoring unmapped detector label");
                continue;
            };
            if item.confidence.is_some_and(|c| c < self.threshold) {
                continue;
            }
            let positions = locate(text, &map, &item);
            if positions.is_empty() {
                continue;
            }

            let mut entity = Entity::new(item.text.clone(), entity_type)
                .with_confidence(item.confidence)
                .with_source(self.detector.name());
            entity.positions = positions;
            entities.push(entity);
        }
        Ok(entities)
    }
}
