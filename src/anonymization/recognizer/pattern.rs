//! Pattern-library recognizer

use super::patterns::PatternRegistry;
use super::Recognizer;
use crate::anonymization::models::Entity;
use crate::anonymization::offsets::Utf16Map;
use crate::domain::Result;
use std::sync::Arc;

/// Runs every compiled pattern of a [`PatternRegistry`] over the text
pub struct PatternRecognizer {
    registry: Arc<PatternRegistry>,
}

impl PatternRecognizer {
    /// Create a recognizer over the built-in pattern library
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self::with_registry(PatternRegistry::default_patterns()?))
    }

    /// Create a recognizer over a custom registry
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

impl Recognizer for PatternRecognizer {
    fn name(&self) -> &str {
        "pattern"
    }

    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let map = Utf16Map::new(text);
        let mut entities = Vec::new();

        for pattern in self.registry.all_patterns() {
            for captures in pattern.regex.captures_iter(text) {
                let Some(matched) = captures.get(pattern.capture_group) else {
                    continue;
                };
                if matched.as_str().trim().is_empty() {
                    continue;
                }

                entities.push(
                    Entity::with_span(
                        matched.as_str(),
                        pattern.entity_type,
                        map.to_units(matched.start()),
                        map.to_units(matched.end()),
                    )
                    .with_confidence(pattern.confidence)
                    .with_source(format!("pattern:{}", pattern.name)),
                );
            }
        }

        Ok(entities)
    }
}
