//! Catch-all numeric recognizer

use super::Recognizer;
use crate::anonymization::models::{Entity, EntityType};
use crate::anonymization::offsets::Utf16Map;
use crate::domain::Result;
use anyhow::Context;
use regex::Regex;

/// Flags any run of two or more digits, optionally joined by `-`, `/` or `.`
///
/// Only registered when `enable_catch_all_numeric` is set. Low confidence,
/// so any more specific recognizer wins an overlap.
pub struct CatchAllNumericRecognizer {
    regex: Regex,
}

impl CatchAllNumericRecognizer {
    /// Compile the recognizer
    pub fn new() -> anyhow::Result<Self> {
        let regex = Regex::new(r"\b\d[\d\-/.]*\d\b").context("Failed to compile numeric pattern")?;
        Ok(Self { regex })
    }
}

impl Recognizer for CatchAllNumericRecognizer {
    fn name(&self) -> &str {
        "catch_all_numeric"
    }

    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let map = Utf16Map::new(text);
        let entities = self
            .regex
            .find_iter(text)
            .map(|m| {
                Entity::with_span(
                    m.as_str(),
                    EntityType::NumericAll,
                    map.to_units(m.start()),
                    map.to_units(m.end()),
                )
                .with_confidence(Some(0.5))
                .with_source("catch_all_numeric")
            })
            .collect();
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_runs() {
        let recognizer = CatchAllNumericRecognizer::new().unwrap();
        let entities = recognizer
            .recognize("Room 12, dose 2.5mg, ref 44-12/7, 7 days")
            .unwrap();
        let texts: Vec<_> = entities.iter().map(|e| e.original_text.as_str()).collect();
        assert_eq!(texts, vec!["12", "44-12/7"]);
    }
}
