//! Pattern library for PII recognition

use crate::anonymization::models::EntityType;
use crate::domain::AnonError;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Regex patterns for this group
    pub patterns: Vec<String>,
    /// Confidence score (0.0 - 1.0); omitted for deterministic formats
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Entity type label
    pub category: String,
    /// Capture group whose span becomes the entity
    #[serde(default)]
    pub capture_group: usize,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Pattern group name
    pub name: String,
    /// Compiled regex
    pub regex: Regex,
    /// Entity type
    pub entity_type: EntityType,
    /// Confidence score
    pub confidence: Option<f32>,
    /// Capture group index
    pub capture_group: usize,
}

/// Pattern library container
#[derive(Debug, Deserialize)]
struct PatternLibrary {
    patterns: BTreeMap<String, PatternDefinition>,
}

/// Pattern registry for PII recognition
///
/// A pattern that fails to compile, or names an unknown category, is
/// skipped and recorded in [`PatternRegistry::invalid`]; only a library
/// that is not valid TOML fails to load.
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
    patterns_by_type: HashMap<EntityType, Vec<CompiledPattern>>,
    invalid: Vec<AnonError>,
}

impl PatternRegistry {
    /// Create a new pattern registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read pattern library: {}",
                path.as_ref().display()
            )
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary =
            toml::from_str(content).context("Failed to parse pattern library TOML")?;

        let mut patterns = Vec::new();
        let mut patterns_by_type: HashMap<EntityType, Vec<CompiledPattern>> = HashMap::new();
        let mut invalid = Vec::new();

        for (name, def) in library.patterns {
            let Some(entity_type) = EntityType::parse(&def.category) else {
                let error = AnonError::RecognizerPatternInvalid {
                    name: name.clone(),
                    pattern: def.patterns.join(" | "),
                    reason: format!("unknown category '{}'", def.category),
                };
                tracing::warn!(pattern = %name, error = %error, "Skipping pattern group");
                invalid.push(error);
                continue;
            };

            for pattern_str in &def.patterns {
                let regex = match Regex::new(pattern_str) {
                    Ok(regex) => regex,
                    Err(e) => {
                        let error = AnonError::RecognizerPatternInvalid {
                            name: name.clone(),
                            pattern: pattern_str.clone(),
                            reason: e.to_string(),
                        };
                        tracing::warn!(pattern = %name, error = %error, "Skipping invalid pattern");
                        invalid.push(error);
                        continue;
                    }
                };

                if def.capture_group > regex.captures_len().saturating_sub(1) {
                    let error = AnonError::RecognizerPatternInvalid {
                        name: name.clone(),
                        pattern: pattern_str.clone(),
                        reason: format!("capture group {} does not exist", def.capture_group),
                    };
                    tracing::warn!(pattern = %name, error = %error, "Skipping invalid pattern");
                    invalid.push(error);
                    continue;
                }

                let compiled = CompiledPattern {
                    name: name.clone(),
                    regex,
                    entity_type,
                    confidence: def.confidence.map(|c| c.clamp(0.0, 1.0)),
                    capture_group: def.capture_group,
                };

                patterns.push(compiled.clone());
                patterns_by_type
                    .entry(entity_type)
                    .or_default()
                    .push(compiled);
            }
        }

        Ok(Self {
            patterns,
            patterns_by_type,
            invalid,
        })
    }

    /// Create a default pattern registry with built-in patterns
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../../patterns/pii_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Get all patterns
    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Get patterns for a specific entity type
    pub fn patterns_for_type(&self, entity_type: EntityType) -> Option<&[CompiledPattern]> {
        self.patterns_by_type
            .get(&entity_type)
            .map(|v| v.as_slice())
    }

    /// Patterns that were skipped while loading
    pub fn invalid(&self) -> &[AnonError] {
        &self.invalid
    }
}
