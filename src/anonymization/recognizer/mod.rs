//! Recognizer ensemble
//!
//! A recognizer is one independent detection strategy. It sees a single
//! chunk of text and returns entities with chunk-local UTF-16 positions.
//! Recognizers never call each other; the orchestrator runs the whole
//! registry per chunk and reconciles their output.

pub mod detector;
pub mod names;
pub mod numeric;
pub mod pattern;
pub mod patterns;
pub mod user_list;

use crate::anonymization::config::AnonymizationConfig;
use crate::anonymization::dictionary::SpellChecker;
use crate::anonymization::models::Entity;
use crate::domain::Result;
use anyhow::Context;
use std::sync::Arc;

pub use detector::{
    Detector, DetectorEntity, DetectorRecognizer, DetectorRequest, DetectorResponse,
    PrecomputedDetector,
};
pub use names::{
    LabelledNameRecognizer, MaoriNameRecognizer, RelationshipNameRecognizer, TitledNameRecognizer,
};
pub use numeric::CatchAllNumericRecognizer;
pub use pattern::PatternRecognizer;
pub use patterns::PatternRegistry;
pub use user_list::UserListRecognizer;

/// Trait for PII recognizer implementations
pub trait Recognizer: Send + Sync {
    /// Recognizer name, used in logs and provenance
    fn name(&self) -> &str;

    /// Recognize entities in one chunk; positions are chunk-local
    fn recognize(&self, text: &str) -> Result<Vec<Entity>>;
}

/// Ordered set of recognizers
///
/// Registration order only affects which of two equal candidates is seen
/// first during deduplication.
#[derive(Clone, Default)]
pub struct RecognizerRegistry {
    recognizers: Vec<Arc<dyn Recognizer>>,
}

impl RecognizerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the default recognizer set for a configuration
    ///
    /// The catch-all numeric recognizer is only registered when enabled.
    /// An external detector, if given, is registered last.
    pub fn from_config(
        config: &AnonymizationConfig,
        spell: Arc<dyn SpellChecker>,
        detector: Option<Arc<dyn Detector>>,
    ) -> anyhow::Result<Self> {
        let patterns = match config.pattern_library {
            Some(ref path) => PatternRegistry::from_file(path)
                .with_context(|| format!("Failed to load pattern library {}", path.display()))?,
            None => PatternRegistry::default_patterns()?,
        };

        let mut registry = Self::new();
        registry.register(PatternRecognizer::with_registry(patterns));
        registry.register(TitledNameRecognizer::new()?);
        registry.register(LabelledNameRecognizer::new()?);
        registry.register(RelationshipNameRecognizer::new()?);
        registry.register(MaoriNameRecognizer::new(spell)?);

        let user_list = UserListRecognizer::new(&config.user_inclusion_words);
        if !user_list.is_empty() {
            registry.register(user_list);
        }

        if config.enable_catch_all_numeric {
            registry.register(CatchAllNumericRecognizer::new()?);
        }

        if let Some(detector) = detector {
            registry.register(DetectorRecognizer::new(
                detector,
                config.pipeline.detector_threshold,
            ));
        }

        tracing::debug!(recognizers = ?registry.names(), "Recognizer registry built");
        Ok(registry)
    }

    /// Append a recognizer
    pub fn register<R: Recognizer + 'static>(&mut self, recognizer: R) {
        self.recognizers.push(Arc::new(recognizer));
    }

    /// Recognizer names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.recognizers.iter().map(|r| r.name()).collect()
    }

    /// Number of registered recognizers
    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    /// Run every recognizer over `text`
    ///
    /// A failing recognizer is logged and skipped; the others still run.
    pub fn recognize_all(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        for recognizer in &self.recognizers {
            match recognizer.recognize(text) {
                Ok(found) => entities.extend(found),
                Err(e) => {
                    tracing::warn!(
                        recognizer = recognizer.name(),
                        error = %e,
                        "Recognizer failed, skipping its output"
                    );
                }
            }
        }
        entities
    }
}
