//! Main anonymization engine
//!
//! This module provides the [`AnonymizationEngine`] that runs detection,
//! code assignment, rewriting and audit logging for one document at a time.
//!
//! # Architecture
//!
//! The engine coordinates:
//! - **Orchestrator**: chunked parallel recognition and entity reconciliation
//! - **Session mapping**: stable per-session replacement codes
//! - **Replacer**: single-pass rewrite with leak repair
//! - **Audit Logger**: one hashed record per run
//!
//! Codes live in an [`AnonymizationSession`] owned by the caller, so one
//! engine can serve many independent sessions.
//!
//! # Examples
//!
//! ```no_run
//! use clinanon::anonymization::{AnonymizationEngine, AnonymizationSession};
//! use clinanon::anonymization::config::AnonymizationConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//! let mut session = AnonymizationSession::new();
//!
//! let result = engine
//!     .anonymize(&mut session, "Client: Aroha Ngata. Seen by Dr Smith.")
//!     .await?;
//! println!("{}", result.text);
//! # Ok(())
//! # }
//! ```

use crate::anonymization::{
    audit::AuditLogger,
    chunker::Chunker,
    config::AnonymizationConfig,
    dictionary::{SpellChecker, WordList},
    mapper::EntityMapping,
    models::{AnonymizedDocument, Entity, PiiFinding},
    offsets::utf16_len,
    orchestrator::{DeepScanner, EnsembleOrchestrator},
    recognizer::{Detector, RecognizerRegistry},
    reidentifier,
    replacer::Replacer,
};
use crate::domain::{AnonError, Result};
use crate::{log_run_complete, log_run_start};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// One anonymization session
///
/// Holds the code ledger. Documents anonymized in the same session share
/// codes; sessions never share state.
#[derive(Debug, Clone)]
pub struct AnonymizationSession {
    id: String,
    mapping: EntityMapping,
    created_at: DateTime<Utc>,
}

impl AnonymizationSession {
    /// Start a new session
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mapping: EntityMapping::new(),
            created_at: Utc::now(),
        }
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the session started
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Code ledger
    pub fn mapping(&self) -> &EntityMapping {
        &self.mapping
    }

    /// Forget every code and start a fresh session id
    pub fn reset(&mut self) {
        self.mapping.reset();
        self.id = uuid::Uuid::new_v4().to_string();
        self.created_at = Utc::now();
    }
}

impl Default for AnonymizationSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Main anonymization engine
///
/// The engine is immutable after construction and can be shared across
/// tasks with `Arc`; all per-document state lives in the session.
pub struct AnonymizationEngine {
    config: AnonymizationConfig,
    orchestrator: EnsembleOrchestrator,
    deep_scanner: Arc<DeepScanner>,
    replacer: Replacer,
    audit_logger: Option<AuditLogger>,
}

impl AnonymizationEngine {
    /// Create an engine with the built-in recognizers
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - Pattern library or dictionary file cannot be loaded
    /// - Audit logger initialization fails
    pub fn new(config: AnonymizationConfig) -> anyhow::Result<Self> {
        Self::build(config, None)
    }

    /// Create an engine that also consults an external detector
    ///
    /// The detector is registered after the built-in recognizers and is
    /// re-run at the lower deep-scan threshold when the deep scan is on.
    pub fn with_detector(
        config: AnonymizationConfig,
        detector: Arc<dyn Detector>,
    ) -> anyhow::Result<Self> {
        Self::build(config, Some(detector))
    }

    fn build(config: AnonymizationConfig, detector: Option<Arc<dyn Detector>>) -> anyhow::Result<Self> {
        config
            .validate()
            .context("Invalid anonymization configuration")?;

        let mut words = WordList::embedded();
        if let Some(ref path) = config.dictionary_path {
            words.merge(WordList::from_file(path)?);
        }
        let spell: Arc<dyn SpellChecker> = Arc::new(words);

        let registry = RecognizerRegistry::from_config(&config, Arc::clone(&spell), detector.clone())?;
        let deep_scanner = Arc::new(DeepScanner::from_config(&config, spell, detector)?);

        let mut orchestrator =
            EnsembleOrchestrator::new(registry, Chunker::from_config(&config.chunking))
                .with_max_concurrency(config.pipeline.max_concurrency)
                .with_matcher_size_limit(config.pipeline.matcher_size_limit)
                .with_exclusions(&config.user_exclusion_words);
        if config.pipeline.deep_scan {
            orchestrator = orchestrator.with_deep_scan(Arc::clone(&deep_scanner));
        }

        let replacer = Replacer::new(config.date_redaction_policy)?
            .with_size_limit(config.pipeline.matcher_size_limit);

        let audit_logger = if config.audit.enabled {
            Some(AuditLogger::from_config(&config.audit)?)
        } else {
            None
        };

        tracing::debug!(
            recognizers = orchestrator.registry().len(),
            deep_scan = config.pipeline.deep_scan,
            dry_run = config.dry_run,
            "Anonymization engine ready"
        );

        Ok(Self {
            config,
            orchestrator,
            deep_scanner,
            replacer,
            audit_logger,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &AnonymizationConfig {
        &self.config
    }

    /// Anonymize one document within `session`
    pub async fn anonymize(
        &self,
        session: &mut AnonymizationSession,
        document: &str,
    ) -> Result<AnonymizedDocument> {
        let (_tx, rx) = watch::channel(false);
        self.anonymize_with_signal(session, document, rx).await
    }

    /// Anonymize one document, aborting if `cancel` flips to true
    ///
    /// # Behavior
    ///
    /// 1. Detects entities through the orchestrator
    /// 2. Assigns codes in order of first occurrence
    /// 3. If dry-run mode: returns the original text with the ledger
    /// 4. Otherwise rewrites the text and logs to audit
    ///
    /// A cancelled run leaves the session's mapping untouched.
    pub async fn anonymize_with_signal(
        &self,
        session: &mut AnonymizationSession,
        document: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<AnonymizedDocument> {
        let start = Instant::now();
        log_run_start!(session.id(), utf16_len(document));

        let detection = self.orchestrator.detect_with_signal(document, cancel).await?;

        let mut entities = detection.entities;
        entities.sort_by_key(|e| e.first_position());

        // Work on a copy so a failed rewrite leaves the session as it was
        let mut mapping = session.mapping.clone();
        for entity in &mut entities {
            entity.replacement_code =
                mapping.get_or_create_code(&entity.original_text, entity.entity_type);
        }

        let text = if self.config.dry_run {
            document.to_string()
        } else {
            let replacement = self.replacer.replace(document, &entities)?;
            for extended in replacement.extended {
                mapping.alias(&extended.original_text, &extended.replacement_code);
                entities.push(extended);
            }
            replacement.text
        };
        session.mapping = mapping;

        let elapsed = start.elapsed();
        let result = AnonymizedDocument::new(
            session.id().to_string(),
            text,
            entities,
            detection.findings,
            elapsed.as_millis() as u64,
        )
        .with_dry_run(self.config.dry_run)
        .with_date_policy(self.config.date_redaction_policy);

        if let Some(ref logger) = self.audit_logger {
            if let Err(e) = logger.log_anonymization(&result) {
                tracing::warn!(error = %e, "Failed to write audit entry");
            }
        }

        log_run_complete!(result.total_entities(), elapsed);
        Ok(result)
    }

    /// Deep-scan a document against entities already known
    ///
    /// Returns only findings not covered by `existing`.
    pub async fn deep_scan(&self, document: &str, existing: &[Entity]) -> Result<Vec<PiiFinding>> {
        if document.trim().is_empty() {
            return Err(AnonError::EmptyInput);
        }
        let scanner = Arc::clone(&self.deep_scanner);
        let document = document.to_string();
        let existing = existing.to_vec();
        let findings = tokio::task::spawn_blocking(move || scanner.scan(&document, &existing)).await?;
        Ok(findings)
    }

    /// Restore original text from an anonymized document's ledger
    ///
    /// Dates are read back under this engine's date policy. Use
    /// [`reidentifier::restore`] with [`LedgerFile::date_redaction_policy`]
    /// for a ledger written elsewhere.
    ///
    /// [`LedgerFile::date_redaction_policy`]: crate::anonymization::LedgerFile::date_redaction_policy
    pub fn restore(
        &self,
        anonymized: &str,
        ledger: &[Entity],
        overrides: &HashMap<String, String>,
    ) -> Result<String> {
        reidentifier::restore(anonymized, ledger, self.config.date_redaction_policy, overrides)
    }
}
