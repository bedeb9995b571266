//! Ensemble orchestration
//!
//! Runs the recognizer registry over every chunk in parallel, then
//! reconciles the results into one consistent entity set:
//!
//! `Idle → Chunking → ParallelRecognition → OverlapRemoval → Deduplication
//! → SurnameExtension → PositionValidation → FullTextOccurrenceRescan →
//! [DeepScan] → Done`
//!
//! Only recognition is parallel. Every later phase needs the whole document
//! and runs on a single thread. Cancellation is checked between phases and
//! before each chunk is dispatched.

pub mod deep_scan;
pub mod merge;
pub mod rescan;

use crate::anonymization::chunker::Chunker;
use crate::anonymization::matcher::DEFAULT_SIZE_LIMIT;
use crate::anonymization::models::{Entity, PiiFinding};
use crate::anonymization::offsets::Utf16Map;
use crate::anonymization::recognizer::RecognizerRegistry;
use crate::domain::{AnonError, Result};
use crate::log_phase;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

pub use deep_scan::DeepScanner;

/// Orchestrator phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Chunking,
    ParallelRecognition,
    OverlapRemoval,
    Deduplication,
    SurnameExtension,
    PositionValidation,
    FullTextOccurrenceRescan,
    DeepScan,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Chunking => "chunking",
            Self::ParallelRecognition => "parallel_recognition",
            Self::OverlapRemoval => "overlap_removal",
            Self::Deduplication => "deduplication",
            Self::SurnameExtension => "surname_extension",
            Self::PositionValidation => "position_validation",
            Self::FullTextOccurrenceRescan => "full_text_rescan",
            Self::DeepScan => "deep_scan",
            Self::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// Result of one detection run
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Final entity set, positions in document coordinates
    pub entities: Vec<Entity>,
    /// Deep-scan findings, empty unless the deep scan ran
    pub findings: Vec<PiiFinding>,
    /// Number of chunks processed
    pub chunks: usize,
}

/// Runs the recognizer ensemble and merges its output
pub struct EnsembleOrchestrator {
    registry: RecognizerRegistry,
    chunker: Chunker,
    max_concurrency: usize,
    exclusions: HashSet<String>,
    matcher_size_limit: usize,
    deep_scanner: Option<Arc<DeepScanner>>,
}

impl EnsembleOrchestrator {
    /// Create an orchestrator
    pub fn new(registry: RecognizerRegistry, chunker: Chunker) -> Self {
        Self {
            registry,
            chunker,
            max_concurrency: 4,
            exclusions: HashSet::new(),
            matcher_size_limit: DEFAULT_SIZE_LIMIT,
            deep_scanner: None,
        }
    }

    /// Bound the number of chunks recognized at once
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Words never treated as PII
    pub fn with_exclusions(mut self, words: &[String]) -> Self {
        self.exclusions = merge::exclusion_set(words);
        self
    }

    /// Cap the compiled size of the occurrence rescan matcher, in bytes
    pub fn with_matcher_size_limit(mut self, size_limit: usize) -> Self {
        self.matcher_size_limit = size_limit;
        self
    }

    /// Run the deep scan as the last phase
    pub fn with_deep_scan(mut self, scanner: Arc<DeepScanner>) -> Self {
        self.deep_scanner = Some(scanner);
        self
    }

    /// The registered recognizers
    pub fn registry(&self) -> &RecognizerRegistry {
        &self.registry
    }

    /// Detect entities without a cancellation signal
    pub async fn detect(&self, document: &str) -> Result<Detection> {
        let (_tx, rx) = watch::channel(false);
        self.detect_with_signal(document, rx).await
    }

    /// Detect entities, checking `cancel` between phases
    ///
    /// A cancelled run returns [`AnonError::Cancelled`] and discards every
    /// partial result.
    pub async fn detect_with_signal(
        &self,
        document: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<Detection> {
        if document.trim().is_empty() {
            return Err(AnonError::EmptyInput);
        }
        log_phase!(Phase::Idle, 0usize);
        check_cancelled(&cancel)?;

        let chunks = self.chunker.split(document);
        let chunk_count = chunks.len();
        log_phase!(Phase::Chunking, chunk_count);

        let candidates = self.recognize_chunks(chunks, &cancel).await?;
        log_phase!(Phase::ParallelRecognition, candidates.len());
        check_cancelled(&cancel)?;

        let map = Utf16Map::new(document);

        let entities = merge::remove_overlaps(merge::flatten(candidates));
        log_phase!(Phase::OverlapRemoval, entities.len());
        check_cancelled(&cancel)?;

        let entities = merge::deduplicate(entities);
        let entities = merge::apply_exclusions(entities, &self.exclusions);
        log_phase!(Phase::Deduplication, entities.len());
        check_cancelled(&cancel)?;

        let entities = merge::extend_surnames(entities, document, &map);
        log_phase!(Phase::SurnameExtension, entities.len());
        check_cancelled(&cancel)?;

        let entities = merge::validate_positions(entities, map.len_units());
        log_phase!(Phase::PositionValidation, entities.len());
        check_cancelled(&cancel)?;

        let entities = rescan::rescan_occurrences(
            entities,
            document,
            &map,
            &self.exclusions,
            self.matcher_size_limit,
        )?;
        let entities = merge::validate_positions(entities, map.len_units());
        log_phase!(Phase::FullTextOccurrenceRescan, entities.len());
        check_cancelled(&cancel)?;

        let findings = match &self.deep_scanner {
            Some(scanner) => {
                let findings = self.run_deep_scan(scanner, document, &entities).await?;
                log_phase!(Phase::DeepScan, findings.len());
                check_cancelled(&cancel)?;
                findings
            }
            None => Vec::new(),
        };

        log_phase!(Phase::Done, entities.len());
        Ok(Detection {
            entities,
            findings,
            chunks: chunk_count,
        })
    }

    async fn run_deep_scan(
        &self,
        scanner: &Arc<DeepScanner>,
        document: &str,
        existing: &[Entity],
    ) -> Result<Vec<PiiFinding>> {
        let scanner = Arc::clone(scanner);
        let document = document.to_string();
        let existing = existing.to_vec();
        let findings =
            tokio::task::spawn_blocking(move || scanner.scan(&document, &existing)).await?;
        Ok(findings)
    }

    /// Fan out one blocking task per chunk, bounded by a semaphore
    async fn recognize_chunks(
        &self,
        chunks: Vec<crate::anonymization::models::ChunkInfo>,
        cancel: &watch::Receiver<bool>,
    ) -> Result<Vec<Entity>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for chunk in chunks {
            if *cancel.borrow() {
                tasks.abort_all();
                return Err(AnonError::Cancelled);
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| AnonError::Worker(e.to_string()))?;
            let registry = self.registry.clone();

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let found = registry.recognize_all(&chunk.text);
                let adjusted = chunk.adjust_entities(found);
                tracing::trace!(chunk = chunk.index, entities = adjusted.len(), "Chunk recognized");
                (chunk.index, adjusted)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            results.push(joined?);
        }
        results.sort_by_key(|(index, _)| *index);

        Ok(results.into_iter().flat_map(|(_, e)| e).collect())
    }
}

fn check_cancelled(cancel: &watch::Receiver<bool>) -> Result<()> {
    if *cancel.borrow() {
        tracing::info!("Anonymization run cancelled");
        return Err(AnonError::Cancelled);
    }
    Ok(())
}
