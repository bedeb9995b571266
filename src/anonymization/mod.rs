//! Anonymization of free-text clinical notes
//!
//! This module finds identifying spans in a note, replaces them with
//! stable type-coded placeholders and can restore the original text from
//! the resulting ledger.
//!
//! # Architecture
//!
//! The pipeline consists of:
//! - **Chunking**: overlapping windows over long documents
//! - **Recognition**: an ordered ensemble of pattern and name recognizers
//! - **Orchestration**: parallel per-chunk recognition, then merge, rescan
//!   and optional deep scan over the whole document
//! - **Mapping**: per-session `[TYPE_X]` codes
//! - **Replacement**: one combined matcher, rewritten right to left
//! - **Reidentification**: ledger-driven restore with overrides
//! - **Audit**: structured logging with hashed PII values
//!
//! # Usage
//!
//! ```rust,ignore
//! use clinanon::anonymization::{AnonymizationEngine, AnonymizationSession, AnonymizationConfig};
//!
//! let engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//! let mut session = AnonymizationSession::new();
//! let result = engine.anonymize(&mut session, note).await?;
//! let original = engine.restore(&result.text, &result.ledger, &Default::default())?;
//! ```

pub mod audit;
pub mod chunker;
pub mod config;
pub mod dictionary;
pub mod engine;
pub mod mapper;
pub mod matcher;
pub mod models;
pub mod offsets;
pub mod orchestrator;
pub mod recognizer;
pub mod reidentifier;
pub mod replacer;
pub mod report;

// Re-export main types
pub use config::AnonymizationConfig;
pub use engine::{AnonymizationEngine, AnonymizationSession};
pub use mapper::EntityMapping;
pub use models::{AnonymizedDocument, Entity, EntityType, LedgerFile, PiiFinding, Span};
pub use report::AnonymizationReport;
