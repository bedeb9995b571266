// clinanon - Reversible anonymization for clinical notes
// Copyright (c) 2025 clinanon Contributors
// Licensed under the MIT License

//! # clinanon - Reversible anonymization for clinical notes
//!
//! clinanon replaces identifying details in free-text clinical notes
//! (names, places, dates, phone numbers, NHI and other identifiers) with
//! stable type-coded placeholders such as `[CLIENT_A]` or `[DATE_B]`, and
//! restores the original text from the ledger it produces.
//!
//! ## Overview
//!
//! This library provides:
//! - **Detecting** identifiers with an ordered ensemble of recognizers run
//!   in parallel over overlapping chunks
//! - **Coding** each distinct value once per session
//! - **Rewriting** every occurrence, including case variants and possessives
//! - **Restoring** the original text, optionally with per-code overrides
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`anonymization`] - Recognizers, orchestrator, mapper, replacer and reidentifier
//! - [`domain`] - Error type and identifiers
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clinanon::anonymization::{AnonymizationConfig, AnonymizationEngine, AnonymizationSession};
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//!     let mut session = AnonymizationSession::new();
//!
//!     let result = engine
//!         .anonymize(&mut session, "Client: Aroha Ngata. Seen by Dr Smith.")
//!         .await?;
//!     println!("{}", result.text);
//!
//!     let restored = engine.restore(&result.text, &result.ledger, &HashMap::new())?;
//!     assert_eq!(restored, "Client: Aroha Ngata. Seen by Dr Smith.");
//!     Ok(())
//! }
//! ```
//!
//! ## Positions
//!
//! All spans are reported in UTF-16 code units so they line up with
//! editors and front ends that index strings that way.
//!
//! ## Error Handling
//!
//! Library operations return [`domain::AnonError`]; configuration and
//! start-up paths use `anyhow` with context.

pub mod anonymization;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
