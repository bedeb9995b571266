//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output
//! - JSON-formatted local log files with rotation
//! - Run and phase macros that never carry document text
//!
//! # Example
//!
//! ```no_run
//! use clinanon::logging::init_logging;
//! use clinanon::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an anonymization run
///
/// # Example
///
/// ```no_run
/// use clinanon::log_run_start;
///
/// let session_id = "a0b1";
/// log_run_start!(session_id, 12_000);
/// ```
#[macro_export]
macro_rules! log_run_start {
    ($session_id:expr, $length:expr) => {
        tracing::info!(
            session_id = %$session_id,
            document_units = $length,
            "Starting anonymization run"
        );
    };
}

/// Log an orchestrator phase transition
///
/// # Example
///
/// ```no_run
/// use clinanon::log_phase;
///
/// log_phase!("Deduplication", 17);
/// ```
#[macro_export]
macro_rules! log_phase {
    ($phase:expr, $count:expr) => {
        tracing::debug!(
            phase = %$phase,
            candidates = $count,
            "Phase complete"
        );
    };
}

/// Log the completion of an anonymization run
///
/// # Example
///
/// ```no_run
/// use clinanon::log_run_complete;
/// use std::time::Duration;
///
/// log_run_complete!(42, Duration::from_millis(120));
/// ```
#[macro_export]
macro_rules! log_run_complete {
    ($entities:expr, $duration:expr) => {
        tracing::info!(
            entities = $entities,
            duration_ms = $duration.as_millis() as u64,
            "Anonymization run completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use clinanon::log_error_with_context;
/// use clinanon::domain::AnonError;
///
/// let error = AnonError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
