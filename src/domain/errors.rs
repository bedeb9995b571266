//! Domain error types
//!
//! This module defines the error hierarchy for the anonymization pipeline.
//! Only a handful of variants ever reach a caller: empty input, cancellation
//! and a replacement matcher that cannot be built. Everything else is logged
//! and filtered by the phase that produced it.

use thiserror::Error;

/// Main error type
///
/// This is the primary error type used throughout the library.
#[derive(Debug, Error)]
pub enum AnonError {
    /// Document is empty or whitespace-only
    #[error("Input document is empty")]
    EmptyInput,

    /// A single recognizer pattern failed to compile
    #[error("Invalid recognizer pattern '{name}' ({pattern}): {reason}")]
    RecognizerPatternInvalid {
        /// Pattern group name
        name: String,
        /// Offending regex source
        pattern: String,
        /// Compiler message
        reason: String,
    },

    /// Position out of bounds or non-increasing
    #[error("Invalid entity span [{start}, {end}) for document of length {len}")]
    InvalidEntitySpan {
        /// Span start (UTF-16 units)
        start: usize,
        /// Span end (UTF-16 units)
        end: usize,
        /// Document length (UTF-16 units)
        len: usize,
    },

    /// The combined replacement matcher could not be built
    #[error("Replacement verification failed: {0}")]
    ReplacementVerificationFailure(String),

    /// The run was cancelled between phases
    #[error("Anonymization run was cancelled")]
    Cancelled,

    /// External detector failed
    #[error("Detector error: {0}")]
    Detector(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Worker task panicked or was aborted
    #[error("Worker error: {0}")]
    Worker(String),
}

impl AnonError {
    /// Whether this error must abort the whole anonymization call
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::Cancelled | Self::ReplacementVerificationFailure(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for AnonError {
    fn from(err: std::io::Error) -> Self {
        AnonError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for AnonError {
    fn from(err: serde_json::Error) -> Self {
        AnonError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for AnonError {
    fn from(err: toml::de::Error) -> Self {
        AnonError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<tokio::task::JoinError> for AnonError {
    fn from(err: tokio::task::JoinError) -> Self {
        AnonError::Worker(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnonError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");

        let err = AnonError::InvalidEntitySpan {
            start: 10,
            end: 4,
            len: 20,
        };
        assert_eq!(
            err.to_string(),
            "Invalid entity span [10, 4) for document of length 20"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AnonError::EmptyInput.is_fatal());
        assert!(AnonError::Cancelled.is_fatal());
        assert!(AnonError::ReplacementVerificationFailure("x".into()).is_fatal());
        assert!(!AnonError::Detector("timeout".into()).is_fatal());
        assert!(!AnonError::RecognizerPatternInvalid {
            name: "nhi".into(),
            pattern: "[".into(),
            reason: "unclosed class".into(),
        }
        .is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: AnonError = io_err.into();
        assert!(matches!(err, AnonError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: AnonError = json_err.into();
        assert!(matches!(err, AnonError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: AnonError = toml_err.into();
        assert!(matches!(err, AnonError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
