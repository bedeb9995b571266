//! Audit trail for anonymization runs
//!
//! One entry per run, carrying counts, codes and SHA-256 hashes of the
//! replaced values. Plaintext values never reach the audit file.

pub mod logger;

pub use logger::AuditLogger;
