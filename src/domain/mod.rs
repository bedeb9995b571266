//! Domain types shared across the crate.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Error taxonomy** ([`AnonError`])
//! - **Result type alias** ([`Result`])
//! - **Strongly-typed identifiers** ([`EntityId`])
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T, AnonError>`]:
//!
//! ```rust
//! use clinanon::domain::{AnonError, Result};
//!
//! fn reject_blank(document: &str) -> Result<()> {
//!     if document.trim().is_empty() {
//!         return Err(AnonError::EmptyInput);
//!     }
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::AnonError;
pub use ids::EntityId;
pub use result::Result;
