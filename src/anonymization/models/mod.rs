//! Data models for anonymization

pub mod chunk;
pub mod document;
pub mod entity;
pub mod finding;

pub use chunk::ChunkInfo;
pub use document::{AnonymizedDocument, LedgerFile};
pub use entity::{normalize_text, Entity, EntityType, Span};
pub use finding::PiiFinding;
