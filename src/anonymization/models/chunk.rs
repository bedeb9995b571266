//! Chunk processing unit

use super::entity::{Entity, Span};
use serde::{Deserialize, Serialize};

/// A bounded, possibly-overlapping window of the document
///
/// All offsets and counts are in UTF-16 code units. `text` includes the
/// leading and trailing overlap; the "content" region is the part between
/// them and belongs to this chunk alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    /// Zero-based position in the chunk sequence
    pub index: usize,
    /// Chunk text including overlap
    pub text: String,
    /// Start of `text` within the document
    pub global_offset: usize,
    /// Units of leading overlap
    pub overlap_before: usize,
    /// Units of trailing overlap
    pub overlap_after: usize,
    /// Length of `text` in UTF-16 units
    pub len: usize,
}

impl ChunkInfo {
    /// End of the content region, chunk-local
    pub fn content_end(&self) -> usize {
        self.len.saturating_sub(self.overlap_after)
    }

    /// Content region in document coordinates
    pub fn content_span(&self) -> Span {
        Span::new(
            self.global_offset + self.overlap_before,
            self.global_offset + self.content_end(),
        )
    }

    /// Map one chunk-local span to document coordinates
    ///
    /// Returns `None` when the span belongs to a neighbouring chunk's
    /// content: it ends inside the leading overlap, or starts at or after
    /// the trailing overlap.
    pub fn adjust_span(&self, span: Span) -> Option<Span> {
        if span.end <= self.overlap_before || span.start >= self.content_end() {
            return None;
        }
        Some(span.shifted(self.global_offset))
    }

    /// Map a list of chunk-local spans, dropping those owned by a neighbour
    pub fn adjust_positions(&self, positions: &[Span]) -> Vec<Span> {
        positions
            .iter()
            .filter_map(|span| self.adjust_span(*span))
            .collect()
    }

    /// Shift every entity's positions into document coordinates
    ///
    /// Entities left without any position are discarded.
    pub fn adjust_entities(&self, entities: Vec<Entity>) -> Vec<Entity> {
        entities
            .into_iter()
            .filter_map(|mut entity| {
                entity.positions = self.adjust_positions(&entity.positions);
                (!entity.positions.is_empty()).then_some(entity)
            })
            .collect()
    }
}
