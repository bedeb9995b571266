//! Text chunking with overlap
//!
//! Long notes are split into overlapping windows so the recognizer fan-out
//! can run per chunk. Content regions (chunk text minus its overlap) tile
//! the document exactly once; the overlap exists only so a recognizer can
//! see entities that straddle a cut.

use crate::anonymization::config::ChunkingConfig;
use crate::anonymization::models::ChunkInfo;
use crate::anonymization::offsets::Utf16Map;

/// Cut-point separators in preference order
const BOUNDARY_SEPARATORS: [&str; 3] = [". ", "\n\n", "\n"];

/// Splits documents into [`ChunkInfo`] windows
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
    boundary_window: usize,
}

impl Chunker {
    /// Create a chunker; sizes are in UTF-16 units
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            boundary_window: 500,
        }
    }

    /// Bound how far back from the ideal cut the boundary search looks
    pub fn with_boundary_window(mut self, window: usize) -> Self {
        self.boundary_window = window;
        self
    }

    /// Build from chunking configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.overlap)
            .with_boundary_window(config.boundary_search_window)
    }

    /// Split `text` into ordered chunks
    ///
    /// Empty text yields no chunks. Text that fits in one chunk yields a
    /// single chunk with no overlap.
    pub fn split(&self, text: &str) -> Vec<ChunkInfo> {
        let map = Utf16Map::new(text);
        let total = map.len_units();

        if total == 0 {
            return Vec::new();
        }

        if total <= self.chunk_size {
            return vec![ChunkInfo {
                index: 0,
                text: text.to_string(),
                global_offset: 0,
                overlap_before: 0,
                overlap_after: 0,
                len: total,
            }];
        }

        let step = self.chunk_size.saturating_sub(self.overlap).max(1);
        let mut chunks = Vec::new();
        let mut content_start = 0;

        while content_start < total {
            let content_end = self.find_cut(text, &map, content_start, step);

            let start_byte = map.to_byte(content_start.saturating_sub(self.overlap));
            let end_byte = if content_end < total {
                map.to_byte_ceil((content_end + self.overlap).min(total))
            } else {
                map.len_bytes()
            };

            let global_offset = map.to_units(start_byte);
            let len = map.to_units(end_byte) - global_offset;

            chunks.push(ChunkInfo {
                index: chunks.len(),
                text: text[start_byte..end_byte].to_string(),
                global_offset,
                overlap_before: content_start - global_offset,
                overlap_after: (global_offset + len) - content_end,
                len,
            });

            content_start = content_end;
        }

        tracing::debug!(
            chunks = chunks.len(),
            total_units = total,
            chunk_size = self.chunk_size,
            overlap = self.overlap,
            "Document split into chunks"
        );

        chunks
    }

    /// End of the content region that starts at `content_start`
    ///
    /// Always strictly greater than `content_start` and on a char boundary.
    fn find_cut(&self, text: &str, map: &Utf16Map, content_start: usize, step: usize) -> usize {
        let total = map.len_units();
        let ideal = content_start + step;
        if ideal >= total {
            return total;
        }

        let window_start = ideal
            .saturating_sub(self.boundary_window)
            .max(content_start + 1);
        let lo = map.to_byte_ceil(window_start);
        let hi = map.to_byte(ideal);

        if lo < hi {
            let window = &text[lo..hi];
            for separator in BOUNDARY_SEPARATORS {
                if let Some(idx) = window.rfind(separator) {
                    return map.to_units(lo + idx + separator.len());
                }
            }
        }

        let start_byte = map.to_byte(content_start);
        let cut = map.to_byte(ideal);
        if cut > start_byte {
            map.to_units(cut)
        } else {
            map.to_units(map.to_byte_ceil(ideal))
        }
    }
}

/// Split `text` with the default boundary search window
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Vec<ChunkInfo> {
    Chunker::new(chunk_size, overlap).split(text)
}
