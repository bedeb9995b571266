//! UTF-16 offset mapping
//!
//! Entity positions are measured in UTF-16 code units so they line up with
//! the string APIs of the platforms that consume the ledger. Regex matching
//! works on UTF-8 byte offsets, so every recognizer converts through a
//! [`Utf16Map`] built once per text.

/// Number of UTF-16 code units in `text`
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Bidirectional byte <-> UTF-16 offset table for one string
///
/// Entries are recorded at every char boundary, including the end of the
/// text, so lookups are a binary search.
#[derive(Debug, Clone)]
pub struct Utf16Map {
    bytes: Vec<usize>,
    units: Vec<usize>,
}

impl Utf16Map {
    /// Build the table for `text`
    pub fn new(text: &str) -> Self {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        let mut units = Vec::with_capacity(text.len() + 1);
        let mut unit = 0;

        for (byte, ch) in text.char_indices() {
            bytes.push(byte);
            units.push(unit);
            unit += ch.len_utf16();
        }
        bytes.push(text.len());
        units.push(unit);

        Self { bytes, units }
    }

    /// Total length in UTF-16 units
    pub fn len_units(&self) -> usize {
        self.units.last().copied().unwrap_or(0)
    }

    /// Total length in bytes
    pub fn len_bytes(&self) -> usize {
        self.bytes.last().copied().unwrap_or(0)
    }

    /// Convert a byte offset to UTF-16 units, flooring to the enclosing char
    pub fn to_units(&self, byte: usize) -> usize {
        let idx = self.bytes.partition_point(|&b| b <= byte).saturating_sub(1);
        self.units[idx]
    }

    /// Convert a UTF-16 offset to a byte offset, flooring to a char boundary
    ///
    /// An offset that lands inside a surrogate pair maps to the start of
    /// that character.
    pub fn to_byte(&self, unit: usize) -> usize {
        let idx = self.units.partition_point(|&u| u <= unit).saturating_sub(1);
        self.bytes[idx]
    }

    /// Convert a UTF-16 offset to a byte offset, rounding up to the next
    /// char boundary when it lands inside a character
    pub fn to_byte_ceil(&self, unit: usize) -> usize {
        let idx = self.units.partition_point(|&u| u < unit);
        self.bytes[idx.min(self.bytes.len() - 1)]
    }
}
