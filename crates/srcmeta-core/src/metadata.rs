//! Per-file metadata records.

use serde::{Deserialize, Serialize};

/// BLAKE3 digest of a file's normalized content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64 character hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }

    /// Get the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Line and hash accounting for one analyzed file.
///
/// Offsets are expressed in characters of the decoded text, before line
/// terminators are normalized. `line_start_offsets[i]` is where line `i`
/// begins, `line_end_offsets[i]` where its content ends (terminator excluded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Number of logical lines.
    pub lines: usize,
    /// Lines with at least one non-whitespace character.
    pub non_blank_lines: usize,
    /// Digest of the normalized content.
    pub hash: ContentHash,
    /// Character offset of the first character of each line.
    pub line_start_offsets: Vec<usize>,
    /// Character offset just past the content of each line.
    pub line_end_offsets: Vec<usize>,
    /// Character offset of the end of the file.
    pub last_valid_offset: usize,
}

impl FileMetadata {
    /// Assemble a metadata record.
    pub fn new(
        non_blank_lines: usize,
        hash: ContentHash,
        line_start_offsets: Vec<usize>,
        line_end_offsets: Vec<usize>,
        last_valid_offset: usize,
    ) -> Self {
        let lines = line_start_offsets.len();
        debug_assert_eq!(lines, line_end_offsets.len(), "offset tables disagree");
        debug_assert!(non_blank_lines <= lines, "more non-blank lines than lines");
        Self {
            lines,
            non_blank_lines,
            hash,
            line_start_offsets,
            line_end_offsets,
            last_valid_offset,
        }
    }

    /// Check if the file had no content at all.
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    /// Number of lines made only of whitespace.
    pub fn blank_lines(&self) -> usize {
        self.lines - self.non_blank_lines
    }
}
