//! Byte-order mark detection.

use srcmeta_core::Encoding;

/// Number of leading bytes needed to recognize every byte-order mark.
pub const BOM_PREFIX_LEN: usize = 4;

/// Byte-order marks in priority order.
///
/// `FF FE` is a prefix of the UTF-32LE mark, so the four byte marks come
/// first.
const BYTE_ORDER_MARKS: [(&[u8], Encoding); 5] = [
    (&[0x00, 0x00, 0xFE, 0xFF], Encoding::Utf32Be),
    (&[0xFF, 0xFE, 0x00, 0x00], Encoding::Utf32Le),
    (&[0xEF, 0xBB, 0xBF], Encoding::Utf8),
    (&[0xFE, 0xFF], Encoding::Utf16Be),
    (&[0xFF, 0xFE], Encoding::Utf16Le),
];

/// Encoding resolved for a file and the length of its byte-order mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Encoding to decode the file with.
    pub encoding: Encoding,
    /// Bytes taken by the byte-order mark (0 when none was found).
    pub bom_len: usize,
}

impl Detection {
    /// Check if the encoding came from a byte-order mark.
    pub fn from_bom(&self) -> bool {
        self.bom_len > 0
    }
}

/// Resolve the encoding of a file from its leading bytes.
///
/// Only the first [`BOM_PREFIX_LEN`] bytes are inspected. Without a
/// recognized mark the `default` encoding is returned with no bytes consumed.
pub fn detect(prefix: &[u8], default: Encoding) -> Detection {
    let prefix = &prefix[..prefix.len().min(BOM_PREFIX_LEN)];
    BYTE_ORDER_MARKS
        .iter()
        .find(|(mark, _)| prefix.starts_with(mark))
        .map(|&(mark, encoding)| Detection {
            encoding,
            bom_len: mark.len(),
        })
        .unwrap_or(Detection {
            encoding: default,
            bom_len: 0,
        })
}

/// Byte-order mark written for `encoding`, empty for US-ASCII.
pub fn mark_for(encoding: Encoding) -> &'static [u8] {
    BYTE_ORDER_MARKS
        .iter()
        .find(|(_, e)| *e == encoding)
        .map(|(mark, _)| *mark)
        .unwrap_or(&[])
}
