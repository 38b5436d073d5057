//! Character encodings understood by the metadata engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Character encoding of a source file.
///
/// The set is closed: a file is either read with the configured default
/// (US-ASCII unless overridden) or with the encoding announced by its
/// byte-order mark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    /// 7-bit ASCII.
    #[default]
    #[serde(rename = "US-ASCII")]
    UsAscii,
    /// UTF-8.
    #[serde(rename = "UTF-8")]
    Utf8,
    /// UTF-16, big endian.
    #[serde(rename = "UTF-16BE")]
    Utf16Be,
    /// UTF-16, little endian.
    #[serde(rename = "UTF-16LE")]
    Utf16Le,
    /// UTF-32, big endian.
    #[serde(rename = "UTF-32BE")]
    Utf32Be,
    /// UTF-32, little endian.
    #[serde(rename = "UTF-32LE")]
    Utf32Le,
}

impl Encoding {
    /// All supported encodings.
    pub const ALL: [Encoding; 6] = [
        Encoding::UsAscii,
        Encoding::Utf8,
        Encoding::Utf16Be,
        Encoding::Utf16Le,
        Encoding::Utf32Be,
        Encoding::Utf32Le,
    ];

    /// Canonical IANA label.
    pub fn label(self) -> &'static str {
        match self {
            Encoding::UsAscii => "US-ASCII",
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf32Be => "UTF-32BE",
            Encoding::Utf32Le => "UTF-32LE",
        }
    }

    /// Encode `text` in this encoding, without a byte-order mark.
    ///
    /// Characters outside ASCII are replaced by `?` for [`Encoding::UsAscii`].
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::UsAscii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Encoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Encoding::Utf32Be => text.chars().flat_map(|c| u32::from(c).to_be_bytes()).collect(),
            Encoding::Utf32Le => text.chars().flat_map(|c| u32::from(c).to_le_bytes()).collect(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when an encoding label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported encoding: {label}")]
pub struct ParseEncodingError {
    /// The label that failed to parse.
    pub label: String,
}

impl FromStr for Encoding {
    type Err = ParseEncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('_', "-");
        let encoding = match normalized.as_str() {
            "US-ASCII" | "ASCII" => Encoding::UsAscii,
            "UTF-8" | "UTF8" => Encoding::Utf8,
            "UTF-16BE" => Encoding::Utf16Be,
            "UTF-16LE" => Encoding::Utf16Le,
            "UTF-32BE" => Encoding::Utf32Be,
            "UTF-32LE" => Encoding::Utf32Le,
            _ => {
                return Err(ParseEncodingError {
                    label: s.to_string(),
                });
            }
        };
        Ok(encoding)
    }
}
