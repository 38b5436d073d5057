//! Content decoding, line accounting and hashing.
//!
//! Files are decoded strictly with their resolved encoding, then split into
//! logical lines. LF, CR and CRLF each end one line; content after the last
//! terminator counts as a final line. The content hash is BLAKE3 over every
//! line re-encoded as UTF-8, with a single `\n` after each terminated line, so
//! it does not depend on the source encoding or the line ending convention.

use std::path::Path;

use blake3::Hasher;

use srcmeta_core::{ContentHash, Encoding, FileMetadata, ReadError};

use crate::bom::{self, Detection};

/// Read a whole file.
pub fn read_file(path: &Path) -> Result<Vec<u8>, ReadError> {
    std::fs::read(path).map_err(ReadError::io)
}

/// Read a file, detect its encoding and compute its metadata.
pub fn read_metadata(
    path: &Path,
    default_encoding: Encoding,
) -> Result<(Detection, FileMetadata), ReadError> {
    let bytes = read_file(path)?;
    let detection = bom::detect(&bytes, default_encoding);
    let metadata = compute_metadata(&bytes, detection)?;
    Ok((detection, metadata))
}

/// Compute metadata for file content whose encoding is already resolved.
///
/// `bytes` is the whole file; the first `detection.bom_len` bytes are skipped.
pub fn compute_metadata(bytes: &[u8], detection: Detection) -> Result<FileMetadata, ReadError> {
    let text = decode_body(bytes, detection)?;

    let mut accumulator = LineAccumulator::new();
    for line in LogicalLines::new(&text) {
        accumulator.push(line);
    }
    Ok(accumulator.finish())
}

/// Per-line hashes used to track issues across changes.
///
/// Each line is hashed with all whitespace removed; blank lines yield `None`.
pub fn line_hashes(
    bytes: &[u8],
    detection: Detection,
) -> Result<Vec<Option<ContentHash>>, ReadError> {
    let text = decode_body(bytes, detection)?;

    let hashes = LogicalLines::new(&text)
        .map(|line| {
            let mut hasher = Hasher::new();
            let mut empty = true;
            let mut buf = [0u8; 4];
            for c in line.content.chars().filter(|c| !c.is_whitespace()) {
                hasher.update(c.encode_utf8(&mut buf).as_bytes());
                empty = false;
            }
            (!empty).then(|| ContentHash::new(*hasher.finalize().as_bytes()))
        })
        .collect();
    Ok(hashes)
}

fn decode_body(bytes: &[u8], detection: Detection) -> Result<String, ReadError> {
    let body = bytes.get(detection.bom_len..).unwrap_or_default();
    decode(body, detection.encoding).map_err(|err| match err {
        ReadError::Decode { encoding, offset } => ReadError::Decode {
            encoding,
            offset: offset + detection.bom_len,
        },
        other => other,
    })
}

/// Strictly decode `bytes` (without byte-order mark).
///
/// The offset of a [`ReadError::Decode`] is the index of the first byte that
/// could not be decoded.
pub fn decode(bytes: &[u8], encoding: Encoding) -> Result<String, ReadError> {
    let malformed = |offset| ReadError::Decode { encoding, offset };

    match encoding {
        Encoding::UsAscii => match bytes.iter().position(|b| !b.is_ascii()) {
            Some(offset) => Err(malformed(offset)),
            None => String::from_utf8(bytes.to_vec()).map_err(|_| malformed(0)),
        },
        Encoding::Utf8 => std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|err| malformed(err.valid_up_to())),
        Encoding::Utf16Be | Encoding::Utf16Le => {
            let big_endian = encoding == Encoding::Utf16Be;
            let units = bytes.chunks_exact(2).map(|pair| {
                let pair = [pair[0], pair[1]];
                if big_endian {
                    u16::from_be_bytes(pair)
                } else {
                    u16::from_le_bytes(pair)
                }
            });

            let mut text = String::with_capacity(bytes.len() / 2);
            let mut unit_index = 0;
            for decoded in char::decode_utf16(units) {
                match decoded {
                    Ok(c) => {
                        text.push(c);
                        unit_index += c.len_utf16();
                    }
                    Err(_) => return Err(malformed(unit_index * 2)),
                }
            }
            if bytes.len() % 2 != 0 {
                return Err(malformed(bytes.len() - 1));
            }
            Ok(text)
        }
        Encoding::Utf32Be | Encoding::Utf32Le => {
            let big_endian = encoding == Encoding::Utf32Be;
            let mut text = String::with_capacity(bytes.len() / 4);
            for (index, quad) in bytes.chunks_exact(4).enumerate() {
                let quad = [quad[0], quad[1], quad[2], quad[3]];
                let code = if big_endian {
                    u32::from_be_bytes(quad)
                } else {
                    u32::from_le_bytes(quad)
                };
                let c = char::from_u32(code).ok_or_else(|| malformed(index * 4))?;
                text.push(c);
            }
            if bytes.len() % 4 != 0 {
                return Err(malformed(bytes.len() - bytes.len() % 4));
            }
            Ok(text)
        }
    }
}

/// One logical line of decoded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Line<'a> {
    /// Line content without its terminator.
    content: &'a str,
    /// Terminator length in characters: 0 (end of file), 1 (LF or CR) or 2 (CRLF).
    terminator_len: usize,
}

/// Splits text on LF, CR and CRLF.
struct LogicalLines<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LogicalLines<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for LogicalLines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.pos..];
        if rest.is_empty() {
            return None;
        }

        // CR and LF never occur inside a multi-byte UTF-8 sequence.
        let bytes = rest.as_bytes();
        let line = match bytes.iter().position(|&b| b == b'\n' || b == b'\r') {
            Some(end) => {
                let terminator_len = if bytes[end] == b'\r' && bytes.get(end + 1) == Some(&b'\n') {
                    2
                } else {
                    1
                };
                self.pos += end + terminator_len;
                Line {
                    content: &rest[..end],
                    terminator_len,
                }
            }
            None => {
                self.pos = self.text.len();
                Line {
                    content: rest,
                    terminator_len: 0,
                }
            }
        };
        Some(line)
    }
}

/// Running line counts, offsets and hash for one file.
struct LineAccumulator {
    hasher: Hasher,
    non_blank_lines: usize,
    line_start_offsets: Vec<usize>,
    line_end_offsets: Vec<usize>,
    offset: usize,
}

impl LineAccumulator {
    fn new() -> Self {
        Self {
            hasher: Hasher::new(),
            non_blank_lines: 0,
            line_start_offsets: Vec::new(),
            line_end_offsets: Vec::new(),
            offset: 0,
        }
    }

    fn push(&mut self, line: Line<'_>) {
        let len = line.content.chars().count();
        self.line_start_offsets.push(self.offset);
        self.line_end_offsets.push(self.offset + len);
        self.offset += len + line.terminator_len;

        if !line.content.trim().is_empty() {
            self.non_blank_lines += 1;
        }

        self.hasher.update(line.content.as_bytes());
        if line.terminator_len > 0 {
            self.hasher.update(b"\n");
        }
    }

    fn finish(self) -> FileMetadata {
        FileMetadata::new(
            self.non_blank_lines,
            ContentHash::new(*self.hasher.finalize().as_bytes()),
            self.line_start_offsets,
            self.line_end_offsets,
            self.offset,
        )
    }
}
