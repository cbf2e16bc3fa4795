//! Low-level byte access shared by the command decoder and the VGM container
//! code: the positional parse error and bounds-checked little-endian readers.
use std::fmt;

/// Error produced while reading raw VGM bytes.
///
/// Every variant that refers to a position carries the absolute byte offset
/// into the buffer that was being decoded, so a failure can be traced back
/// to the exact place in the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A read needed more bytes than the buffer holds.
    ///
    /// - `offset` is where the read started.
    /// - `needed` is how many bytes the read required.
    /// - `available` is how many bytes were left from `offset`.
    /// - `context` names what was being read (for example `"wait payload"`).
    OffsetOutOfRange {
        offset: usize,
        needed: usize,
        available: usize,
        context: Option<String>,
    },

    /// A four-byte identifier did not match (`"Vgm "`, `"Gd3 "`).
    InvalidIdent([u8; 4]),

    /// The header declares a version missing from the supported table.
    UnsupportedVersion(u32),

    /// A header was shorter than its fixed part.
    HeaderTooShort(String),

    /// An opcode byte outside the recognized command set.
    ///
    /// Decoding cannot continue past it because payload length depends on
    /// the opcode.
    UnknownOpcode { opcode: u8, offset: usize },

    /// Anything else, with a human-readable message.
    Other(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::OffsetOutOfRange {
                offset,
                needed,
                available,
                context,
            } => {
                if let Some(ctx) = context {
                    write!(
                        f,
                        "truncated {} at offset 0x{:X} (needed {} bytes, available {})",
                        ctx, offset, needed, available
                    )
                } else {
                    write!(
                        f,
                        "truncated input at offset 0x{:X} (needed {} bytes, available {})",
                        offset, needed, available
                    )
                }
            }
            ParseError::InvalidIdent(id) => write!(f, "invalid ident: {:?}", id),
            ParseError::UnsupportedVersion(v) => write!(f, "unsupported version: 0x{:08X}", v),
            ParseError::HeaderTooShort(name) => write!(f, "header too short: {}", name),
            ParseError::UnknownOpcode { opcode, offset } => {
                write!(f, "unknown opcode 0x{:02X} at offset 0x{:X}", opcode, offset)
            }
            ParseError::Other(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    /// Absolute byte offset the error refers to, when it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::OffsetOutOfRange { offset, .. } => Some(*offset),
            ParseError::UnknownOpcode { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Attach a context label to an out-of-range error.
    pub(crate) fn with_context(self, label: &str) -> Self {
        match self {
            ParseError::OffsetOutOfRange {
                offset,
                needed,
                available,
                context: _,
            } => ParseError::OffsetOutOfRange {
                offset,
                needed,
                available,
                context: Some(label.to_string()),
            },
            other => other,
        }
    }
}

fn out_of_range(bytes: &[u8], off: usize, needed: usize) -> ParseError {
    ParseError::OffsetOutOfRange {
        offset: off,
        needed,
        available: bytes.len().saturating_sub(off),
        context: None,
    }
}

/// Read a little-endian `u32` at `off`.
pub fn read_u32_le_at(bytes: &[u8], off: usize) -> Result<u32, ParseError> {
    let s = read_slice(bytes, off, 4).map_err(|_| out_of_range(bytes, off, 4))?;
    Ok(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

/// Read a little-endian `u16` at `off`.
pub fn read_u16_le_at(bytes: &[u8], off: usize) -> Result<u16, ParseError> {
    let s = read_slice(bytes, off, 2).map_err(|_| out_of_range(bytes, off, 2))?;
    Ok(u16::from_le_bytes([s[0], s[1]]))
}

/// Read the byte at `off`.
pub fn read_u8_at(bytes: &[u8], off: usize) -> Result<u8, ParseError> {
    bytes.get(off).copied().ok_or_else(|| out_of_range(bytes, off, 1))
}

/// Borrow `len` bytes starting at `off`.
pub fn read_slice(bytes: &[u8], off: usize, len: usize) -> Result<&[u8], ParseError> {
    match off.checked_add(len) {
        Some(end) if end <= bytes.len() => Ok(&bytes[off..end]),
        _ => Err(out_of_range(bytes, off, len)),
    }
}

/// Write `v` little-endian into `buf[off..off + 4]`.
///
/// The caller guarantees the range exists.
pub fn write_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

/// Write `v` little-endian into `buf[off..off + 2]`.
pub fn write_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

/// Write a single byte at `off`.
pub fn write_u8(buf: &mut [u8], off: usize, v: u8) {
    buf[off] = v;
}
