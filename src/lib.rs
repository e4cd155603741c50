//! # TableCodec - Indexed-Table Codec for Legacy Encodings
//!
//! A two-level indexed-table codec converting between legacy single- and
//! double-byte text encodings and fixed-width 16-bit code units, in both
//! directions, over caller-owned bounded windows.
//!
//! ## Features
//!
//! - **Compact two-level tables** shared read-only across any number of
//!   concurrent coder sessions
//! - **Window-based streaming** with precise underflow/overflow resumption
//! - **Per-table malformed-input policy** matching the quirks of real
//!   legacy code pages
//! - **Versioned binary table blobs** produced by an external generation
//!   step, stable byte-for-byte within a version
//! - **Status-based error reporting** with exact offending lengths, never
//!   panics on data
//!
//! ## Quick Start
//!
//! ```rust
//! use table_codec::{Codec, DecodeTable, TrailPolicy};
//!
//! // ASCII-only demo table: no double-byte leads at all.
//! let single: Vec<u16> = (0u16..256).map(|b| if b < 0x80 { b } else { 0xFFFD }).collect();
//! let table = DecodeTable::new(
//!     single, vec![0xFFFF; 256], Vec::new(), &[],
//!     0xF, 4, 0x40, 0x7E, 0xFFFF, TrailPolicy::Substitute,
//! ).unwrap();
//!
//! let codec = Codec::from_decode_table(table);
//! assert_eq!(codec.decode_to_string(b"HELLO").unwrap(), "HELLO");
//! ```

#![deny(missing_docs)]

use std::fmt;

pub mod blob;
mod coder;
mod policy;
mod table;
#[cfg(test)]
pub(crate) mod testdata;

pub use coder::{CoderStatus, DecodeResult, Decoder, EncodeResult, Encoder};
pub use policy::ReplacementPolicy;
pub use table::{DecodeTable, EncodeTable, EncodedUnit, TrailPolicy};

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during codec operations
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input that cannot be interpreted under the table's rules at all
    Malformed {
        /// Position of the offending input element
        position: usize,
        /// Number of offending input elements
        length: usize,
    },
    /// Well-formed input with no mapping in the table
    Unmappable {
        /// Position of the offending input element
        position: usize,
        /// Number of offending input elements
        length: usize,
    },
    /// Input ends in the middle of a double-byte sequence
    Truncated {
        /// Position of the dangling lead byte
        position: usize,
    },
    /// A table blob or hand-built table violates the layout invariants
    InvalidTable(String),
    /// The requested direction has no table loaded
    Unsupported(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Malformed { position, length } => {
                write!(
                    f,
                    "Malformed input of length {} at position {}",
                    length, position
                )
            }
            Error::Unmappable { position, length } => {
                write!(
                    f,
                    "Unmappable input of length {} at position {}",
                    length, position
                )
            }
            Error::Truncated { position } => {
                write!(
                    f,
                    "Input truncated inside a double-byte sequence at position {}",
                    position
                )
            }
            Error::InvalidTable(msg) => write!(f, "Invalid table: {}", msg),
            Error::Unsupported(what) => write!(f, "Unsupported operation: {}", what),
        }
    }
}

impl std::error::Error for Error {}

/// High-level converter bundling the tables for one named encoding
///
/// A codec owns an optional decode table and an optional encode table and
/// offers whole-buffer conversions on top of the streaming [`Decoder`] and
/// [`Encoder`]. Strict variants stop at the first malformed or unmappable
/// input; lossy variants substitute via a [`ReplacementPolicy`] and always
/// produce output.
pub struct Codec {
    decode: Option<DecodeTable>,
    encode: Option<EncodeTable>,
}

impl Codec {
    /// Create a codec supporting both directions.
    pub fn new(decode: DecodeTable, encode: EncodeTable) -> Self {
        Self {
            decode: Some(decode),
            encode: Some(encode),
        }
    }

    /// Create a decode-only codec.
    pub fn from_decode_table(decode: DecodeTable) -> Self {
        Self {
            decode: Some(decode),
            encode: None,
        }
    }

    /// Create an encode-only codec.
    pub fn from_encode_table(encode: EncodeTable) -> Self {
        Self {
            decode: None,
            encode: Some(encode),
        }
    }

    /// The decode table, if this codec carries one.
    pub fn decode_table(&self) -> Option<&DecodeTable> {
        self.decode.as_ref()
    }

    /// The encode table, if this codec carries one.
    pub fn encode_table(&self) -> Option<&EncodeTable> {
        self.encode.as_ref()
    }

    /// Start a streaming decode session.
    pub fn decoder(&self) -> Result<Decoder<'_>> {
        let table = self
            .decode
            .as_ref()
            .ok_or(Error::Unsupported("no decode table loaded"))?;
        Ok(Decoder::new(table))
    }

    /// Start a streaming encode session.
    pub fn encoder(&self) -> Result<Encoder<'_>> {
        let table = self
            .encode
            .as_ref()
            .ok_or(Error::Unsupported("no encode table loaded"))?;
        Ok(Encoder::new(table))
    }

    /// Decode a whole byte buffer to code units.
    ///
    /// Fails on the first malformed sequence or truncated tail; unmapped
    /// but well-formed input substitutes per the table's policy.
    pub fn decode_units(&self, input: &[u8]) -> Result<Vec<u16>> {
        let mut decoder = self.decoder()?;
        let mut out = vec![0u16; input.len()];
        let r = decoder.decode(input, &mut out);
        match r.status {
            CoderStatus::Done => {
                out.truncate(r.units_produced);
                Ok(out)
            }
            CoderStatus::Underflow => Err(Error::Truncated {
                position: r.bytes_consumed,
            }),
            CoderStatus::Malformed(length) => Err(Error::Malformed {
                position: r.bytes_consumed,
                length,
            }),
            CoderStatus::Unmappable(length) => Err(Error::Unmappable {
                position: r.bytes_consumed,
                length,
            }),
            // A byte produces at most one unit and the buffer is sized for
            // that, so the output window cannot fill up.
            CoderStatus::Overflow => unreachable!("output sized to input"),
        }
    }

    /// Decode a whole byte buffer to a `String`.
    pub fn decode_to_string(&self, input: &[u8]) -> Result<String> {
        let units = self.decode_units(input)?;
        String::from_utf16(&units)
            .map_err(|_| Error::InvalidTable("table yields unpaired surrogates".into()))
    }

    /// Decode a whole byte buffer, substituting for anything that does not
    /// convert.
    ///
    /// Malformed sequences are replaced two bytes at a time; a truncated
    /// tail is replaced as a unit. Always produces output.
    pub fn decode_lossy(&self, input: &[u8], policy: ReplacementPolicy) -> Result<Vec<u16>> {
        let table = self
            .decode
            .as_ref()
            .ok_or(Error::Unsupported("no decode table loaded"))?;
        let mut decoder = Decoder::with_policy(table, policy);
        let mut out = Vec::with_capacity(input.len());
        let mut buf = vec![0u16; input.len() + 1];
        let mut pos = 0;
        while pos < input.len() {
            let r = decoder.decode(&input[pos..], &mut buf);
            out.extend_from_slice(&buf[..r.units_produced]);
            pos += r.bytes_consumed;
            match r.status {
                CoderStatus::Done => break,
                CoderStatus::Underflow => {
                    // Dangling lead byte at the very end of the input.
                    out.push(policy.unit());
                    pos = input.len();
                }
                CoderStatus::Malformed(length) | CoderStatus::Unmappable(length) => {
                    out.push(policy.unit());
                    pos += length;
                }
                CoderStatus::Overflow => unreachable!("output sized to input"),
            }
        }
        Ok(out)
    }

    /// Encode a whole code-unit buffer to bytes.
    ///
    /// Fails on the first unmappable code unit.
    pub fn encode_units(&self, input: &[u16]) -> Result<Vec<u8>> {
        let mut encoder = self.encoder()?;
        let mut out = vec![0u8; input.len() * 2];
        let r = encoder.encode(input, &mut out);
        match r.status {
            CoderStatus::Done => {
                out.truncate(r.bytes_produced);
                Ok(out)
            }
            CoderStatus::Unmappable(length) => Err(Error::Unmappable {
                position: r.units_consumed,
                length,
            }),
            CoderStatus::Malformed(length) => Err(Error::Malformed {
                position: r.units_consumed,
                length,
            }),
            // A unit produces at most two bytes; the buffer is sized for
            // that, and encode input has no partial sequences.
            CoderStatus::Overflow | CoderStatus::Underflow => {
                unreachable!("output sized to input")
            }
        }
    }

    /// Encode a string to bytes.
    pub fn encode_str(&self, input: &str) -> Result<Vec<u8>> {
        let units: Vec<u16> = input.encode_utf16().collect();
        self.encode_units(&units)
    }

    /// Encode a string, substituting `replacement` for every unmappable
    /// code unit.
    pub fn encode_lossy(&self, input: &str, replacement: u8) -> Result<Vec<u8>> {
        let table = self
            .encode
            .as_ref()
            .ok_or(Error::Unsupported("no encode table loaded"))?;
        let units: Vec<u16> = input.encode_utf16().collect();
        let policy = ReplacementPolicy::default().with_replacement_byte(replacement);
        let mut encoder = Encoder::with_policy(table, policy);
        let mut out = vec![0u8; units.len() * 2];
        let r = encoder.encode(&units, &mut out);
        debug_assert_eq!(r.status, CoderStatus::Done);
        out.truncate(r.bytes_produced);
        Ok(out)
    }
}
