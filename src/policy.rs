//! Substitution policy shared by the decoder and encoder
//!
//! A policy says what to emit when input is well-formed but has no target
//! mapping: a replacement code unit on the decode side, and optionally a
//! replacement byte sequence on the encode side. Policies are plain
//! copyable values, fixed for the lifetime of a coder session.

use crate::table::EncodedUnit;

/// Replacement values consulted when a lookup comes back empty.
///
/// The default decodes unmappable input to `U+FFFD` and carries no
/// replacement bytes, which makes the encoder report unmappable code units
/// to the caller instead of substituting silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplacementPolicy {
    unit: u16,
    bytes: Option<EncodedUnit>,
}

impl Default for ReplacementPolicy {
    fn default() -> Self {
        Self {
            unit: 0xFFFD,
            bytes: None,
        }
    }
}

impl ReplacementPolicy {
    /// Policy with a custom replacement code unit for the decode side.
    pub fn with_unit(unit: u16) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    /// Use `byte` as the encode-side substitute for unmappable code units.
    ///
    /// With replacement bytes configured the encoder substitutes and keeps
    /// going rather than stopping with an unmappable status.
    pub fn with_replacement_byte(mut self, byte: u8) -> Self {
        self.bytes = Some(EncodedUnit::Single(byte));
        self
    }

    /// Use a two-byte sequence as the encode-side substitute.
    pub fn with_replacement_pair(mut self, lead: u8, trail: u8) -> Self {
        self.bytes = Some(EncodedUnit::Double(lead, trail));
        self
    }

    /// The code unit emitted for unmappable decode input.
    #[inline]
    pub fn unit(&self) -> u16 {
        self.unit
    }

    /// The byte sequence emitted for unmappable encode input, if any.
    #[inline]
    pub fn bytes(&self) -> Option<EncodedUnit> {
        self.bytes
    }
}
