//! Two-level indexed mapping tables for legacy multi-byte encodings
//!
//! A decode table maps raw byte sequences to 16-bit code units; an encode
//! table maps code units back to byte sequences. Both directions use the
//! same compact layout: a first-level index selects a block of flat table
//! data, and a handful of per-table scalars (`mask`/`shift`/trail range)
//! define how the first-level entries are unpacked.
//!
//! Table *contents* are produced by an external generation step and arrive
//! as opaque blobs (see [`crate::blob`]); this module only implements their
//! shape. Tables are immutable after construction and may be shared freely
//! across threads and coder sessions.

use crate::policy::ReplacementPolicy;
use crate::{Error, Result};

/// How a decode table treats a lead byte followed by a trail byte outside
/// the table's valid trail range.
///
/// Legacy encodings disagree here: some substitute the replacement code
/// unit and keep going, others consider the sequence a hard decode error.
/// The choice travels with the table data rather than the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailPolicy {
    /// Substitute the replacement code unit and consume both bytes.
    #[default]
    Substitute,
    /// Stop and report the two offending bytes as malformed input.
    Report,
}

/// The byte sequence an encode lookup produced for one code unit.
///
/// Whether a mapping is one or two bytes falls out of the packed table
/// value: a value below `0x100` is a bare single byte, anything larger
/// carries the lead byte in its high half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedUnit {
    /// A single output byte.
    Single(u8),
    /// A lead/trail output pair.
    Double(u8, u8),
}

impl EncodedUnit {
    /// Number of bytes this unit occupies in the output.
    #[inline]
    pub fn len(self) -> usize {
        match self {
            EncodedUnit::Single(_) => 1,
            EncodedUnit::Double(_, _) => 2,
        }
    }

    /// Always false; an encoded unit is one or two bytes.
    #[inline]
    pub fn is_empty(self) -> bool {
        false
    }
}

/// Immutable decode-direction mapping table.
///
/// Byte values in the single-byte domain go through a flat 256-entry-or-
/// smaller table; lead bytes select a packed `(block, row)` descriptor in
/// `index1`, which combined with the trail byte addresses one code unit in
/// the flattened `index2` data:
///
/// ```text
/// block = index1[lead] >> shift        row = index1[lead] & mask2
/// flat  = block * (mask2 + 1) * span + row * span + (trail - start)
/// ```
///
/// where `span = end - start + 1`. A descriptor equal to the table's
/// sentinel means no double-byte mapping begins with that lead byte.
#[derive(Debug, Clone)]
pub struct DecodeTable {
    single: Box<[u16]>,
    index1: Box<[u16]>,
    index2: Box<[u16]>,
    /// Bit set over the 256 byte values marking double-byte lead bytes.
    lead_mask: [u64; 4],
    mask2: u16,
    shift: u32,
    start: u8,
    end: u8,
    sentinel: u16,
    trail_policy: TrailPolicy,
    policy: ReplacementPolicy,
}

impl DecodeTable {
    /// Build a decode table from raw parts, validating the layout
    /// invariants.
    ///
    /// `lead_bytes` lists every byte value that opens a double-byte
    /// sequence. Validation guarantees that every non-sentinel `index1`
    /// descriptor resolves inside `index2` for the whole trail range, so
    /// the accessors never have to bounds-check at decode time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        single: Vec<u16>,
        index1: Vec<u16>,
        index2: Vec<u16>,
        lead_bytes: &[u8],
        mask2: u16,
        shift: u32,
        start: u8,
        end: u8,
        sentinel: u16,
        trail_policy: TrailPolicy,
    ) -> Result<Self> {
        if index1.len() != 256 {
            return Err(Error::InvalidTable(format!(
                "index1 must have 256 entries, got {}",
                index1.len()
            )));
        }
        if single.len() > 256 {
            return Err(Error::InvalidTable(format!(
                "single-byte table has {} entries, at most 256 allowed",
                single.len()
            )));
        }
        if start > end {
            return Err(Error::InvalidTable(format!(
                "trail range [0x{start:02X}, 0x{end:02X}] is empty"
            )));
        }
        if shift >= 16 {
            return Err(Error::InvalidTable(format!("shift {shift} out of range")));
        }

        let span = end as usize - start as usize + 1;
        let segment = (mask2 as usize + 1) * span;
        for (lead, &packed) in index1.iter().enumerate() {
            if packed == sentinel {
                continue;
            }
            let block = (packed >> shift) as usize;
            let row = (packed & mask2) as usize;
            let top = block * segment + row * span + (span - 1);
            if top >= index2.len() {
                return Err(Error::InvalidTable(format!(
                    "index1[0x{lead:02X}] = {packed} addresses index2[{top}] \
                     but index2 has {} entries",
                    index2.len()
                )));
            }
        }

        let mut lead_mask = [0u64; 4];
        for &b in lead_bytes {
            lead_mask[b as usize / 64] |= 1u64 << (b as usize % 64);
        }

        Ok(Self {
            single: single.into_boxed_slice(),
            index1: index1.into_boxed_slice(),
            index2: index2.into_boxed_slice(),
            lead_mask,
            mask2,
            shift,
            start,
            end,
            sentinel,
            trail_policy,
            policy: ReplacementPolicy::default(),
        })
    }

    /// Replace the table's default replacement policy.
    pub fn with_policy(mut self, policy: ReplacementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether `b` opens a double-byte sequence in this table.
    #[inline]
    pub fn is_lead(&self, b: u8) -> bool {
        self.lead_mask[b as usize / 64] & (1u64 << (b as usize % 64)) != 0
    }

    /// First valid trail byte value.
    #[inline]
    pub fn trail_start(&self) -> u8 {
        self.start
    }

    /// Last valid trail byte value.
    #[inline]
    pub fn trail_end(&self) -> u8 {
        self.end
    }

    /// The table's invalid-trail handling.
    #[inline]
    pub fn trail_policy(&self) -> TrailPolicy {
        self.trail_policy
    }

    /// The replacement policy shipped with this table.
    #[inline]
    pub fn policy(&self) -> ReplacementPolicy {
        self.policy
    }

    /// Decode a byte from the single-byte domain.
    ///
    /// Total over all byte values: out-of-domain bytes yield the table's
    /// replacement code unit, never an error.
    #[inline]
    pub fn decode_single(&self, b: u8) -> u16 {
        self.lookup_single(b).unwrap_or_else(|| self.policy.unit())
    }

    /// Decode a lead/trail pair.
    ///
    /// Total over all byte pairs. A sentinel descriptor, an out-of-range
    /// trail byte, or an absent mapping all yield the replacement code
    /// unit; callers cannot distinguish "mapped to the replacement
    /// character" from "no mapping" through this accessor.
    #[inline]
    pub fn decode_double(&self, lead: u8, trail: u8) -> u16 {
        self.lookup_double(lead, trail)
            .unwrap_or_else(|| self.policy.unit())
    }

    #[inline]
    pub(crate) fn lookup_single(&self, b: u8) -> Option<u16> {
        self.single.get(b as usize).copied()
    }

    pub(crate) fn lookup_double(&self, lead: u8, trail: u8) -> Option<u16> {
        if trail < self.start || trail > self.end {
            return None;
        }
        let packed = self.index1[lead as usize];
        if packed == self.sentinel {
            return None;
        }
        let span = self.end as usize - self.start as usize + 1;
        let block = (packed >> self.shift) as usize;
        let row = (packed & self.mask2) as usize;
        let n = block * (self.mask2 as usize + 1) * span + row * span + (trail - self.start) as usize;
        // In bounds for every non-sentinel descriptor, checked at construction.
        Some(self.index2[n])
    }

    pub(crate) fn raw_parts(&self) -> (&[u16], &[u16], &[u16], &[u64; 4]) {
        (&self.single, &self.index1, &self.index2, &self.lead_mask)
    }

    pub(crate) fn scalars(&self) -> (u16, u32, u8, u8, u16) {
        (self.mask2, self.shift, self.start, self.end, self.sentinel)
    }
}

/// Immutable encode-direction mapping table.
///
/// Keyed by code-unit value: `index1[(unit & mask1) >> shift]` yields a
/// base offset, and `base + (unit & mask2)` addresses one packed byte pair
/// in the logical concatenation of `index2` and `index2a`. The split into
/// two flat arrays exists purely for storage reasons; indices past the end
/// of `index2` continue in `index2a`.
///
/// A packed value of zero means unmappable, with one exception: `U+0000`
/// legitimately encodes to the single byte `0x00`.
#[derive(Debug, Clone)]
pub struct EncodeTable {
    index1: Box<[u16]>,
    index2: Box<[u16]>,
    index2a: Box<[u16]>,
    mask1: u16,
    mask2: u16,
    shift: u32,
}

impl EncodeTable {
    /// Build an encode table from raw parts, validating the layout
    /// invariants.
    pub fn new(
        index1: Vec<u16>,
        index2: Vec<u16>,
        index2a: Vec<u16>,
        mask1: u16,
        mask2: u16,
        shift: u32,
    ) -> Result<Self> {
        if shift >= 16 {
            return Err(Error::InvalidTable(format!("shift {shift} out of range")));
        }
        let slots = ((0xFFFFu16 & mask1) >> shift) as usize + 1;
        if index1.len() != slots {
            return Err(Error::InvalidTable(format!(
                "index1 must have {slots} entries for mask1=0x{mask1:04X} shift={shift}, got {}",
                index1.len()
            )));
        }
        let total = index2.len() + index2a.len();
        for (slot, &base) in index1.iter().enumerate() {
            let top = base as usize + mask2 as usize;
            if top >= total {
                return Err(Error::InvalidTable(format!(
                    "index1[{slot}] = {base} addresses entry {top} but the \
                     table holds {total} entries"
                )));
            }
        }

        Ok(Self {
            index1: index1.into_boxed_slice(),
            index2: index2.into_boxed_slice(),
            index2a: index2a.into_boxed_slice(),
            mask1,
            mask2,
            shift,
        })
    }

    /// Reverse-map one code unit to its byte sequence.
    ///
    /// Returns `None` when the table has no mapping for `unit`. At most
    /// one mapping exists per code unit; the converse does not hold, since
    /// legacy tables routinely map several byte sequences to one unit.
    pub fn encode(&self, unit: u16) -> Option<EncodedUnit> {
        let slot = ((unit & self.mask1) >> self.shift) as usize;
        let n = self.index1[slot] as usize + (unit & self.mask2) as usize;
        // In bounds for every base, checked at construction.
        let packed = if n < self.index2.len() {
            self.index2[n]
        } else {
            self.index2a[n - self.index2.len()]
        };
        if packed == 0 {
            // The zero sentinel collides with the one real zero mapping.
            if unit == 0 {
                return Some(EncodedUnit::Single(0));
            }
            return None;
        }
        if packed < 0x100 {
            Some(EncodedUnit::Single(packed as u8))
        } else {
            Some(EncodedUnit::Double((packed >> 8) as u8, packed as u8))
        }
    }

    pub(crate) fn raw_parts(&self) -> (&[u16], &[u16], &[u16]) {
        (&self.index1, &self.index2, &self.index2a)
    }

    pub(crate) fn scalars(&self) -> (u16, u16, u32) {
        (self.mask1, self.mask2, self.shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascii_single() -> Vec<u16> {
        (0u16..256).map(|b| if b < 0x80 { b } else { 0xFFFD }).collect()
    }

    #[test]
    fn construction_rejects_short_index1() {
        let err = DecodeTable::new(
            ascii_single(),
            vec![0xFFFF; 255],
            Vec::new(),
            &[],
            0xF,
            4,
            0x40,
            0x7E,
            0xFFFF,
            TrailPolicy::Substitute,
        );
        assert!(matches!(err, Err(Error::InvalidTable(_))));
    }

    #[test]
    fn construction_rejects_descriptor_past_index2() {
        // Descriptor 0 needs a full segment of data behind it.
        let mut index1 = vec![0xFFFFu16; 256];
        index1[0x81] = 0;
        let err = DecodeTable::new(
            ascii_single(),
            index1,
            vec![0x4E00; 2],
            &[0x81],
            0xF,
            4,
            0x40,
            0x7E,
            0xFFFF,
            TrailPolicy::Substitute,
        );
        assert!(matches!(err, Err(Error::InvalidTable(_))));
    }

    #[test]
    fn sentinel_descriptor_decodes_to_replacement() {
        // The table's sentinel here is 320; index2 can stay empty because
        // every descriptor is the sentinel.
        let table = DecodeTable::new(
            ascii_single(),
            vec![320; 256],
            Vec::new(),
            &[0x81],
            0xF,
            4,
            0x40,
            0xFE,
            320,
            TrailPolicy::Substitute,
        )
        .unwrap();
        assert_eq!(table.decode_double(0x81, 0x40), 0xFFFD);
    }

    #[test]
    fn single_byte_ascii_identity() {
        let table = DecodeTable::new(
            ascii_single(),
            vec![0xFFFF; 256],
            Vec::new(),
            &[],
            0xF,
            4,
            0x40,
            0x7E,
            0xFFFF,
            TrailPolicy::Substitute,
        )
        .unwrap();
        assert_eq!(table.decode_single(0x41), u16::from(b'A'));
    }

    #[test]
    fn out_of_domain_single_byte_is_replacement() {
        // A single-byte table shorter than 256 entries: bytes past the end
        // decode to the replacement unit.
        let table = DecodeTable::new(
            (0u16..0x80).collect(),
            vec![0xFFFF; 256],
            Vec::new(),
            &[],
            0xF,
            4,
            0x40,
            0x7E,
            0xFFFF,
            TrailPolicy::Substitute,
        )
        .unwrap();
        assert_eq!(table.decode_single(0x41), 0x41);
        assert_eq!(table.decode_single(0xA0), 0xFFFD);
    }

    #[test]
    fn encode_construction_rejects_wrong_index1_len() {
        let err = EncodeTable::new(vec![0; 17], vec![0; 256], Vec::new(), 0xFF00, 0xFF, 8);
        assert!(matches!(err, Err(Error::InvalidTable(_))));
    }

    #[test]
    fn encode_nul_is_single_zero_byte() {
        let table =
            EncodeTable::new(vec![0; 256], vec![0; 256], Vec::new(), 0xFF00, 0xFF, 8).unwrap();
        assert_eq!(table.encode(0x0000), Some(EncodedUnit::Single(0)));
        // Everything else in the zero-filled row is unmappable.
        assert_eq!(table.encode(0x0001), None);
    }

    #[test]
    fn encode_spills_into_index2a() {
        // One mapped row in index2, the shared empty row entirely in
        // index2a.
        let mut index1 = vec![256u16; 256];
        index1[0x00] = 0;
        let mut index2 = vec![0u16; 256];
        index2[0x41] = 0x0041;
        index2[0x42] = 0x8140;
        let index2a = vec![0u16; 256];
        let table = EncodeTable::new(index1, index2, index2a, 0xFF00, 0xFF, 8).unwrap();
        assert_eq!(table.encode(0x0041), Some(EncodedUnit::Single(0x41)));
        assert_eq!(table.encode(0x0042), Some(EncodedUnit::Double(0x81, 0x40)));
        // Unit 0x4E00 lands in the index2a half.
        assert_eq!(table.encode(0x4E00), None);
    }

    #[test]
    fn full_domain_decode_never_escapes() {
        // Every (lead, trail) pair must come back as a code unit or the
        // replacement, never a panic.
        let mut index1 = vec![0xFFFFu16; 256];
        index1[0x81] = 0;
        let span = (0x7E - 0x40 + 1) as usize;
        let table = DecodeTable::new(
            ascii_single(),
            index1,
            vec![0x4E00; 16 * span],
            &[0x81],
            0xF,
            4,
            0x40,
            0x7E,
            0xFFFF,
            TrailPolicy::Substitute,
        )
        .unwrap();
        for b in 0u16..256 {
            let _ = table.decode_single(b as u8);
            for t in 0u16..256 {
                let _ = table.decode_double(b as u8, t as u8);
            }
        }
    }
}
