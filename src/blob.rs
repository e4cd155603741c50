//! Reading and writing table blobs
//!
//! Mapping-table contents are produced by an external generation step and
//! shipped as opaque binary blobs. The layout is fixed little-endian and
//! versioned: a four-byte magic, a format version, a direction tag, the
//! per-table scalars, the array lengths, then the flat arrays themselves.
//! Within a version the encoding is byte-for-byte stable, so a blob can be
//! checked into a build and trusted to reproduce the same table forever.
//!
//! The writer exists for the generation side and for tests; the library
//! itself only ever reads.

use crate::table::{DecodeTable, EncodeTable, TrailPolicy};
use crate::{Error, Result};

use serde::Serialize;

/// Magic bytes opening every table blob.
pub const MAGIC: [u8; 4] = *b"TBLC";

/// Current blob format version.
pub const VERSION: u8 = 1;

const DIR_DECODE: u8 = 0;
const DIR_ENCODE: u8 = 1;

/// Summary of a blob's header, for tooling and diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    /// Blob format version.
    pub version: u8,
    /// `"decode"` or `"encode"`.
    pub direction: &'static str,
    /// First-level index entry count.
    pub index1_entries: usize,
    /// Flat data entry count (`index2` plus `index2a`).
    pub data_entries: usize,
    /// Single-byte table entry count (decode blobs only).
    pub single_entries: Option<usize>,
    /// Valid trail byte range (decode blobs only).
    pub trail_range: Option<(u8, u8)>,
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| Error::InvalidTable("truncated table blob".into()))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u16_array(&mut self, len: usize) -> Result<Vec<u16>> {
        let raw = self.bytes(len * 2)?;
        Ok(raw
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect())
    }

    fn finish(&self) -> Result<()> {
        if self.pos != self.buf.len() {
            return Err(Error::InvalidTable(format!(
                "{} trailing bytes after table data",
                self.buf.len() - self.pos
            )));
        }
        Ok(())
    }
}

fn read_header(r: &mut Reader<'_>) -> Result<u8> {
    if r.bytes(4)? != MAGIC {
        return Err(Error::InvalidTable("not a table blob".into()));
    }
    let version = r.u8()?;
    if version != VERSION {
        return Err(Error::InvalidTable(format!(
            "unsupported blob version {version}"
        )));
    }
    r.u8()
}

/// Parse a decode-direction blob into a validated [`DecodeTable`].
pub fn read_decode_table(blob: &[u8]) -> Result<DecodeTable> {
    let mut r = Reader::new(blob);
    if read_header(&mut r)? != DIR_DECODE {
        return Err(Error::InvalidTable(
            "blob holds an encode table, expected decode".into(),
        ));
    }

    let mask2 = r.u16()?;
    let shift = u32::from(r.u16()?);
    let start = r.u8()?;
    let end = r.u8()?;
    let sentinel = r.u16()?;
    let trail_policy = match r.u8()? {
        0 => TrailPolicy::Substitute,
        1 => TrailPolicy::Report,
        other => {
            return Err(Error::InvalidTable(format!(
                "unknown trail policy tag {other}"
            )));
        }
    };

    let single_len = r.u32()? as usize;
    let index2_len = r.u32()? as usize;

    let mask_raw = r.bytes(32)?;
    let mut lead_bytes = Vec::new();
    for b in 0..256usize {
        if mask_raw[b / 8] & (1 << (b % 8)) != 0 {
            lead_bytes.push(b as u8);
        }
    }

    let single = r.u16_array(single_len)?;
    let index1 = r.u16_array(256)?;
    let index2 = r.u16_array(index2_len)?;
    r.finish()?;

    DecodeTable::new(
        single,
        index1,
        index2,
        &lead_bytes,
        mask2,
        shift,
        start,
        end,
        sentinel,
        trail_policy,
    )
}

/// Parse an encode-direction blob into a validated [`EncodeTable`].
pub fn read_encode_table(blob: &[u8]) -> Result<EncodeTable> {
    let mut r = Reader::new(blob);
    if read_header(&mut r)? != DIR_ENCODE {
        return Err(Error::InvalidTable(
            "blob holds a decode table, expected encode".into(),
        ));
    }

    let mask1 = r.u16()?;
    let mask2 = r.u16()?;
    let shift = u32::from(r.u16()?);
    let index1_len = r.u32()? as usize;
    let index2_len = r.u32()? as usize;
    let index2a_len = r.u32()? as usize;

    let index1 = r.u16_array(index1_len)?;
    let index2 = r.u16_array(index2_len)?;
    let index2a = r.u16_array(index2a_len)?;
    r.finish()?;

    EncodeTable::new(index1, index2, index2a, mask1, mask2, shift)
}

/// Serialize a decode table to the canonical blob layout.
pub fn write_decode_table(table: &DecodeTable) -> Vec<u8> {
    let (single, index1, index2, lead_mask) = table.raw_parts();
    let (mask2, shift, start, end, sentinel) = table.scalars();

    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    out.push(DIR_DECODE);

    out.extend_from_slice(&mask2.to_le_bytes());
    out.extend_from_slice(&(shift as u16).to_le_bytes());
    out.push(start);
    out.push(end);
    out.extend_from_slice(&sentinel.to_le_bytes());
    out.push(match table.trail_policy() {
        TrailPolicy::Substitute => 0,
        TrailPolicy::Report => 1,
    });

    out.extend_from_slice(&(single.len() as u32).to_le_bytes());
    out.extend_from_slice(&(index2.len() as u32).to_le_bytes());

    let mut mask_raw = [0u8; 32];
    for b in 0..256usize {
        if lead_mask[b / 64] & (1u64 << (b % 64)) != 0 {
            mask_raw[b / 8] |= 1 << (b % 8);
        }
    }
    out.extend_from_slice(&mask_raw);

    for &v in single.iter().chain(index1).chain(index2) {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Serialize an encode table to the canonical blob layout.
pub fn write_encode_table(table: &EncodeTable) -> Vec<u8> {
    let (index1, index2, index2a) = table.raw_parts();
    let (mask1, mask2, shift) = table.scalars();

    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    out.push(DIR_ENCODE);

    out.extend_from_slice(&mask1.to_le_bytes());
    out.extend_from_slice(&mask2.to_le_bytes());
    out.extend_from_slice(&(shift as u16).to_le_bytes());
    out.extend_from_slice(&(index1.len() as u32).to_le_bytes());
    out.extend_from_slice(&(index2.len() as u32).to_le_bytes());
    out.extend_from_slice(&(index2a.len() as u32).to_le_bytes());

    for &v in index1.iter().chain(index2).chain(index2a) {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Read a blob's header and scalar parameters without materializing the
/// table.
pub fn probe(blob: &[u8]) -> Result<TableInfo> {
    let mut r = Reader::new(blob);
    let direction = read_header(&mut r)?;
    match direction {
        DIR_DECODE => {
            let _mask2 = r.u16()?;
            let _shift = r.u16()?;
            let start = r.u8()?;
            let end = r.u8()?;
            let _sentinel = r.u16()?;
            let _policy = r.u8()?;
            let single_len = r.u32()? as usize;
            let index2_len = r.u32()? as usize;
            Ok(TableInfo {
                version: VERSION,
                direction: "decode",
                index1_entries: 256,
                data_entries: index2_len,
                single_entries: Some(single_len),
                trail_range: Some((start, end)),
            })
        }
        DIR_ENCODE => {
            let _mask1 = r.u16()?;
            let _mask2 = r.u16()?;
            let _shift = r.u16()?;
            let index1_len = r.u32()? as usize;
            let index2_len = r.u32()? as usize;
            let index2a_len = r.u32()? as usize;
            Ok(TableInfo {
                version: VERSION,
                direction: "encode",
                index1_entries: index1_len,
                data_entries: index2_len + index2a_len,
                single_entries: None,
                trail_range: None,
            })
        }
        other => Err(Error::InvalidTable(format!(
            "unknown direction tag {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::{demo_decode_table, demo_encode_table};

    #[test]
    fn decode_blob_round_trips() {
        let table = demo_decode_table(TrailPolicy::Report);
        let blob = write_decode_table(&table);
        let back = read_decode_table(&blob).unwrap();

        assert_eq!(back.trail_policy(), TrailPolicy::Report);
        assert_eq!(back.trail_start(), table.trail_start());
        assert_eq!(back.trail_end(), table.trail_end());
        for b in 0u16..256 {
            assert_eq!(back.is_lead(b as u8), table.is_lead(b as u8));
            assert_eq!(back.decode_single(b as u8), table.decode_single(b as u8));
            for t in 0u16..256 {
                assert_eq!(
                    back.decode_double(b as u8, t as u8),
                    table.decode_double(b as u8, t as u8)
                );
            }
        }
        // The serialization itself is stable, not just the behavior.
        assert_eq!(write_decode_table(&back), blob);
    }

    #[test]
    fn encode_blob_round_trips() {
        let table = demo_encode_table();
        let blob = write_encode_table(&table);
        let back = read_encode_table(&blob).unwrap();
        for unit in 0u32..=0xFFFF {
            assert_eq!(back.encode(unit as u16), table.encode(unit as u16));
        }
        assert_eq!(write_encode_table(&back), blob);
    }

    #[test]
    fn rejects_foreign_and_truncated_input() {
        assert!(read_decode_table(b"nope").is_err());
        assert!(read_decode_table(b"").is_err());

        let blob = write_decode_table(&demo_decode_table(TrailPolicy::Substitute));
        assert!(read_decode_table(&blob[..blob.len() - 3]).is_err());

        // Version bump must be refused, not misparsed.
        let mut wrong_version = blob.clone();
        wrong_version[4] = VERSION + 1;
        assert!(read_decode_table(&wrong_version).is_err());
    }

    #[test]
    fn direction_tags_are_enforced() {
        let dec = write_decode_table(&demo_decode_table(TrailPolicy::Substitute));
        let enc = write_encode_table(&demo_encode_table());
        assert!(read_encode_table(&dec).is_err());
        assert!(read_decode_table(&enc).is_err());
    }

    #[test]
    fn probe_reports_both_directions() {
        let dec = write_decode_table(&demo_decode_table(TrailPolicy::Substitute));
        let info = probe(&dec).unwrap();
        assert_eq!(info.direction, "decode");
        assert_eq!(info.trail_range, Some((0x40, 0x42)));
        assert_eq!(info.single_entries, Some(256));

        let enc = write_encode_table(&demo_encode_table());
        let info = probe(&enc).unwrap();
        assert_eq!(info.direction, "encode");
        assert_eq!(info.index1_entries, 256);
        assert_eq!(info.data_entries, 768);
    }
}
