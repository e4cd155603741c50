//! Shared miniature tables for the test suite
//!
//! A deliberately tiny double-byte encoding: ASCII in the single-byte
//! domain, lead bytes `0x81`..`0x83`, trail range `0x40`..=`0x42`. The
//! decode side maps both `81 40` and `82 42` to `U+4E00` so the suite can
//! pin down the documented non-bijective behavior of real legacy tables.

use crate::table::{DecodeTable, EncodeTable, TrailPolicy};

const START: u8 = 0x40;
const END: u8 = 0x42;
const SENTINEL: u16 = 0xFFFF;

/// Decode table for the miniature encoding.
///
/// Mappings: `81 40`→U+4E00, `81 41`→U+4E01, `81 42`→U+4E02,
/// `82 40`→U+4E10, `82 42`→U+4E00 (duplicate). Lead `0x83` carries the
/// sentinel descriptor.
pub(crate) fn demo_decode_table(trail_policy: TrailPolicy) -> DecodeTable {
    let single: Vec<u16> = (0u16..256)
        .map(|b| if b < 0x80 { b } else { 0xFFFD })
        .collect();

    let mut index1 = vec![SENTINEL; 256];
    index1[0x81] = 0; // block 0, row 0
    index1[0x82] = 1; // block 0, row 1

    let span = (END - START + 1) as usize;
    let mut index2 = vec![0xFFFDu16; 16 * span];
    index2[0] = 0x4E00;
    index2[1] = 0x4E01;
    index2[2] = 0x4E02;
    index2[span] = 0x4E10;
    index2[span + 2] = 0x4E00; // second byte sequence for U+4E00

    DecodeTable::new(
        single,
        index1,
        index2,
        &[0x81, 0x82, 0x83],
        0xF,
        4,
        START,
        END,
        SENTINEL,
        trail_policy,
    )
    .unwrap()
}

/// Encode table mirroring [`demo_decode_table`].
///
/// Every unit it maps round-trips through the decode table; `U+4E00`
/// encodes to `81 40` only, leaving `82 42` as the extra decode-side
/// spelling.
pub(crate) fn demo_encode_table() -> EncodeTable {
    let mut index1 = vec![512u16; 256];
    index1[0x00] = 0; // ASCII row
    index1[0x4E] = 256; // CJK row

    let mut index2 = vec![0u16; 768];
    for (low, slot) in index2.iter_mut().enumerate().take(0x80) {
        *slot = low as u16; // single-byte ASCII, high byte zero
    }
    index2[256] = 0x8140; // U+4E00
    index2[256 + 0x01] = 0x8141; // U+4E01
    index2[256 + 0x02] = 0x8142; // U+4E02
    index2[256 + 0x10] = 0x8240; // U+4E10

    EncodeTable::new(index1, index2, Vec::new(), 0xFF00, 0xFF, 8).unwrap()
}
