//! Decode and encode state machines over bounded windows
//!
//! A [`Decoder`] turns a bounded byte window into code units, an
//! [`Encoder`] does the reverse. Both are per-stream objects: they borrow
//! an immutable table, carry cumulative counters, and continue where the
//! previous call left off when the caller presents the unconsumed tail of
//! the input again. Neither performs any I/O; filling and draining the
//! windows is entirely the caller's concern.
//!
//! Every call terminates with a [`CoderStatus`]. Underflow and Overflow
//! are the normal pausing conditions of window-based conversion, not
//! errors; Malformed and Unmappable report the exact offending length so
//! the caller can substitute, skip, or abort.

use crate::policy::ReplacementPolicy;
use crate::table::{DecodeTable, EncodeTable, EncodedUnit, TrailPolicy};

/// Why a decode or encode call stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoderStatus {
    /// The input window was fully consumed.
    Done,
    /// The input window ends in the middle of a multi-byte sequence; the
    /// partial sequence was not consumed. Supply more input and call
    /// again.
    Underflow,
    /// The output window is full; the input that would not fit was not
    /// consumed. Drain the output and call again.
    Overflow,
    /// The next `length` input elements cannot be interpreted under this
    /// table's rules at all. They sit at the consumed position, ready to
    /// be skipped or re-examined.
    Malformed(usize),
    /// The next `length` input elements are syntactically valid but have
    /// no mapping, and no replacement is configured.
    Unmappable(usize),
}

impl CoderStatus {
    /// Whether this status reports bad input rather than a window limit.
    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, CoderStatus::Malformed(_) | CoderStatus::Unmappable(_))
    }
}

/// Outcome of one [`Decoder::decode`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeResult {
    /// Why the call stopped.
    pub status: CoderStatus,
    /// Bytes consumed from the front of the input window.
    pub bytes_consumed: usize,
    /// Code units written to the front of the output window.
    pub units_produced: usize,
}

/// Outcome of one [`Encoder::encode`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeResult {
    /// Why the call stopped.
    pub status: CoderStatus,
    /// Code units consumed from the front of the input window.
    pub units_consumed: usize,
    /// Bytes written to the front of the output window.
    pub bytes_produced: usize,
}

/// Streaming byte-to-code-unit converter for one logical stream.
///
/// Cheap to create; borrows its table, so any number of decoders can run
/// over the same table concurrently. A decoder itself must stay confined
/// to one stream: calls continue from where the previous one stopped.
pub struct Decoder<'t> {
    table: &'t DecodeTable,
    policy: ReplacementPolicy,
    total_in: usize,
    total_out: usize,
}

impl<'t> Decoder<'t> {
    /// Start a decode session with the table's own replacement policy.
    pub fn new(table: &'t DecodeTable) -> Self {
        Self::with_policy(table, table.policy())
    }

    /// Start a decode session with a caller-chosen replacement policy.
    pub fn with_policy(table: &'t DecodeTable, policy: ReplacementPolicy) -> Self {
        Self {
            table,
            policy,
            total_in: 0,
            total_out: 0,
        }
    }

    /// Total bytes consumed over the lifetime of this session.
    pub fn bytes_consumed(&self) -> usize {
        self.total_in
    }

    /// Total code units produced over the lifetime of this session.
    pub fn units_produced(&self) -> usize {
        self.total_out
    }

    /// Forget the session counters and start a fresh stream.
    pub fn reset(&mut self) {
        self.total_in = 0;
        self.total_out = 0;
    }

    /// Decode as much of `src` into `dst` as the two windows allow.
    ///
    /// Consumed bytes are always a whole number of characters; a dangling
    /// lead byte at the end of `src` stops the call with
    /// [`CoderStatus::Underflow`] and stays unconsumed, even when the
    /// caller has no further input. On [`CoderStatus::Malformed`] the
    /// offending bytes start at `src[bytes_consumed]`.
    pub fn decode(&mut self, src: &[u8], dst: &mut [u16]) -> DecodeResult {
        let mut ip = 0;
        let mut op = 0;

        let status = loop {
            if ip >= src.len() {
                break CoderStatus::Done;
            }
            let b = src[ip];

            if !self.table.is_lead(b) {
                if op >= dst.len() {
                    break CoderStatus::Overflow;
                }
                dst[op] = self
                    .table
                    .lookup_single(b)
                    .unwrap_or_else(|| self.policy.unit());
                ip += 1;
                op += 1;
                continue;
            }

            // Prospective lead byte: a trail byte must be available.
            if ip + 1 >= src.len() {
                break CoderStatus::Underflow;
            }
            let trail = src[ip + 1];
            if (trail < self.table.trail_start() || trail > self.table.trail_end())
                && self.table.trail_policy() == TrailPolicy::Report
            {
                break CoderStatus::Malformed(2);
            }
            if op >= dst.len() {
                break CoderStatus::Overflow;
            }
            dst[op] = self
                .table
                .lookup_double(b, trail)
                .unwrap_or_else(|| self.policy.unit());
            ip += 2;
            op += 1;
        };

        self.total_in += ip;
        self.total_out += op;
        DecodeResult {
            status,
            bytes_consumed: ip,
            units_produced: op,
        }
    }
}

/// Streaming code-unit-to-byte converter for one logical stream.
pub struct Encoder<'t> {
    table: &'t EncodeTable,
    policy: ReplacementPolicy,
    total_in: usize,
    total_out: usize,
}

impl<'t> Encoder<'t> {
    /// Start an encode session that reports unmappable code units.
    pub fn new(table: &'t EncodeTable) -> Self {
        Self::with_policy(table, ReplacementPolicy::default())
    }

    /// Start an encode session with a caller-chosen replacement policy.
    ///
    /// With replacement bytes configured, unmappable code units are
    /// substituted and the stream keeps going.
    pub fn with_policy(table: &'t EncodeTable, policy: ReplacementPolicy) -> Self {
        Self {
            table,
            policy,
            total_in: 0,
            total_out: 0,
        }
    }

    /// Total code units consumed over the lifetime of this session.
    pub fn units_consumed(&self) -> usize {
        self.total_in
    }

    /// Total bytes produced over the lifetime of this session.
    pub fn bytes_produced(&self) -> usize {
        self.total_out
    }

    /// Forget the session counters and start a fresh stream.
    pub fn reset(&mut self) {
        self.total_in = 0;
        self.total_out = 0;
    }

    /// Encode as much of `src` into `dst` as the two windows allow.
    ///
    /// A code unit is consumed only once its full byte sequence fits in
    /// the output window; a two-byte mapping meeting a one-byte gap stops
    /// with [`CoderStatus::Overflow`] and nothing half-written.
    pub fn encode(&mut self, src: &[u16], dst: &mut [u8]) -> EncodeResult {
        let mut ip = 0;
        let mut op = 0;

        let status = loop {
            if ip >= src.len() {
                break CoderStatus::Done;
            }
            let unit = match self.table.encode(src[ip]) {
                Some(u) => u,
                None => match self.policy.bytes() {
                    Some(r) => r,
                    None => break CoderStatus::Unmappable(1),
                },
            };
            match unit {
                EncodedUnit::Single(b) => {
                    if op >= dst.len() {
                        break CoderStatus::Overflow;
                    }
                    dst[op] = b;
                    op += 1;
                }
                EncodedUnit::Double(lead, trail) => {
                    if op + 2 > dst.len() {
                        break CoderStatus::Overflow;
                    }
                    dst[op] = lead;
                    dst[op + 1] = trail;
                    op += 2;
                }
            }
            ip += 1;
        };

        self.total_in += ip;
        self.total_out += op;
        EncodeResult {
            status,
            units_consumed: ip,
            bytes_produced: op,
        }
    }
}
