//! Frame synchronizer and assembler
//!
//! A state machine over the decoded (and, at 100 Mbps, descrambled) bit
//! stream: scan for the start delimiter, accumulate octets, close on the
//! line code's end condition, validate. At most one frame is open at a
//! time. Two framing modes:
//!
//! - Manchester: bit-level preamble scan (alternating run, then the SFD
//!   `11` terminator), octets LSB-first, carrier drop ends the frame.
//! - Code groups: the descrambled stream is 4B5B; idle ones + J/K open a
//!   stream, T/R closes it, nibbles pair low-first into octets, and the
//!   leading MAC preamble bytes + 0xD5 are stripped like the Manchester
//!   path.
//!
//! Unreliable bits inside a frame clear `integrity_ok` but never abort
//! assembly; best-effort payloads stay inspectable.

pub mod fcs;
pub mod fourb5b;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DecodeConfig;
use crate::line::DecodedBit;

/// Idle tail + J/K, as seen in the descrambled stream.
const START_MARKER: u16 = 0b111_1111_0001_0001;
/// T/R + idle ones.
const END_MARKER: u16 = 0b011_0100_1111_1111;
const MARKER_BITS: u32 = 15;
/// Four 5B-encoded preamble nibbles (0101) confirming a J/K match.
const CONFIRM_PATTERN: u32 = 0b0101_1010_1101_0110_1011;
const CONFIRM_BITS: u8 = 20;
/// Descrambled ones in a row that count as the idle marker.
const IDLE_RUN: u64 = 20;
/// Start-of-frame delimiter octet.
const SFD: u8 = 0xD5;
/// Preamble octet.
const PREAMBLE_OCTET: u8 = 0x55;
/// Preamble octets tolerated before the SFD must appear.
const MAX_PREAMBLE_OCTETS: usize = 16;

/// A finalized frame.
///
/// `payload` holds every octet after the SFD, FCS included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Bit offset into the decoded stream where the start delimiter was
    /// recognized.
    pub preamble_offset: usize,
    pub payload: Vec<u8>,
    /// False when any length, reliability, or FCS check failed. Never
    /// true for a frame that absorbed a recoverable error.
    pub integrity_ok: bool,
}

impl Frame {
    pub fn byte_length(&self) -> usize {
        self.payload.len()
    }
}

/// Framing mode, derived from the line rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingMode {
    Manchester,
    CodeGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// J/K matched; checking the 5B-encoded preamble that must follow.
    Confirm { acc: u32, count: u8 },
    InFrame,
}

/// Incremental frame assembler.
pub struct FrameAssembler<'a> {
    config: &'a DecodeConfig,
    mode: FramingMode,
    state: State,
    bit_index: u64,

    // idle scanning
    prev_bit: Option<bool>,
    alt_run: usize,
    marker_window: u16,
    marker_bits: u32,
    ones_run: u64,
    bits_since_marker: u64,

    // open frame
    frame_start_bit: u64,
    bytes: Vec<u8>,
    cur_byte: u8,
    nbits: u8,
    frame_bits: u64,
    frame_unreliable: bool,
    junk: Vec<DecodedBit>,

    // code-group assembly
    group: u8,
    group_bits: u8,
    group_unreliable: bool,
    pending: Option<(u8, bool)>,
    nibble_lo: Option<(u8, bool)>,
    sfd_seen: bool,
    pre_octets: usize,

    short_discards: u64,
    aborted: u64,
}

impl<'a> FrameAssembler<'a> {
    pub fn new(config: &'a DecodeConfig, mode: FramingMode) -> Self {
        Self {
            config,
            mode,
            state: State::Idle,
            bit_index: 0,
            prev_bit: None,
            alt_run: 0,
            marker_window: 0,
            marker_bits: 0,
            ones_run: 0,
            bits_since_marker: 0,
            frame_start_bit: 0,
            bytes: Vec::new(),
            cur_byte: 0,
            nbits: 0,
            frame_bits: 0,
            frame_unreliable: false,
            junk: Vec::new(),
            group: 0,
            group_bits: 0,
            group_unreliable: false,
            pending: None,
            nibble_lo: None,
            sfd_seen: false,
            pre_octets: 0,
            short_discards: 0,
            aborted: 0,
        }
    }

    /// Frames discarded for falling short of the minimum legal length.
    pub fn short_discards(&self) -> u64 {
        self.short_discards
    }

    /// Open frames abandoned (timeout, missing SFD, input exhausted).
    pub fn aborted(&self) -> u64 {
        self.aborted
    }

    /// While idle-scanning the code-group stream: no idle / start / end
    /// marker for longer than the desync threshold. The caller reacts by
    /// forcing a descrambler reseek.
    pub fn desync_suspected(&self) -> bool {
        self.mode == FramingMode::CodeGroup
            && self.state == State::Idle
            && self.bits_since_marker > self.config.desync_threshold
    }

    /// Drop scan state after the caller forced a reseek; descrambled
    /// output restarts from a fresh lock.
    pub fn reset_scan(&mut self) {
        self.state = State::Idle;
        self.prev_bit = None;
        self.alt_run = 0;
        self.marker_window = 0;
        self.marker_bits = 0;
        self.ones_run = 0;
        self.bits_since_marker = 0;
    }

    /// Consume one decoded bit; returns a frame when one is finalized.
    pub fn push_bit(&mut self, bit: DecodedBit) -> Option<Frame> {
        self.bit_index += 1;
        match self.mode {
            FramingMode::Manchester => self.push_manchester(bit),
            FramingMode::CodeGroup => self.push_code_group(bit),
        }
    }

    /// Input exhausted: close an open frame if the mode allows it.
    ///
    /// Capture end is a legitimate carrier drop for Manchester. A
    /// code-group frame with no T/R is emitted integrity-failed when
    /// enough of it arrived, otherwise abandoned.
    pub fn finish(&mut self) -> Option<Frame> {
        if self.state != State::InFrame {
            return None;
        }
        match self.mode {
            FramingMode::Manchester => self.close_manchester_frame(),
            FramingMode::CodeGroup => self.close_truncated_code_group_frame(),
        }
    }

    // --- Manchester path ---

    fn push_manchester(&mut self, bit: DecodedBit) -> Option<Frame> {
        match self.state {
            State::Idle => {
                self.scan_preamble(bit);
                None
            }
            State::InFrame => self.manchester_frame_bit(bit),
            State::Confirm { .. } => unreachable!("confirm is a code-group state"),
        }
    }

    fn scan_preamble(&mut self, bit: DecodedBit) {
        let b = bit.value;
        match self.prev_bit {
            Some(p) if p != b => self.alt_run += 1,
            Some(p) => {
                if b && p && self.alt_run >= self.config.min_preamble_bits {
                    let offset = (self.bit_index - 1).saturating_sub(self.alt_run as u64);
                    debug!(offset, run = self.alt_run, "preamble + SFD");
                    self.open_frame(offset);
                    return;
                }
                self.alt_run = 1;
            }
            None => self.alt_run = 1,
        }
        self.prev_bit = Some(b);
    }

    fn manchester_frame_bit(&mut self, bit: DecodedBit) -> Option<Frame> {
        if !bit.reliable {
            // possible carrier drop; hold junk out of the payload until
            // proven otherwise
            self.junk.push(bit);
            if self.junk.len() >= self.config.end_idle_bits {
                return self.close_manchester_frame();
            }
            return None;
        }

        if !self.junk.is_empty() {
            // noise inside the frame, not a carrier drop
            let junk: Vec<DecodedBit> = std::mem::take(&mut self.junk);
            self.frame_unreliable = true;
            for j in junk {
                self.push_frame_bit(j.value);
            }
        }
        self.push_frame_bit(bit.value);

        if self.frame_bits > self.config.max_frame_bits {
            warn!(bits = self.frame_bits, "frame overran bit budget, abandoning");
            self.aborted += 1;
            self.to_idle();
            return None;
        }
        None
    }

    fn close_manchester_frame(&mut self) -> Option<Frame> {
        self.junk.clear();
        if self.nbits > 0 {
            // bits that do not fill an octet are lost information
            self.frame_unreliable = true;
        }
        self.validate_and_emit()
    }

    // --- code-group path ---

    fn push_code_group(&mut self, bit: DecodedBit) -> Option<Frame> {
        match self.state {
            State::Idle => {
                self.update_marker_scan(bit.value);
                self.bits_since_marker += 1;
                if self.marker_seen() {
                    self.bits_since_marker = 0;
                }
                if self.marker_bits >= MARKER_BITS && self.marker_window == START_MARKER {
                    self.frame_start_bit = self.bit_index.saturating_sub(MARKER_BITS as u64);
                    self.state = State::Confirm { acc: 0, count: 0 };
                }
                None
            }
            State::Confirm { acc, count } => {
                self.update_marker_scan(bit.value);
                let acc = (acc << 1) | bit.value as u32;
                let count = count + 1;
                if count < CONFIRM_BITS {
                    self.state = State::Confirm { acc, count };
                } else if acc == CONFIRM_PATTERN {
                    let offset = self.frame_start_bit;
                    debug!(offset, "J/K start-of-stream");
                    self.open_frame(offset);
                } else {
                    // not a real start; the marker window kept scanning
                    self.state = State::Idle;
                }
                None
            }
            State::InFrame => self.code_group_bit(bit),
        }
    }

    fn update_marker_scan(&mut self, value: bool) {
        self.marker_window = ((self.marker_window << 1) | value as u16) & 0x7FFF;
        self.marker_bits += 1;
        if value {
            self.ones_run += 1;
        } else {
            self.ones_run = 0;
        }
    }

    fn marker_seen(&self) -> bool {
        self.ones_run >= IDLE_RUN
            || (self.marker_bits >= MARKER_BITS
                && (self.marker_window == START_MARKER || self.marker_window == END_MARKER))
    }

    fn code_group_bit(&mut self, bit: DecodedBit) -> Option<Frame> {
        self.frame_bits += 1;
        self.group = (self.group << 1) | bit.value as u8;
        self.group_bits += 1;
        self.group_unreliable |= !bit.reliable;
        if self.group_bits < 5 {
            return None;
        }

        let group = self.group;
        let unreliable = self.group_unreliable;
        self.group = 0;
        self.group_bits = 0;
        self.group_unreliable = false;

        if let Some((prev, _)) = self.pending {
            if prev == fourb5b::T && group == fourb5b::R {
                self.pending = None;
                return self.close_code_group_frame();
            }
        }
        if let Some((prev, prev_unreliable)) = self.pending.take() {
            self.process_group(prev, prev_unreliable);
            if self.state != State::InFrame {
                // SFD never arrived; scan state already reset
                return None;
            }
        }
        self.pending = Some((group, unreliable));

        if self.frame_bits > self.config.max_frame_bits {
            warn!(bits = self.frame_bits, "no end delimiter within bit budget");
            return self.close_truncated_code_group_frame();
        }
        None
    }

    fn process_group(&mut self, group: u8, unreliable: bool) {
        match fourb5b::decode_group(group) {
            Some(nibble) => self.push_nibble(nibble, unreliable),
            None => {
                // code violation inside the stream: forced nibble
                self.frame_unreliable = true;
                self.push_nibble(0, true);
            }
        }
    }

    fn push_nibble(&mut self, nibble: u8, unreliable: bool) {
        match self.nibble_lo.take() {
            None => self.nibble_lo = Some((nibble, unreliable)),
            Some((lo, lo_unreliable)) => {
                let byte = lo | (nibble << 4);
                self.push_frame_byte(byte, lo_unreliable || unreliable);
            }
        }
    }

    fn push_frame_byte(&mut self, byte: u8, unreliable: bool) {
        if !self.sfd_seen {
            if byte == SFD {
                self.sfd_seen = true;
            } else if byte == PREAMBLE_OCTET && self.pre_octets < MAX_PREAMBLE_OCTETS {
                self.pre_octets += 1;
            } else {
                debug!(byte, "expected preamble/SFD, abandoning stream");
                self.aborted += 1;
                self.to_idle();
            }
            return;
        }
        if unreliable {
            self.frame_unreliable = true;
        }
        self.bytes.push(byte);
    }

    fn close_code_group_frame(&mut self) -> Option<Frame> {
        if !self.sfd_seen {
            self.aborted += 1;
            self.to_idle();
            return None;
        }
        if self.nibble_lo.is_some() {
            // T/R landed off the octet boundary
            self.frame_unreliable = true;
        }
        self.validate_and_emit()
    }

    /// No end delimiter: emit integrity-failed when enough arrived to be
    /// worth inspecting, abandon otherwise.
    fn close_truncated_code_group_frame(&mut self) -> Option<Frame> {
        if self.sfd_seen && self.bytes.len() >= self.config.min_frame_bytes {
            self.frame_unreliable = true;
            return self.validate_and_emit();
        }
        self.aborted += 1;
        self.to_idle();
        None
    }

    // --- shared ---

    fn open_frame(&mut self, preamble_offset: u64) {
        self.state = State::InFrame;
        self.frame_start_bit = preamble_offset;
        self.bytes.clear();
        self.cur_byte = 0;
        self.nbits = 0;
        self.frame_bits = 0;
        self.frame_unreliable = false;
        self.junk.clear();
        self.group = 0;
        self.group_bits = 0;
        self.group_unreliable = false;
        self.pending = None;
        self.nibble_lo = None;
        self.sfd_seen = false;
        self.pre_octets = 0;
    }

    fn push_frame_bit(&mut self, value: bool) {
        self.cur_byte |= (value as u8) << self.nbits;
        self.nbits += 1;
        self.frame_bits += 1;
        if self.nbits == 8 {
            self.bytes.push(self.cur_byte);
            self.cur_byte = 0;
            self.nbits = 0;
        }
    }

    fn to_idle(&mut self) {
        self.state = State::Idle;
        self.bytes.clear();
        self.junk.clear();
        self.pending = None;
        self.nibble_lo = None;
        self.prev_bit = None;
        self.alt_run = 0;
        self.marker_window = 0;
        self.marker_bits = 0;
        self.ones_run = 0;
        self.bits_since_marker = 0;
    }

    fn validate_and_emit(&mut self) -> Option<Frame> {
        let payload = std::mem::take(&mut self.bytes);
        let unreliable = self.frame_unreliable;
        let preamble_offset = self.frame_start_bit as usize;
        self.to_idle();

        if payload.len() < self.config.min_frame_bytes {
            warn!(
                bytes = payload.len(),
                min = self.config.min_frame_bytes,
                "short frame discarded"
            );
            self.short_discards += 1;
            return None;
        }

        let mut integrity_ok = !unreliable && payload.len() <= self.config.max_frame_bytes;
        if self.config.check_fcs {
            integrity_ok = integrity_ok && fcs::verify(&payload);
        }
        debug!(
            bytes = payload.len(),
            integrity_ok, preamble_offset, "frame finalized"
        );
        Some(Frame {
            preamble_offset,
            payload,
            integrity_ok,
        })
    }
}
