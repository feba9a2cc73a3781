//! Pipeline configuration
//!
//! Everything that was tunable (or hand-edited) in practice is an explicit
//! field here: slicing thresholds, clock loop gains, scrambler lock
//! budgets, frame length bounds. Nothing in the pipeline reads ambient
//! state. Defaults are the values validated against reference captures
//! from Tektronix and Rohde & Schwarz instruments.

use serde::{Deserialize, Serialize};

/// Supported line rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineRate {
    /// 10BASE-T: Manchester, no scrambling, carrier drop ends a frame.
    Mbps10,
    /// 100BASE-TX: 4B5B + scrambler + MLT-3, T/R delimiter ends a frame.
    Mbps100,
}

impl LineRate {
    /// Logical bit rate on the wire in bits/s (before 4B5B expansion).
    pub fn bit_rate(&self) -> f64 {
        match self {
            Self::Mbps10 => 10e6,
            Self::Mbps100 => 100e6,
        }
    }

    /// Symbol-clock rate in symbols/s.
    ///
    /// Manchester carries two half-bit symbols per bit, so the clock runs
    /// at twice the bit rate. MLT-3 runs at the 125 MBd code-group rate
    /// (100 Mbps × 5/4).
    pub fn symbol_rate(&self) -> f64 {
        match self {
            Self::Mbps10 => 20e6,
            Self::Mbps100 => 125e6,
        }
    }

    /// Whether the stream is scrambled on the wire.
    pub fn scrambled(&self) -> bool {
        matches!(self, Self::Mbps100)
    }
}

/// Complete decode configuration.
///
/// Constructed once and passed to [`Pipeline::new`]; the pipeline never
/// mutates it.
///
/// [`Pipeline::new`]: crate::pipeline::Pipeline::new
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeConfig {
    pub line_rate: LineRate,

    // --- signal conditioning / slicing ---
    /// Leading samples below this (normalized) magnitude are dead time
    /// before the capture triggered and are trimmed.
    pub activity_threshold: f64,
    /// Binary slicer: declare HIGH above this normalized voltage.
    pub binary_high_threshold: f64,
    /// Binary slicer: declare LOW below this normalized voltage.
    pub binary_low_threshold: f64,
    /// Ternary slicer: outer band threshold for the +1 / -1 rails.
    pub ternary_threshold: f64,
    /// Ternary slicer: inner bound of the 0 band. Samples between the
    /// inner and outer thresholds carry the previous level forward.
    pub ternary_mid_threshold: f64,
    /// Observation window for the no-signal check, in seconds.
    pub no_signal_window_secs: f64,

    // --- symbol clock ---
    /// Proportional gain of the phase tracking loop.
    pub phase_gain: f64,
    /// Per-tick phase correction bound, as a fraction of the symbol period.
    pub max_phase_correction: f64,
    /// Ticks without a qualifying edge before declaring clock loss.
    pub clock_loss_ticks: u32,

    // --- descrambler (100 Mbps only) ---
    /// Consecutive descrambled idle ones required to confirm a lock
    /// candidate.
    pub lock_run: usize,
    /// Scrambled bits the seek state may consume before a seek timeout is
    /// recorded. Seeking resumes with a fresh budget afterwards.
    pub seek_timeout_bits: u64,
    /// Minimum descrambled bits in LOCKED before a forced reseek is
    /// honored. Prevents lock/seek oscillation.
    pub min_lock_dwell: u64,
    /// Bits of descrambled output with no idle / start / end marker before
    /// the frame layer suspects a stale lock and requests a reseek.
    pub desync_threshold: u64,

    // --- framing ---
    /// Minimum alternating preamble bits before the SFD (Manchester path).
    pub min_preamble_bits: usize,
    /// Consecutive unreliable bits that close an open Manchester frame
    /// (carrier drop).
    pub end_idle_bits: usize,
    /// Bits allowed inside one frame before the open frame is abandoned.
    pub max_frame_bits: u64,
    /// Shortest legal frame in octets, FCS included. Shorter frames are
    /// discarded without emission.
    pub min_frame_bytes: usize,
    /// Longest legal frame in octets, FCS included.
    pub max_frame_bytes: usize,
    /// Verify the trailing CRC-32 when the frame is long enough to carry
    /// one. Disabled, length and reliability checks still apply.
    pub check_fcs: bool,
}

impl DecodeConfig {
    /// Configuration for a given line rate with default tuning.
    pub fn for_rate(line_rate: LineRate) -> Self {
        Self {
            line_rate,
            ..Self::default()
        }
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            line_rate: LineRate::Mbps10,
            activity_threshold: 0.05,
            binary_high_threshold: 0.1,
            binary_low_threshold: -0.1,
            ternary_threshold: 0.4,
            ternary_mid_threshold: 0.25,
            no_signal_window_secs: 1e-3,
            phase_gain: 0.1,
            max_phase_correction: 0.125,
            clock_loss_ticks: 32,
            lock_run: 40,
            seek_timeout_bits: 20_000,
            min_lock_dwell: 256,
            desync_threshold: 100,
            min_preamble_bits: 32,
            end_idle_bits: 16,
            max_frame_bits: 30_000,
            min_frame_bytes: 64,
            max_frame_bytes: 1518,
            check_fcs: true,
        }
    }
}
