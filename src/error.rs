//! Error taxonomy for the decode pipeline
//!
//! Only capture-level failures abort a run. Everything below the capture
//! layer (clock loss, Manchester violations, invalid ternary transitions,
//! descrambler seek timeouts) is absorbed where it occurs and surfaced as
//! reliability flags on bits and counters in [`DecodeStats`], never as an
//! `Err` to the caller. A partial frame is never reported as valid: every
//! recoverable error seen while a frame was open clears its `integrity_ok`.
//!
//! [`DecodeStats`]: crate::pipeline::DecodeStats

use thiserror::Error;

/// Fatal and signal-level errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The capture representation could not be parsed into numeric samples.
    #[error("capture format error: {0}")]
    Format(String),

    /// Parsing succeeded but produced zero samples.
    #[error("capture contains no samples")]
    EmptyCapture,

    /// No level transition was observed within the configured window.
    /// The wire is idle or not connected. Recoverable at the pipeline
    /// level: a run over such a capture yields zero frames, not a failure.
    #[error("no signal: no transitions within the first {window_secs} s of capture")]
    NoSignal { window_secs: f64 },

    /// Underlying I/O failure while reading a capture file.
    #[error("capture read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Whether this error must abort the run.
    ///
    /// `NoSignal` is the one caller-visible error the pipeline recovers
    /// from by emitting an empty report.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecodeError::NoSignal { .. })
    }
}
