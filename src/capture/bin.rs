//! Raw binary capture reader
//!
//! Rohde & Schwarz scopes dump waveforms as little-endian `f32` with no
//! header; the sample rate travels out of band. Two logical channels may
//! share one dump interleaved sample-by-sample, in which case a channel
//! selector picks the even or odd samples.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use super::Capture;
use crate::error::DecodeError;

/// Channel selector for two-channel interleaved dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    /// Even samples (first interleaved channel).
    A,
    /// Odd samples (second interleaved channel).
    B,
}

/// Read a raw little-endian `f32` dump into a [`Capture`].
///
/// # Arguments
/// * `reader` - Raw sample bytes
/// * `sample_rate` - Acquisition rate in Hz (of the full interleaved
///   stream; halved per channel when deinterleaving)
/// * `deinterleave` - `Some(channel)` to extract one of two interleaved
///   channels, `None` for a single-channel dump
///
/// # Errors
/// `Format` on a non-positive sample rate, `EmptyCapture` when the dump
/// holds no samples for the selected channel. A trailing partial sample
/// (truncated dump) is dropped.
pub fn read_bin<R: Read>(
    reader: R,
    sample_rate: f64,
    deinterleave: Option<Channel>,
) -> Result<Capture, DecodeError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(DecodeError::Format(format!(
            "invalid sample rate {sample_rate}"
        )));
    }

    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();
    loop {
        match reader.read_f32::<LittleEndian>() {
            Ok(v) => raw.push(v as f64),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
    }

    let (samples, interval) = match deinterleave {
        None => (raw, 1.0 / sample_rate),
        Some(ch) => {
            let start = match ch {
                Channel::A => 0,
                Channel::B => 1,
            };
            let picked: Vec<f64> = raw.into_iter().skip(start).step_by(2).collect();
            // Each channel sees every other sample of the shared clock.
            (picked, 2.0 / sample_rate)
        }
    };

    if samples.is_empty() {
        return Err(DecodeError::EmptyCapture);
    }
    Capture::new(samples, interval)
}

/// Read a raw `f32` dump from disk. See [`read_bin`].
pub fn load_bin<P: AsRef<Path>>(
    path: P,
    sample_rate: f64,
    deinterleave: Option<Channel>,
) -> Result<Capture, DecodeError> {
    read_bin(File::open(path)?, sample_rate, deinterleave)
}
