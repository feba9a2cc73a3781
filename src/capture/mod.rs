//! Waveform source
//!
//! A [`Capture`] is the uniform in-memory representation every supported
//! oscilloscope export is normalized into: a voltage sample array plus the
//! sampling interval. Timestamps are derived (`t = index * interval`) and
//! strictly increasing by construction. The capture is immutable once
//! built; every downstream stage borrows it read-only.

mod bin;
mod csv;

pub use bin::{load_bin, read_bin, Channel};
pub use csv::{load_csv, read_csv, ScopeModel};

use crate::error::DecodeError;

/// An already-captured voltage waveform.
#[derive(Debug, Clone)]
pub struct Capture {
    samples: Vec<f64>,
    sample_interval: f64,
}

impl Capture {
    /// Build a capture from raw samples and a sampling interval.
    ///
    /// # Arguments
    /// * `samples` - Voltage samples, uniform spacing
    /// * `sample_interval` - Seconds between consecutive samples
    ///
    /// # Errors
    /// `EmptyCapture` when `samples` is empty, `Format` when the interval
    /// is not a positive finite number or any sample is non-finite.
    pub fn new(samples: Vec<f64>, sample_interval: f64) -> Result<Self, DecodeError> {
        if samples.is_empty() {
            return Err(DecodeError::EmptyCapture);
        }
        if !sample_interval.is_finite() || sample_interval <= 0.0 {
            return Err(DecodeError::Format(format!(
                "invalid sample interval {sample_interval}"
            )));
        }
        if let Some(idx) = samples.iter().position(|v| !v.is_finite()) {
            return Err(DecodeError::Format(format!(
                "non-finite sample at index {idx}"
            )));
        }
        Ok(Self {
            samples,
            sample_interval,
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Seconds between consecutive samples.
    pub fn sample_interval(&self) -> f64 {
        self.sample_interval
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total capture duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 * self.sample_interval
    }

    /// Timestamp of sample `index` in seconds from capture start.
    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 * self.sample_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_basic() {
        let cap = Capture::new(vec![0.0, 1.0, -1.0], 1e-9).unwrap();
        assert_eq!(cap.len(), 3);
        assert_eq!(cap.sample_interval(), 1e-9);
        assert!((cap.duration() - 3e-9).abs() < 1e-18);
        assert!((cap.time_at(2) - 2e-9).abs() < 1e-18);
    }

    #[test]
    fn test_empty_capture_rejected() {
        assert!(matches!(
            Capture::new(vec![], 1e-9),
            Err(DecodeError::EmptyCapture)
        ));
    }

    #[test]
    fn test_bad_interval_rejected() {
        assert!(matches!(
            Capture::new(vec![0.0], 0.0),
            Err(DecodeError::Format(_))
        ));
        assert!(matches!(
            Capture::new(vec![0.0], -1e-9),
            Err(DecodeError::Format(_))
        ));
    }

    #[test]
    fn test_non_finite_sample_rejected() {
        let err = Capture::new(vec![0.0, f64::NAN], 1e-9).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }
}
