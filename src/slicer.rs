//! Edge/level extractor
//!
//! Conditions the raw capture (leading dead-time trim, DC removal, peak
//! normalization) and slices it into discrete levels with hysteresis.
//! Two thresholds per boundary keep noise near a single threshold from
//! chattering: a sample that lands in the guard band carries the last
//! stable level forward. Output is the per-sample level sequence plus the
//! sample indices of every transition; the transition list is what the
//! symbol clock locks onto.

use tracing::debug;

use crate::capture::Capture;
use crate::config::DecodeConfig;
use crate::error::DecodeError;

/// Discrete line level. `Mid` is the 0 V rail of the ternary code; the
/// binary slicer never emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Mid,
    Low,
}

/// Slicing mode, derived from the line rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlicerMode {
    /// Two levels, Manchester.
    Binary,
    /// Three levels, MLT-3.
    Ternary,
}

/// Sliced capture: one level per retained sample, plus transition indices.
#[derive(Debug, Clone)]
pub struct SlicedSignal {
    pub levels: Vec<Level>,
    /// Indices into `levels` where the level differs from the previous
    /// sample, ascending.
    pub edges: Vec<usize>,
    /// Samples trimmed from the front of the capture as pre-trigger dead
    /// time. Offsets into the original capture are `index + trimmed`.
    pub trimmed: usize,
}

/// Hysteresis level slicer.
pub struct Slicer<'a> {
    config: &'a DecodeConfig,
    mode: SlicerMode,
}

impl<'a> Slicer<'a> {
    pub fn new(config: &'a DecodeConfig, mode: SlicerMode) -> Self {
        Self { config, mode }
    }

    /// Condition and slice a capture.
    ///
    /// # Errors
    /// `NoSignal` when no level transition occurs within the configured
    /// observation window from the start of activity.
    pub fn slice(&self, capture: &Capture) -> Result<SlicedSignal, DecodeError> {
        let (conditioned, trimmed) = condition(capture.samples(), self.config.activity_threshold);

        let levels = match self.mode {
            SlicerMode::Binary => self.slice_binary(&conditioned),
            SlicerMode::Ternary => self.slice_ternary(&conditioned),
        };

        let mut edges = Vec::new();
        for i in 1..levels.len() {
            if levels[i] != levels[i - 1] {
                edges.push(i);
            }
        }

        let window_samples =
            (self.config.no_signal_window_secs / capture.sample_interval()).ceil() as usize;
        let in_window = edges.first().map_or(false, |&e| e <= window_samples);
        if !in_window {
            return Err(DecodeError::NoSignal {
                window_secs: self.config.no_signal_window_secs,
            });
        }

        debug!(
            samples = levels.len(),
            edges = edges.len(),
            trimmed, "sliced capture"
        );
        Ok(SlicedSignal {
            levels,
            edges,
            trimmed,
        })
    }

    fn slice_binary(&self, samples: &[f64]) -> Vec<Level> {
        let hi = self.config.binary_high_threshold;
        let lo = self.config.binary_low_threshold;
        let mut level = Level::Low;
        samples
            .iter()
            .map(|&v| {
                if v >= hi {
                    level = Level::High;
                } else if v <= lo {
                    level = Level::Low;
                }
                // guard band: carry the last stable level forward
                level
            })
            .collect()
    }

    fn slice_ternary(&self, samples: &[f64]) -> Vec<Level> {
        let outer = self.config.ternary_threshold;
        let inner = self.config.ternary_mid_threshold;
        let mut level = Level::Mid;
        samples
            .iter()
            .map(|&v| {
                if v >= outer {
                    level = Level::High;
                } else if v <= -outer {
                    level = Level::Low;
                } else if v.abs() <= inner {
                    level = Level::Mid;
                }
                level
            })
            .collect()
    }
}

/// Trim leading dead time, remove DC, normalize to unit peak.
///
/// Returns the conditioned samples and the number trimmed from the front.
fn condition(samples: &[f64], activity_threshold: f64) -> (Vec<f64>, usize) {
    let peak = samples.iter().fold(0.0_f64, |m, &v| m.max(v.abs()));
    if peak == 0.0 {
        return (samples.to_vec(), 0);
    }

    // Dead time before the probe saw activity, relative to raw peak.
    let start = samples
        .iter()
        .position(|&v| v.abs() >= activity_threshold * peak)
        .unwrap_or(0);
    let active = &samples[start..];

    let mean = active.iter().sum::<f64>() / active.len() as f64;
    let centered: Vec<f64> = active.iter().map(|&v| v - mean).collect();
    let peak = centered.iter().fold(0.0_f64, |m, &v| m.max(v.abs()));
    if peak == 0.0 {
        return (centered, start);
    }
    (centered.iter().map(|v| v / peak).collect(), start)
}
