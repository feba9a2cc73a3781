//! FrameSink trait - boundary to the frame-analysis collaborator
//!
//! The pipeline validates and emits frames whether or not an external
//! analyzer is present; a sink failure is reported and counted, never
//! fatal, and delivery is strictly FIFO with no retries.

use thiserror::Error;

use crate::frame::Frame;

/// Reported by a collaborator that could not accept a frame.
#[derive(Debug, Error)]
#[error("frame sink failed: {0}")]
pub struct SinkError(pub String);

/// Consumer of finalized frames.
pub trait FrameSink {
    /// Accept one finalized frame.
    ///
    /// Frames arrive in assembly order. Returning an error does not stop
    /// the decode; the failure is counted and the next frame is still
    /// delivered.
    fn deliver(&mut self, frame: &Frame) -> Result<(), SinkError>;
}
