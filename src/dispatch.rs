//! Frame delivery to the sink
//!
//! Frames go out in assembly order, one delivery attempt each. A sink
//! that refuses a frame gets a warning and a counter bump; the decode
//! never stops or retries on sink failure.

use tracing::warn;

use crate::frame::Frame;
use crate::traits::{FrameSink, SinkError};

/// In-memory sink that keeps every delivered frame.
#[derive(Debug, Default)]
pub struct CollectSink {
    frames: Vec<Frame>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl FrameSink for CollectSink {
    fn deliver(&mut self, frame: &Frame) -> Result<(), SinkError> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

/// FIFO dispatcher wrapping one sink for the duration of a decode.
pub struct Dispatcher<'a> {
    sink: &'a mut dyn FrameSink,
    delivered: u64,
    failures: u64,
}

impl<'a> Dispatcher<'a> {
    pub fn new(sink: &'a mut dyn FrameSink) -> Self {
        Self {
            sink,
            delivered: 0,
            failures: 0,
        }
    }

    /// Deliver one frame; failures are counted, not propagated.
    pub fn dispatch(&mut self, frame: &Frame) {
        match self.sink.deliver(frame) {
            Ok(()) => self.delivered += 1,
            Err(e) => {
                warn!(error = %e, bytes = frame.byte_length(), "sink refused frame");
                self.failures += 1;
            }
        }
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}
