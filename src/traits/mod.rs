//! Cross-cutting traits of the decode pipeline
//!
//! Each trait is one seam: line decoding is the axis that varies with the
//! declared rate, and the frame sink is the boundary to the external
//! frame-analysis collaborator.

mod line_code;
mod sink;

pub use line_code::LineDecode;
pub use sink::{FrameSink, SinkError};
