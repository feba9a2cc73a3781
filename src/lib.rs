//! PHY Decode - Ethernet frame recovery from oscilloscope captures
//!
//! This crate turns raw analog voltage captures taken off twisted-pair
//! cable into byte-aligned Ethernet frames. Two line codes are covered:
//! Manchester (10BASE-T) and MLT-3 with the x^11 + x^9 + 1 side-stream
//! scrambler (100BASE-TX). Frame field interpretation (MAC addresses,
//! EtherType, payload semantics) is left to an external collaborator
//! behind the [`FrameSink`] trait.
//!
//! The pipeline is a single-pass, deterministic transformation:
//! samples → level events → symbol clock → line decode → descramble
//! (100 Mbps only) → frame sync/assembly → dispatch.

pub mod capture;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod line;
pub mod pipeline;
pub mod scramble;
pub mod slicer;
pub mod timing;
pub mod traits;

#[cfg(test)]
pub(crate) mod testgen;

// Re-export core types for convenience
pub use capture::Capture;
pub use config::{DecodeConfig, LineRate};
pub use dispatch::{CollectSink, Dispatcher};
pub use error::DecodeError;
pub use frame::Frame;
pub use pipeline::{DecodeReport, DecodeStats, Pipeline};
pub use traits::{FrameSink, LineDecode};
