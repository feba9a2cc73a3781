//! Line decoders
//!
//! Manchester for 10BASE-T, MLT-3 differential decoding for 100BASE-TX.
//! Both emit [`DecodedBit`]s; the reliability flag is the UNRELIABLE
//! marker channel consumed by the frame layer.

mod manchester;
mod mlt3;

pub use manchester::ManchesterDecoder;
pub use mlt3::Mlt3Decoder;

/// One logical bit with its reliability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedBit {
    pub value: bool,
    /// Cleared for forced bits (line-code violations) and for bits decided
    /// while the symbol clock had lost lock.
    pub reliable: bool,
}

impl DecodedBit {
    /// A cleanly decoded bit.
    pub fn good(value: bool) -> Self {
        Self {
            value,
            reliable: true,
        }
    }

    /// A forced recovery bit.
    pub fn forced(value: bool) -> Self {
        Self {
            value,
            reliable: false,
        }
    }
}
