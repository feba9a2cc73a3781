//! LineDecode trait - symbol decisions to logical bits
//!
//! Implementations map symbol-clock decisions to a bit sequence with a
//! per-bit reliability flag. Line-code violations are absorbed here: the
//! decoder forces a bit, clears its reliability flag, and keeps going.
//! Nothing at this layer aborts.

use crate::line::DecodedBit;
use crate::timing::SymbolDecision;

/// Line decoding trait
///
/// One implementation per supported line code. Decoders are stateful
/// across calls (MLT-3 differentiates against the previous level) and
/// resettable between captures.
pub trait LineDecode {
    /// Decode a run of symbol decisions into bits.
    ///
    /// # Arguments
    /// * `decisions` - Symbol decisions in tick order
    ///
    /// # Returns
    /// Decoded bits in order; forced bits carry `reliable = false`
    fn decode(&mut self, decisions: &[SymbolDecision]) -> Vec<DecodedBit>;

    /// Line-code violations absorbed so far.
    fn violations(&self) -> u64;

    /// Reset decoder state for a fresh capture.
    fn reset(&mut self);
}
