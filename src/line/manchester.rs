//! Manchester decoder (10BASE-T)
//!
//! The symbol clock runs at the half-bit rate, so each bit is an ordered
//! pair of half-bit levels with the mandatory transition in the middle:
//! High→Low is a 1, Low→High is a 0 (the 10BASE-T convention, fixed).
//! A pair without the mid-bit transition is a violation: the decoder
//! emits a forced 0, drops one half-bit to realign, and continues. Long
//! violation runs are what an idle line looks like from here; the frame
//! layer uses them as the carrier-drop condition.

use crate::line::DecodedBit;
use crate::slicer::Level;
use crate::timing::SymbolDecision;
use crate::traits::LineDecode;

#[derive(Debug, Default)]
pub struct ManchesterDecoder {
    violations: u64,
}

impl ManchesterDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineDecode for ManchesterDecoder {
    fn decode(&mut self, decisions: &[SymbolDecision]) -> Vec<DecodedBit> {
        let mut bits = Vec::with_capacity(decisions.len() / 2);
        let mut i = 0;
        while i + 1 < decisions.len() {
            let a = decisions[i];
            let b = decisions[i + 1];
            let reliable = a.reliable && b.reliable;
            match (a.level, b.level) {
                (Level::High, Level::Low) => {
                    bits.push(DecodedBit {
                        value: true,
                        reliable,
                    });
                    i += 2;
                }
                (Level::Low, Level::High) => {
                    bits.push(DecodedBit {
                        value: false,
                        reliable,
                    });
                    i += 2;
                }
                _ => {
                    // missing mid-bit transition: force a bit and shift
                    // one half-bit to realign
                    self.violations += 1;
                    bits.push(DecodedBit::forced(false));
                    i += 1;
                }
            }
        }
        bits
    }

    fn violations(&self) -> u64 {
        self.violations
    }

    fn reset(&mut self) {
        self.violations = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decisions(levels: &[Level]) -> Vec<SymbolDecision> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| SymbolDecision {
                level,
                reliable: true,
                sample_index: i,
            })
            .collect()
    }

    #[test]
    fn test_decode_clean_bits() {
        use Level::{High as H, Low as L};
        // 1 0 1 1 0
        let d = decisions(&[H, L, L, H, H, L, H, L, L, H]);
        let mut dec = ManchesterDecoder::new();
        let bits = dec.decode(&d);
        let values: Vec<bool> = bits.iter().map(|b| b.value).collect();
        assert_eq!(values, vec![true, false, true, true, false]);
        assert!(bits.iter().all(|b| b.reliable));
        assert_eq!(dec.violations(), 0);
    }

    #[test]
    fn test_violation_forces_bit_and_realigns() {
        use Level::{High as H, Low as L};
        // 1, then a stuck Low half-bit, then 0 1
        let d = decisions(&[H, L, L, L, H, H, L]);
        let mut dec = ManchesterDecoder::new();
        let bits = dec.decode(&d);
        assert_eq!(dec.violations(), 1);
        assert!(bits.iter().any(|b| !b.reliable));
        // the clean bits around the violation still decode
        let clean: Vec<bool> = bits.iter().filter(|b| b.reliable).map(|b| b.value).collect();
        assert_eq!(clean, vec![true, false, true]);
    }

    #[test]
    fn test_clock_loss_propagates() {
        use Level::{High as H, Low as L};
        let mut d = decisions(&[H, L, L, H]);
        d[2].reliable = false;
        let mut dec = ManchesterDecoder::new();
        let bits = dec.decode(&d);
        assert!(bits[0].reliable);
        assert!(!bits[1].reliable);
    }

    #[test]
    fn test_idle_line_is_violation_run() {
        let d = decisions(&[Level::Low; 20]);
        let mut dec = ManchesterDecoder::new();
        let bits = dec.decode(&d);
        assert!(bits.iter().all(|b| !b.reliable));
        assert_eq!(dec.violations(), 19);
    }
}
