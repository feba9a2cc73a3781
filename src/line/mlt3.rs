//! MLT-3 decoder (100BASE-TX)
//!
//! MLT-3 cycles through 0, +1, 0, -1 on every logical 1 and holds the
//! level on a 0, so decoding is differential: a level change between
//! consecutive symbol ticks is a 1, a repeat is a 0. A direct +1 ↔ -1
//! jump never occurs in a legal MLT-3 sequence (the code always passes
//! through 0); when the slicer reports one, a forced 1 is emitted and
//! flagged.

use crate::line::DecodedBit;
use crate::slicer::Level;
use crate::timing::SymbolDecision;
use crate::traits::LineDecode;

#[derive(Debug, Default)]
pub struct Mlt3Decoder {
    prev: Option<Level>,
    violations: u64,
}

impl Mlt3Decoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineDecode for Mlt3Decoder {
    fn decode(&mut self, decisions: &[SymbolDecision]) -> Vec<DecodedBit> {
        let mut bits = Vec::with_capacity(decisions.len());
        for d in decisions {
            let Some(prev) = self.prev else {
                // first tick has no reference level, no bit yet
                self.prev = Some(d.level);
                continue;
            };
            let bit = if d.level == prev {
                DecodedBit {
                    value: false,
                    reliable: d.reliable,
                }
            } else if rail_jump(prev, d.level) {
                self.violations += 1;
                DecodedBit::forced(true)
            } else {
                DecodedBit {
                    value: true,
                    reliable: d.reliable,
                }
            };
            bits.push(bit);
            self.prev = Some(d.level);
        }
        bits
    }

    fn violations(&self) -> u64 {
        self.violations
    }

    fn reset(&mut self) {
        self.prev = None;
        self.violations = 0;
    }
}

/// Direct transition between the +1 and -1 rails.
fn rail_jump(a: Level, b: Level) -> bool {
    matches!(
        (a, b),
        (Level::High, Level::Low) | (Level::Low, Level::High)
    )
}
