//! Symbol clock recovery
//!
//! Estimates the symbol period from edge spacing and tracks phase with a
//! bounded proportional loop.

mod clock;

pub use clock::{estimate_symbol_period, ClockOutput, SymbolClock, SymbolDecision};
