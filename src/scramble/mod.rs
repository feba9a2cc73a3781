//! Side-stream descrambler (100BASE-TX)
//!
//! The transmitter whitens the 4B5B stream with a free-running 11-bit
//! LFSR (x^11 + x^9 + 1) and the receiver must run the same register in
//! phase. Because the scrambler is additive, the register never takes
//! line input once synchronized; synchronization is the whole problem,
//! and it is solved here as an explicit two-state machine.
//!
//! SEEKING exploits the idle line: between frames the transmitter sends
//! continuous ones, so the keystream is simply the received bits
//! inverted. Eleven consecutive scrambled bits under that assumption
//! seed the register directly; the candidate is confirmed by
//! descrambling the rest of the observation window and requiring an
//! unbroken run of idle ones. A failed candidate slides the window one
//! bit. LOCKED descrambles continuously and only returns to SEEKING on
//! an explicit request from the frame layer, rate-limited by a minimum
//! dwell so a marginal lock cannot oscillate.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::config::DecodeConfig;
use crate::line::DecodedBit;

/// Scrambler polynomial width in bits.
pub const LFSR_WIDTH: usize = 11;

const LFSR_MASK: u16 = (1 << LFSR_WIDTH) - 1;

/// Descrambler synchronization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Searching for register phase against the idle pattern.
    Seeking,
    /// Register in phase with the transmitter; descrambling.
    Locked,
}

/// Receiver-side descrambler with lock tracking.
pub struct Descrambler {
    lock_run: usize,
    seek_timeout_bits: u64,
    min_lock_dwell: u64,
    state: LockState,
    lfsr: u16,
    window: VecDeque<DecodedBit>,
    seek_bits: u64,
    bits_since_lock: u64,
    seek_timeouts: u64,
    locks_acquired: u64,
}

impl Descrambler {
    pub fn new(config: &DecodeConfig) -> Self {
        Self {
            lock_run: config.lock_run,
            seek_timeout_bits: config.seek_timeout_bits,
            min_lock_dwell: config.min_lock_dwell,
            state: LockState::Seeking,
            lfsr: 0,
            window: VecDeque::with_capacity(LFSR_WIDTH + config.lock_run),
            seek_bits: 0,
            bits_since_lock: 0,
            seek_timeouts: 0,
            locks_acquired: 0,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    /// Distinct locks acquired over the run.
    pub fn locks_acquired(&self) -> u64 {
        self.locks_acquired
    }

    /// Seek episodes that exhausted their bit budget.
    pub fn seek_timeouts(&self) -> u64 {
        self.seek_timeouts
    }

    /// Consume one scrambled bit, appending any descrambled output.
    ///
    /// While SEEKING nothing is emitted until a lock candidate confirms,
    /// at which point the whole observation window is emitted at once
    /// (it descrambles to idle ones by construction).
    pub fn push(&mut self, bit: DecodedBit, out: &mut Vec<DecodedBit>) {
        match self.state {
            LockState::Locked => {
                let k = self.keystream();
                out.push(DecodedBit {
                    value: bit.value ^ (k == 1),
                    reliable: bit.reliable,
                });
                self.shift(k);
                self.bits_since_lock += 1;
            }
            LockState::Seeking => {
                self.window.push_back(bit);
                self.seek_bits += 1;

                if self.window.len() == LFSR_WIDTH + self.lock_run {
                    if let Some(register) = self.try_lock() {
                        self.lfsr = register;
                        self.state = LockState::Locked;
                        self.bits_since_lock = self.window.len() as u64;
                        self.locks_acquired += 1;
                        self.seek_bits = 0;
                        debug!(register, "descrambler locked");
                        // window descrambles to idle ones under the
                        // confirmed hypothesis
                        out.extend(self.window.drain(..).map(|b| DecodedBit {
                            value: true,
                            reliable: b.reliable,
                        }));
                        return;
                    }
                    self.window.pop_front();
                }

                if self.seek_bits >= self.seek_timeout_bits {
                    self.seek_timeouts += 1;
                    self.seek_bits = 0;
                    warn!(
                        budget = self.seek_timeout_bits,
                        "descrambler seek timeout, continuing"
                    );
                }
            }
        }
    }

    /// Forced return to SEEKING, requested by the frame layer when the
    /// descrambled stream stops producing markers.
    ///
    /// # Returns
    /// `true` when honored; `false` while the minimum lock dwell has not
    /// elapsed (or the descrambler is already seeking).
    pub fn force_reseek(&mut self) -> bool {
        if self.state != LockState::Locked || self.bits_since_lock < self.min_lock_dwell {
            return false;
        }
        debug!(
            dwell = self.bits_since_lock,
            "forced reseek, dropping lock"
        );
        self.state = LockState::Seeking;
        self.window.clear();
        self.seek_bits = 0;
        self.bits_since_lock = 0;
        true
    }

    /// Seed a register from the window head under the idle assumption
    /// and confirm it against the rest of the window.
    ///
    /// Returns the register state after consuming the full window.
    fn try_lock(&self) -> Option<u16> {
        // idle plaintext is all ones, so keystream = scrambled ^ 1;
        // the register holds the last LFSR_WIDTH keystream bits, newest
        // in bit 0
        let mut register: u16 = 0;
        for i in 0..LFSR_WIDTH {
            let k = (self.window[i].value as u16) ^ 1;
            register |= k << (LFSR_WIDTH - 1 - i);
        }

        for i in LFSR_WIDTH..self.window.len() {
            let k = ((register >> 8) ^ (register >> 10)) & 1;
            if (self.window[i].value as u16) ^ k != 1 {
                return None;
            }
            register = ((register << 1) | k) & LFSR_MASK;
        }
        Some(register)
    }

    fn keystream(&self) -> u16 {
        ((self.lfsr >> 8) ^ (self.lfsr >> 10)) & 1
    }

    fn shift(&mut self, k: u16) {
        self.lfsr = ((self.lfsr << 1) | k) & LFSR_MASK;
    }
}

/// Transmit-side scrambler, used to build test fixtures.
#[cfg(test)]
pub(crate) fn scramble(bits: &[bool], seed: u16) -> Vec<bool> {
    let mut lfsr = seed & LFSR_MASK;
    bits.iter()
        .map(|&b| {
            let k = ((lfsr >> 8) ^ (lfsr >> 10)) & 1;
            lfsr = ((lfsr << 1) | k) & LFSR_MASK;
            b ^ (k == 1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DecodeConfig, LineRate};
    use crate::line::DecodedBit;

    fn config() -> DecodeConfig {
        DecodeConfig::for_rate(LineRate::Mbps100)
    }

    fn push_all(d: &mut Descrambler, bits: &[bool]) -> Vec<DecodedBit> {
        let mut out = Vec::new();
        for &b in bits {
            d.push(DecodedBit::good(b), &mut out);
        }
        out
    }

    #[test]
    fn test_locks_on_scrambled_idle() {
        let cfg = config();
        let idle = vec![true; 200];
        let scrambled = scramble(&idle, 0x2AB);
        let mut d = Descrambler::new(&cfg);
        let out = push_all(&mut d, &scrambled);
        assert_eq!(d.state(), LockState::Locked);
        assert_eq!(d.locks_acquired(), 1);
        // lock confirmed within one observation window
        assert!(out.len() >= 200 - (LFSR_WIDTH + cfg.lock_run));
        assert!(out.iter().all(|b| b.value), "descrambled idle must be ones");
    }

    #[test]
    fn test_descrambles_data_after_lock() {
        let cfg = config();
        let mut plain = vec![true; 120];
        let data: Vec<bool> = (0..400).map(|i| (i * 7 + i / 3) % 5 < 2).collect();
        plain.extend(&data);
        let scrambled = scramble(&plain, 0x7FF);

        let mut d = Descrambler::new(&cfg);
        let out = push_all(&mut d, &scrambled);
        // everything from the first emitted bit on matches the plaintext
        let skipped = plain.len() - out.len();
        let recovered: Vec<bool> = out.iter().map(|b| b.value).collect();
        assert_eq!(&recovered[..], &plain[skipped..]);
    }

    #[test]
    fn test_zero_seed_transmitter() {
        // a zero register scrambles to the identity; the receiver must
        // still lock and pass bits through
        let cfg = config();
        let mut plain = vec![true; 120];
        plain.extend([false, true, true, false, true, false, false, true]);
        let scrambled = scramble(&plain, 0);
        assert_eq!(scrambled, plain);
        let mut d = Descrambler::new(&cfg);
        let out = push_all(&mut d, &scrambled);
        assert_eq!(d.state(), LockState::Locked);
        let recovered: Vec<bool> = out.iter().map(|b| b.value).collect();
        assert_eq!(&recovered[..], &plain[plain.len() - out.len()..]);
    }

    #[test]
    fn test_no_lock_on_random_data() {
        let cfg = config();
        // alternating bits never descramble to an idle run
        let junk: Vec<bool> = (0..500).map(|i| i % 2 == 0).collect();
        let mut d = Descrambler::new(&cfg);
        let out = push_all(&mut d, &junk);
        assert_eq!(d.state(), LockState::Seeking);
        assert!(out.is_empty());
    }

    #[test]
    fn test_seek_timeout_counted() {
        let mut cfg = config();
        cfg.seek_timeout_bits = 100;
        let junk: Vec<bool> = (0..350).map(|i| i % 2 == 0).collect();
        let mut d = Descrambler::new(&cfg);
        let _ = push_all(&mut d, &junk);
        assert_eq!(d.seek_timeouts(), 3);
        assert_eq!(d.state(), LockState::Seeking);
    }

    #[test]
    fn test_reseek_dwell_guard() {
        let cfg = config();
        let idle = scramble(&vec![true; 600], 0x155);
        let mut d = Descrambler::new(&cfg);

        // feed just past lock: dwell not yet reached
        let mut out = Vec::new();
        for &b in &idle[..LFSR_WIDTH + cfg.lock_run] {
            d.push(DecodedBit::good(b), &mut out);
        }
        assert_eq!(d.state(), LockState::Locked);
        assert!(!d.force_reseek(), "reseek before dwell must be refused");
        assert_eq!(d.state(), LockState::Locked);

        // after the dwell it is honored
        for &b in &idle[LFSR_WIDTH + cfg.lock_run..] {
            d.push(DecodedBit::good(b), &mut out);
        }
        assert!(d.force_reseek());
        assert_eq!(d.state(), LockState::Seeking);
        assert!(!d.force_reseek(), "already seeking");
    }

    #[test]
    fn test_relock_after_forced_reseek() {
        let cfg = config();
        let idle = scramble(&vec![true; 800], 0x0A5);
        let mut d = Descrambler::new(&cfg);
        let mut out = Vec::new();
        for &b in &idle[..400] {
            d.push(DecodedBit::good(b), &mut out);
        }
        assert!(d.force_reseek());
        for &b in &idle[400..] {
            d.push(DecodedBit::good(b), &mut out);
        }
        assert_eq!(d.state(), LockState::Locked);
        assert_eq!(d.locks_acquired(), 2);
    }

    #[test]
    fn test_unreliable_bits_keep_flags() {
        let cfg = config();
        let mut plain = vec![true; 150];
        plain.extend([false, true, false]);
        let scrambled = scramble(&plain, 0x311);
        let mut d = Descrambler::new(&cfg);
        let mut out = Vec::new();
        for (i, &b) in scrambled.iter().enumerate() {
            let bit = if i == 140 {
                DecodedBit::forced(b)
            } else {
                DecodedBit::good(b)
            };
            d.push(bit, &mut out);
        }
        assert!(out.iter().any(|b| !b.reliable));
    }
}
