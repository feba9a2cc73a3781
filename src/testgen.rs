//! Fixture generators shared across test modules
//!
//! Builders for well-formed frames, their bit streams in both framing
//! schemes, and synthetic scope waveforms. Payload bytes come from a
//! seeded generator so every fixture is reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::frame::{fcs, fourb5b};

/// A frame of `len` octets total, FCS included and valid. The body is
/// pseudo-random, seeded by the length.
pub fn ethernet_frame(len: usize) -> Vec<u8> {
    assert!(len > 4, "frame must be longer than its FCS");
    let mut rng = ChaCha8Rng::seed_from_u64(len as u64);
    let mut frame: Vec<u8> = (0..len - 4).map(|_| rng.gen()).collect();
    fcs::append(&mut frame);
    frame
}

fn push_byte_lsb_first(bits: &mut Vec<bool>, byte: u8) {
    for i in 0..8 {
        bits.push((byte >> i) & 1 == 1);
    }
}

/// Bit stream of one 10BASE-T frame: MAC preamble octets, SFD, then the
/// frame octets LSB-first.
pub fn frame_bits_10m(frame: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(64 + frame.len() * 8);
    for _ in 0..7 {
        push_byte_lsb_first(&mut bits, 0x55);
    }
    push_byte_lsb_first(&mut bits, 0xD5);
    for &b in frame {
        push_byte_lsb_first(&mut bits, b);
    }
    bits
}

fn push_group(bits: &mut Vec<bool>, group: u8) {
    for i in (0..5).rev() {
        bits.push((group >> i) & 1 == 1);
    }
}

/// Pre-scramble 100BASE-TX stream for one frame: idle ones, J/K, the
/// remaining preamble and SFD as 4B5B groups, the frame octets (low
/// nibble first), T/R, idle ones.
pub fn stream_bits_100m(frame: &[u8], idle_before: usize, idle_after: usize) -> Vec<bool> {
    let mut bits = vec![true; idle_before];
    push_group(&mut bits, fourb5b::J);
    push_group(&mut bits, fourb5b::K);
    // J/K stands in for the first preamble octet
    for _ in 0..12 {
        push_group(&mut bits, fourb5b::encode_nibble(0x5));
    }
    push_group(&mut bits, fourb5b::encode_nibble(0x5));
    push_group(&mut bits, fourb5b::encode_nibble(0xD));
    for &b in frame {
        push_group(&mut bits, fourb5b::encode_nibble(b & 0xF));
        push_group(&mut bits, fourb5b::encode_nibble(b >> 4));
    }
    push_group(&mut bits, fourb5b::T);
    push_group(&mut bits, fourb5b::R);
    bits.extend(std::iter::repeat(true).take(idle_after));
    bits
}

/// Manchester waveform: each bit is a high-then-low (1) or low-then-high
/// (0) pair of half-bit cells, `sps_half` samples per cell, with flat
/// 0 V padding on both ends.
pub fn manchester_wave(
    bits: &[bool],
    sps_half: usize,
    amplitude: f64,
    lead: usize,
    tail: usize,
) -> Vec<f64> {
    let mut wave = vec![0.0; lead];
    wave.reserve(bits.len() * 2 * sps_half + tail);
    for &bit in bits {
        let (first, second) = if bit {
            (amplitude, -amplitude)
        } else {
            (-amplitude, amplitude)
        };
        wave.extend(std::iter::repeat(first).take(sps_half));
        wave.extend(std::iter::repeat(second).take(sps_half));
    }
    wave.extend(std::iter::repeat(0.0).take(tail));
    wave
}

/// MLT-3 waveform over an (already scrambled) bit stream: the level
/// walks 0, +1, 0, -1 on each 1 and holds on each 0, `sps` samples per
/// symbol.
pub fn mlt3_wave(bits: &[bool], sps: usize, amplitude: f64, lead: usize, tail: usize) -> Vec<f64> {
    const CYCLE: [f64; 4] = [0.0, 1.0, 0.0, -1.0];
    let mut phase = 0usize;
    let mut wave = vec![0.0; lead];
    wave.reserve(bits.len() * sps + tail);
    for &bit in bits {
        if bit {
            phase = (phase + 1) % 4;
        }
        wave.extend(std::iter::repeat(CYCLE[phase] * amplitude).take(sps));
    }
    wave.extend(std::iter::repeat(0.0).take(tail));
    wave
}
