//! 4B5B code groups (100BASE-TX)
//!
//! Data nibbles travel as 5-bit groups chosen for transition density;
//! four control groups matter to framing: J/K open a stream (replacing
//! the first preamble octet) and T/R close it. Groups are handled
//! MSB-first as they appear in the descrambled stream.

/// Start-of-stream delimiter, first group.
pub const J: u8 = 0b11000;
/// Start-of-stream delimiter, second group.
pub const K: u8 = 0b10001;
/// End-of-stream delimiter, first group.
pub const T: u8 = 0b01101;
/// End-of-stream delimiter, second group.
pub const R: u8 = 0b00111;
/// Idle group (continuous ones between streams).
pub const IDLE: u8 = 0b11111;

/// Decode a data group to its nibble.
///
/// # Returns
/// `None` for control groups and invalid codes.
pub fn decode_group(group: u8) -> Option<u8> {
    let nibble = match group {
        0b11110 => 0x0,
        0b01001 => 0x1,
        0b10100 => 0x2,
        0b10101 => 0x3,
        0b01010 => 0x4,
        0b01011 => 0x5,
        0b01110 => 0x6,
        0b01111 => 0x7,
        0b10010 => 0x8,
        0b10011 => 0x9,
        0b10110 => 0xA,
        0b10111 => 0xB,
        0b11010 => 0xC,
        0b11011 => 0xD,
        0b11100 => 0xE,
        0b11101 => 0xF,
        _ => return None,
    };
    Some(nibble)
}

/// Encode a nibble to its data group.
pub fn encode_nibble(nibble: u8) -> u8 {
    match nibble & 0xF {
        0x0 => 0b11110,
        0x1 => 0b01001,
        0x2 => 0b10100,
        0x3 => 0b10101,
        0x4 => 0b01010,
        0x5 => 0b01011,
        0x6 => 0b01110,
        0x7 => 0b01111,
        0x8 => 0b10010,
        0x9 => 0b10011,
        0xA => 0b10110,
        0xB => 0b10111,
        0xC => 0b11010,
        0xD => 0b11011,
        0xE => 0b11100,
        _ => 0b11101,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_nibbles() {
        for nibble in 0..16u8 {
            assert_eq!(decode_group(encode_nibble(nibble)), Some(nibble));
        }
    }

    #[test]
    fn test_control_groups_are_not_data() {
        for g in [J, K, T, R, IDLE] {
            assert_eq!(decode_group(g), None);
        }
    }

    #[test]
    fn test_invalid_group() {
        assert_eq!(decode_group(0b00000), None);
        assert_eq!(decode_group(0b00001), None);
    }
}
