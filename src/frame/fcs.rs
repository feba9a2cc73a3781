//! Frame check sequence (CRC-32, IEEE 802.3)
//!
//! Bit-reflected CRC-32, init and final XOR all-ones. Small enough to
//! keep inline rather than pulling in a dependency.

const POLY: u32 = 0xEDB8_8320;

/// CRC-32 over `data`.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = u32::MAX;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

/// Verify a frame carrying its FCS in the trailing four octets,
/// least-significant byte first as transmitted on the wire.
pub fn verify(frame: &[u8]) -> bool {
    if frame.len() < 5 {
        return false;
    }
    let (body, tail) = frame.split_at(frame.len() - 4);
    let fcs = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
    crc32(body) == fcs
}

/// Append the FCS to a frame body.
pub fn append(body: &mut Vec<u8>) {
    let fcs = crc32(body);
    body.extend_from_slice(&fcs.to_le_bytes());
}
