//! CCITT CRC-16 (reflected polynomial 0x8408), the CPU integer workload.
//!
//! Bitwise rather than table driven: the point is a steady amount of integer
//! work per byte, not a fast checksum.

pub const CRC16_SEED: u16 = 0xFFFF;

const POLYNOMIAL: u16 = 0x8408;

/// Folds `buf` into the running checksum `crc`.
///
/// Start from [`CRC16_SEED`]; feeding the result back in for the next buffer
/// is equivalent to one call over the concatenated buffers.
pub fn ccitt_crc16(buf: &[u8], mut crc: u16) -> u16 {
    for &byte in buf {
        let mut val = u16::from(byte);
        for _ in 0..8 {
            let do_xor = (val ^ crc) & 1 != 0;
            crc >>= 1;
            if do_xor {
                crc ^= POLYNOMIAL;
            }
            val >>= 1;
        }
    }
    crc
}

/// Final complement and byte swap.
pub fn crc16_finish(crc: u16) -> u16 {
    (crc ^ 0xFFFF).swap_bytes()
}
