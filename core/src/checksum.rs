//! CRC-32 frame check sequence
//!
//! Standard reflected CRC-32 (polynomial 0xEDB88320, as used by Ethernet and
//! zlib), carried in the frame as four big-endian octets.

use bitvec::prelude::*;
use crc32fast::Hasher;

use crate::bits::{bits_to_bytes, Bits};

pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// CRC-32 over a bit sequence packed MSB first; a partial last octet is zero-filled.
pub fn crc32_bits(bits: &BitSlice<u8, Msb0>) -> u32 {
    crc32(&bits_to_bytes(bits))
}

/// The 32-bit field appended to a raw frame
pub fn crc_field(bits: &BitSlice<u8, Msb0>) -> Bits {
    Bits::from_slice(&crc32_bits(bits).to_be_bytes())
}
