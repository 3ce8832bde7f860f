//! Bit sequence helpers
//!
//! Every stage of the codec works on MSB-first bit vectors. Integers are
//! serialized big-endian with a fixed octet width.

use bitvec::prelude::*;

use crate::error::{Result, TonelinkError};

/// Ordered bit sequence, most significant bit first
pub type Bits = BitVec<u8, Msb0>;

/// Serialize `value` into exactly `width * 8` bits, MSB first.
///
/// Fails instead of truncating when `value` needs more than `width` octets.
pub fn int_to_bits(value: u64, width: usize) -> Result<Bits> {
    let bit_len = width * 8;
    if bit_len < 64 && value >> bit_len != 0 {
        return Err(TonelinkError::ValueOverflow { value, width });
    }

    let mut bits = Bits::with_capacity(bit_len);
    for i in (0..bit_len).rev() {
        bits.push(i < 64 && (value >> i) & 1 == 1);
    }
    Ok(bits)
}

/// Read an MSB-first bit field as an unsigned integer.
///
/// Fields wider than 64 bits keep only the low 64 bits.
pub fn bits_to_int(bits: &BitSlice<u8, Msb0>) -> u64 {
    bits.iter()
        .by_vals()
        .fold(0u64, |acc, bit| (acc << 1) | bit as u64)
}

/// Pack bits into bytes, zero-filling a trailing partial byte.
pub fn bits_to_bytes(bits: &BitSlice<u8, Msb0>) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            let value = bits_to_int(chunk) as u8;
            value << (8 - chunk.len())
        })
        .collect()
}

/// Parse a string of `0`/`1` characters. ASCII whitespace is skipped.
pub fn parse_bits(text: &str) -> Result<Bits> {
    let mut bits = Bits::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '0' => bits.push(false),
            '1' => bits.push(true),
            c if c.is_ascii_whitespace() => {}
            c => return Err(TonelinkError::InvalidBitString(c)),
        }
    }
    Ok(bits)
}

/// Render bits as a `0`/`1` string
pub fn render_bits(bits: &BitSlice<u8, Msb0>) -> String {
    bits.iter()
        .by_vals()
        .map(|bit| if bit { '1' } else { '0' })
        .collect()
}
