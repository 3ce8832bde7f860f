//! NRZI-style differential coding
//!
//! On the line a `1` is a level change and a `0` holds the level. Encoding
//! starts from a seed: with `seed_inverted` set the first data bit is
//! inverted, otherwise it is sent as is. Decoding compares the first line bit
//! against `reference`; passing the same flag value as `reference` undoes
//! encoding exactly.

use bitvec::prelude::*;

use crate::bits::Bits;

/// Convert absolute bits into transition-coded line bits.
pub fn to_differential(bits: &BitSlice<u8, Msb0>, seed_inverted: bool) -> Bits {
    let (line, _) = bits.iter().by_vals().enumerate().fold(
        (Bits::with_capacity(bits.len()), false),
        |(mut line, level), (i, bit)| {
            let next = if i == 0 { bit ^ seed_inverted } else { level ^ bit };
            line.push(next);
            (line, next)
        },
    );
    line
}

/// Convert transition-coded line bits back into absolute bits.
///
/// Bit 0 is `1` when the first line bit differs from `reference`; every later
/// bit is `1` when the line level changed from the previous line bit.
pub fn from_differential(line: &BitSlice<u8, Msb0>, reference: bool) -> Bits {
    let (bits, _) = line.iter().by_vals().fold(
        (Bits::with_capacity(line.len()), reference),
        |(mut bits, previous), level| {
            bits.push(level != previous);
            (bits, level)
        },
    );
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::{parse_bits, render_bits};

    #[test]
    fn test_to_differential_inverted_seed() {
        let bits = parse_bits("0110100").unwrap();
        let line = to_differential(&bits, true);
        // first bit inverted, then toggle on every 1
        assert_eq!(render_bits(&line), "1011000");
    }

    #[test]
    fn test_to_differential_plain_seed() {
        let bits = parse_bits("1110").unwrap();
        assert_eq!(render_bits(&to_differential(&bits, false)), "1011");
    }

    #[test]
    fn test_from_differential() {
        let line = parse_bits("1011000").unwrap();
        assert_eq!(render_bits(&from_differential(&line, true)), "0110100");
        assert_eq!(render_bits(&from_differential(&line, false)), "1110100");
    }

    #[test]
    fn test_roundtrip_matching_reference() {
        let patterns = ["", "0", "1", "10101011", "0000000", "1111111", "1100101000111"];
        for pattern in patterns {
            let bits = parse_bits(pattern).unwrap();
            for seed in [false, true] {
                let line = to_differential(&bits, seed);
                assert_eq!(line.len(), bits.len());
                assert_eq!(from_differential(&line, seed), bits, "pattern {:?} seed {}", pattern, seed);
            }
        }
    }

    #[test]
    fn test_mismatched_reference_flips_first_bit_only() {
        let bits = parse_bits("0110").unwrap();
        let line = to_differential(&bits, true);
        let decoded = from_differential(&line, false);
        assert_eq!(render_bits(&decoded), "1110");
    }

    #[test]
    fn test_empty_sequences() {
        assert!(to_differential(BitSlice::empty(), true).is_empty());
        assert!(from_differential(BitSlice::empty(), true).is_empty());
    }
}
