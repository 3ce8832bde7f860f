use bitvec::prelude::*;

use crate::bits::Bits;
use crate::PREAMBLE_BITS;

const SYNC_OCTET: u8 = 0b1010_1010;
const TERMINATOR_OCTET: u8 = 0b1010_1011;

/// Seven `10101010` octets followed by the `10101011` terminator
pub fn make_preamble() -> Bits {
    let mut octets = [SYNC_OCTET; PREAMBLE_BITS / 8];
    octets[octets.len() - 1] = TERMINATOR_OCTET;
    Bits::from_slice(&octets)
}

/// True iff `bits` starts with the exact 64-bit preamble. No bit errors are tolerated.
pub fn match_preamble(bits: &BitSlice<u8, Msb0>) -> bool {
    bits.len() >= PREAMBLE_BITS && bits[..PREAMBLE_BITS] == make_preamble()[..]
}
