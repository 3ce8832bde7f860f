//! 4B/5B line coding
//!
//! Each 4-bit data group maps to one of 16 five-bit codewords chosen to bound
//! runs of identical bits. Only those 16 of the 32 five-bit strings are valid;
//! contracting any other codeword rejects the frame.

use bitvec::prelude::*;
use log::trace;

use crate::bits::{bits_to_int, Bits};
use crate::error::{Result, TonelinkError};

pub const DATA_GROUP_BITS: usize = 4;
pub const CODE_GROUP_BITS: usize = 5;

/// Codeword for each 4-bit group, indexed by the group value
const CODEWORDS: [u8; 16] = [
    0b11110, 0b01001, 0b10100, 0b10101, 0b01010, 0b01011, 0b01110, 0b01111, 0b10010, 0b10011,
    0b10110, 0b10111, 0b11010, 0b11011, 0b11100, 0b11101,
];

/// Reverse table over all 32 five-bit strings
static GROUPS: [Option<u8>; 32] = reverse_table();

const fn reverse_table() -> [Option<u8>; 32] {
    let mut table = [None; 32];
    let mut group = 0;
    while group < CODEWORDS.len() {
        table[CODEWORDS[group] as usize] = Some(group as u8);
        group += 1;
    }
    table
}

/// Expand a 4-bit group (low nibble of `group`) to its 5-bit codeword.
pub fn expand(group: u8) -> u8 {
    CODEWORDS[(group & 0x0F) as usize]
}

/// Contract a 5-bit codeword to its 4-bit group.
///
/// Returns `None` for the 16 five-bit strings outside the code, and for
/// values wider than five bits.
pub fn contract(codeword: u8) -> Option<u8> {
    GROUPS.get(codeword as usize).copied().flatten()
}

/// One direction of the line code: fixed-width input groups to fixed-width output groups
#[derive(Debug, Clone, Copy)]
pub struct CodeTable {
    pub input_bits: usize,
    pub output_bits: usize,
    lookup: fn(u8) -> Option<u8>,
}

/// 4B → 5B, used when encoding
pub const EXPAND_4B5B: CodeTable = CodeTable {
    input_bits: DATA_GROUP_BITS,
    output_bits: CODE_GROUP_BITS,
    lookup: expand_lookup,
};

/// 5B → 4B, used when decoding
pub const CONTRACT_5B4B: CodeTable = CodeTable {
    input_bits: CODE_GROUP_BITS,
    output_bits: DATA_GROUP_BITS,
    lookup: contract,
};

fn expand_lookup(group: u8) -> Option<u8> {
    Some(expand(group))
}

/// Recode `bits` group by group through `table`, left to right.
///
/// Fails without partial output if the length is not a whole number of
/// groups or any group has no entry in the table.
pub fn change_coding(bits: &BitSlice<u8, Msb0>, table: &CodeTable) -> Result<Bits> {
    if bits.len() % table.input_bits != 0 {
        return Err(TonelinkError::MisalignedGroups {
            len: bits.len(),
            group: table.input_bits,
        });
    }

    let groups = bits.len() / table.input_bits;
    let mut out = Bits::with_capacity(groups * table.output_bits);

    for (position, chunk) in bits.chunks_exact(table.input_bits).enumerate() {
        let value = bits_to_int(chunk) as u8;
        let Some(code) = (table.lookup)(value) else {
            trace!("group {} ({:0width$b}) is not a codeword", position, value, width = table.input_bits);
            return Err(TonelinkError::InvalidCodeword { position });
        };
        for i in (0..table.output_bits).rev() {
            out.push((code >> i) & 1 == 1);
        }
    }

    Ok(out)
}
