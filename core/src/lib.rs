//! Audio modem data link for short addressed text messages
//!
//! Frames are built as target/source addresses, a length field, the payload and
//! a CRC-32, then 4B/5B line coded, NRZI coded and prefixed with a 64-bit
//! preamble. The FSK layer turns those bits into tones and back.

pub mod error;
pub mod bits;
pub mod line_code;
pub mod nrzi;
pub mod preamble;
pub mod checksum;
pub mod framing;
pub mod assembler;
pub mod fsk;
pub mod link;

pub use assembler::{Assembly, FrameAssembler};
pub use bits::Bits;
pub use error::{Result, TonelinkError};
pub use framing::{Frame, FrameDecoder, FrameEncoder};
pub use fsk::{FskConfig, FskDemodulator, FskModulator};
pub use link::{Receiver, Transmitter};

// Frame field widths
pub const ADDRESS_OCTETS: usize = 6;
pub const LENGTH_OCTETS: usize = 2;
pub const CRC_OCTETS: usize = 4;
pub const PREAMBLE_OCTETS: usize = 8;

pub const ADDRESS_BITS: usize = ADDRESS_OCTETS * 8; // 48
pub const LENGTH_BITS: usize = LENGTH_OCTETS * 8; // 16
pub const CRC_BITS: usize = CRC_OCTETS * 8; // 32
pub const PREAMBLE_BITS: usize = PREAMBLE_OCTETS * 8; // 64

/// Header (two addresses + length) in raw bits, before line coding
pub const HEADER_BITS: usize = 2 * ADDRESS_BITS + LENGTH_BITS; // 112

/// Smallest raw frame: header + CRC with an empty payload
pub const MIN_RAW_FRAME_BITS: usize = HEADER_BITS + CRC_BITS; // 144

pub const MAX_ADDRESS: u64 = (1 << ADDRESS_BITS) - 1;
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Line-coded size of `raw_bits` raw frame bits (every 4 bits become 5)
pub const fn line_coded_len(raw_bits: usize) -> usize {
    raw_bits / line_code::DATA_GROUP_BITS * line_code::CODE_GROUP_BITS
}

/// Total transmitted bits for a payload of `payload_len` bytes, preamble included
pub const fn transmitted_len(payload_len: usize) -> usize {
    PREAMBLE_BITS + line_coded_len(MIN_RAW_FRAME_BITS + 8 * payload_len)
}
