//! Bit-at-a-time frame collection for a live receiver
//!
//! A receiver hears the preamble, then an unknown number of frame bits. The
//! assembler reads the length field as soon as the header has arrived and
//! from then on knows exactly how many line bits remain.

use log::debug;

use crate::bits::{bits_to_int, Bits};
use crate::error::Result;
use crate::line_code::{change_coding, CONTRACT_5B4B};
use crate::nrzi::from_differential;
use crate::preamble::make_preamble;
use crate::{line_coded_len, CRC_BITS, HEADER_BITS, LENGTH_BITS, PREAMBLE_BITS};

/// Line bits covering target, source and length fields
const HEADER_LINE_BITS: usize = line_coded_len(HEADER_BITS); // 140
const LENGTH_LINE_BITS: usize = line_coded_len(LENGTH_BITS); // 20

#[derive(Debug, Clone, PartialEq)]
pub enum Assembly {
    NeedMore,
    /// Preamble followed by every frame bit, ready for `FrameDecoder::decode`
    Complete(Bits),
}

#[derive(Debug, Default)]
pub struct FrameAssembler {
    line: Bits,
    /// Post-preamble line bits in the frame, known once the header is in
    frame_line_bits: Option<usize>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one line bit heard after the preamble.
    ///
    /// Fails if the length field is not made of valid codewords. Bits pushed
    /// after the frame is complete are ignored.
    pub fn push(&mut self, bit: bool) -> Result<Assembly> {
        if self.is_complete() {
            return Ok(Assembly::Complete(self.frame()));
        }

        self.line.push(bit);

        if self.frame_line_bits.is_none() && self.line.len() == HEADER_LINE_BITS {
            let payload_len = self.peek_length()?;
            let total = HEADER_LINE_BITS + line_coded_len(8 * payload_len + CRC_BITS);
            debug!("length field: {} bytes, expecting {} line bits", payload_len, total);
            self.frame_line_bits = Some(total);
        }

        if self.is_complete() {
            Ok(Assembly::Complete(self.frame()))
        } else {
            Ok(Assembly::NeedMore)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.frame_line_bits
            .is_some_and(|total| self.line.len() >= total)
    }

    /// Total transmitted bits (preamble included), once the length field is known
    pub fn expected_len(&self) -> Option<usize> {
        self.frame_line_bits.map(|total| PREAMBLE_BITS + total)
    }

    /// Line bits collected so far, preamble excluded
    pub fn collected(&self) -> usize {
        self.line.len()
    }

    /// Preamble plus the bits collected so far
    pub fn into_frame(self) -> Bits {
        self.frame()
    }

    fn frame(&self) -> Bits {
        let mut bits = make_preamble();
        bits.extend_from_bitslice(&self.line);
        bits
    }

    fn peek_length(&self) -> Result<usize> {
        let start = HEADER_LINE_BITS - LENGTH_LINE_BITS;
        // the line level just before the field seeds its differential decoding
        let reference = self.line[start - 1];
        let field = from_differential(&self.line[start..], reference);
        let length = change_coding(&field, &CONTRACT_5B4B)?;
        Ok(bits_to_int(&length) as usize)
    }
}
