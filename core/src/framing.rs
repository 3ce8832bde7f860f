use bitvec::prelude::*;
use log::debug;

use crate::bits::{bits_to_bytes, bits_to_int, int_to_bits, Bits};
use crate::checksum::{crc32_bits, crc_field};
use crate::error::{Result, TonelinkError};
use crate::line_code::{change_coding, CONTRACT_5B4B, EXPAND_4B5B};
use crate::nrzi::{from_differential, to_differential};
use crate::preamble::{make_preamble, match_preamble};
use crate::{
    transmitted_len, ADDRESS_BITS, ADDRESS_OCTETS, CRC_BITS, HEADER_BITS, LENGTH_OCTETS,
    MAX_ADDRESS, MAX_PAYLOAD_LEN, MIN_RAW_FRAME_BITS, PREAMBLE_BITS,
};

/// Line level assumed before the first frame bit, shared by sender and receiver
const NRZI_SEED: bool = true;

/// One addressed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub source: u64,
    pub target: u64,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(source: u64, target: u64, payload: Vec<u8>) -> Result<Self> {
        let frame = Self {
            source,
            target,
            payload,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Build a frame from text, one byte per character.
    ///
    /// Characters above U+00FF have no single-byte form and are rejected.
    pub fn from_text(source: u64, target: u64, message: &str) -> Result<Self> {
        let payload = message
            .chars()
            .map(|c| u8::try_from(c).map_err(|_| TonelinkError::NonByteCharacter(c)))
            .collect::<Result<Vec<u8>>>()?;
        Self::new(source, target, payload)
    }

    /// Payload as text, each byte taken as its own code point
    pub fn payload_text(&self) -> String {
        self.payload.iter().map(|&b| char::from(b)).collect()
    }

    pub fn validate(&self) -> Result<()> {
        for address in [self.source, self.target] {
            if address > MAX_ADDRESS {
                return Err(TonelinkError::AddressOverflow(address));
            }
        }
        if self.payload.len() > MAX_PAYLOAD_LEN {
            return Err(TonelinkError::PayloadTooLong(self.payload.len()));
        }
        Ok(())
    }
}

pub struct FrameEncoder;
pub struct FrameDecoder;

impl FrameEncoder {
    /// Encode a frame into transmittable bits: preamble + NRZI(4B5B(raw frame))
    pub fn encode(frame: &Frame) -> Result<Bits> {
        let raw = Self::encode_raw(frame)?;
        Self::wrap_raw(&raw)
    }

    /// Raw frame: target, source, payload length, payload, CRC-32
    pub fn encode_raw(frame: &Frame) -> Result<Bits> {
        frame.validate()?;

        let mut raw = Bits::with_capacity(MIN_RAW_FRAME_BITS + 8 * frame.payload.len());
        raw.extend_from_bitslice(&int_to_bits(frame.target, ADDRESS_OCTETS)?);
        raw.extend_from_bitslice(&int_to_bits(frame.source, ADDRESS_OCTETS)?);
        raw.extend_from_bitslice(&int_to_bits(frame.payload.len() as u64, LENGTH_OCTETS)?);
        raw.extend_from_bitslice(frame.payload.view_bits::<Msb0>());

        // CRC covers everything before it
        let crc = crc_field(&raw);
        raw.extend_from_bitslice(&crc);

        Ok(raw)
    }

    /// Line code, differentially code and prefix the preamble onto a raw frame.
    ///
    /// The raw frame is not inspected, so hand-built frames can be sent as is.
    pub fn wrap_raw(raw: &BitSlice<u8, Msb0>) -> Result<Bits> {
        let coded = change_coding(raw, &EXPAND_4B5B)?;
        let line = to_differential(&coded, NRZI_SEED);

        let mut bits = make_preamble();
        bits.extend_from_bitslice(&line);
        Ok(bits)
    }
}

impl FrameDecoder {
    /// Decode transmitted bits. Any structural or CRC failure rejects the whole frame.
    pub fn decode(bits: &BitSlice<u8, Msb0>) -> Result<Frame> {
        let minimum = transmitted_len(0);
        if bits.len() < minimum {
            debug!("frame rejected: {} bits, need {}", bits.len(), minimum);
            return Err(TonelinkError::FrameTooShort {
                bits: bits.len(),
                minimum,
            });
        }

        if !match_preamble(bits) {
            debug!("frame rejected: preamble mismatch");
            return Err(TonelinkError::PreambleNotFound);
        }

        let line = from_differential(&bits[PREAMBLE_BITS..], NRZI_SEED);
        let raw = change_coding(&line, &CONTRACT_5B4B).inspect_err(|e| {
            debug!("frame rejected: {}", e);
        })?;

        Self::decode_raw(&raw)
    }

    /// Split and verify a raw frame (after line decoding)
    pub fn decode_raw(raw: &BitSlice<u8, Msb0>) -> Result<Frame> {
        if raw.len() < MIN_RAW_FRAME_BITS {
            return Err(TonelinkError::FrameTooShort {
                bits: raw.len(),
                minimum: MIN_RAW_FRAME_BITS,
            });
        }

        let crc_start = raw.len() - CRC_BITS;
        let expected = bits_to_int(&raw[crc_start..]) as u32;
        let computed = crc32_bits(&raw[..crc_start]);
        if expected != computed {
            debug!(
                "frame rejected: CRC {:#010x} != computed {:#010x}",
                expected, computed
            );
            return Err(TonelinkError::CrcMismatch { expected, computed });
        }

        let target = bits_to_int(&raw[..ADDRESS_BITS]);
        let source = bits_to_int(&raw[ADDRESS_BITS..2 * ADDRESS_BITS]);
        let declared = bits_to_int(&raw[2 * ADDRESS_BITS..HEADER_BITS]) as usize;

        let payload_bits = &raw[HEADER_BITS..crc_start];
        if payload_bits.len() % 8 != 0 || payload_bits.len() / 8 != declared {
            debug!(
                "frame rejected: length field {} but {} payload bits",
                declared,
                payload_bits.len()
            );
            return Err(TonelinkError::LengthMismatch {
                declared,
                actual_bits: payload_bits.len(),
            });
        }

        Ok(Frame {
            source,
            target,
            payload: bits_to_bytes(payload_bits),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::render_bits;

    fn raw_with_declared_len(declared: u64, payload: &[u8]) -> Bits {
        let mut raw = int_to_bits(2, ADDRESS_OCTETS).unwrap();
        raw.extend_from_bitslice(&int_to_bits(1, ADDRESS_OCTETS).unwrap());
        raw.extend_from_bitslice(&int_to_bits(declared, LENGTH_OCTETS).unwrap());
        raw.extend_from_bitslice(payload.view_bits::<Msb0>());
        let crc = crc_field(&raw);
        raw.extend_from_bitslice(&crc);
        raw
    }

    #[test]
    fn test_frame_encode_decode() {
        let frame = Frame::from_text(1, 2, "ab").unwrap();
        let bits = FrameEncoder::encode(&frame).unwrap();
        assert_eq!(bits.len(), 264);

        let decoded = FrameDecoder::decode(&bits).unwrap();
        assert_eq!(decoded.source, 1);
        assert_eq!(decoded.target, 2);
        assert_eq!(decoded.payload_text(), "ab");
    }

    #[test]
    fn test_raw_frame_layout() {
        let frame = Frame::from_text(0xAABB, 0xCCDD, "hi").unwrap();
        let raw = FrameEncoder::encode_raw(&frame).unwrap();
        assert_eq!(raw.len(), MIN_RAW_FRAME_BITS + 16);
        // target comes first
        assert_eq!(bits_to_int(&raw[..48]), 0xCCDD);
        assert_eq!(bits_to_int(&raw[48..96]), 0xAABB);
        assert_eq!(bits_to_int(&raw[96..112]), 2);
        assert_eq!(bits_to_bytes(&raw[112..128]), b"hi");
        assert_eq!(
            bits_to_int(&raw[128..]) as u32,
            crc32_bits(&raw[..128])
        );
    }

    #[test]
    fn test_encoded_frame_starts_with_preamble() {
        let frame = Frame::from_text(7, 9, "").unwrap();
        let bits = FrameEncoder::encode(&frame).unwrap();
        assert!(match_preamble(&bits));
        assert_eq!(bits.len(), transmitted_len(0));
        assert_eq!(bits.len(), 64 + 180);
    }

    #[test]
    fn test_empty_payload_roundtrip() {
        let frame = Frame::new(0, MAX_ADDRESS, Vec::new()).unwrap();
        let bits = FrameEncoder::encode(&frame).unwrap();
        assert_eq!(FrameDecoder::decode(&bits).unwrap(), frame);
    }

    #[test]
    fn test_address_overflow_rejected() {
        match Frame::from_text(MAX_ADDRESS + 1, 0, "x") {
            Err(TonelinkError::AddressOverflow(a)) => assert_eq!(a, MAX_ADDRESS + 1),
            _ => panic!("Expected AddressOverflow"),
        }

        let frame = Frame {
            source: 0,
            target: u64::MAX,
            payload: vec![],
        };
        assert!(FrameEncoder::encode(&frame).is_err());
    }

    #[test]
    fn test_payload_too_long_rejected() {
        match Frame::new(1, 2, vec![0u8; MAX_PAYLOAD_LEN + 1]) {
            Err(TonelinkError::PayloadTooLong(n)) => assert_eq!(n, MAX_PAYLOAD_LEN + 1),
            _ => panic!("Expected PayloadTooLong"),
        }
    }

    #[test]
    fn test_non_byte_character_rejected() {
        assert_eq!(
            Frame::from_text(1, 2, "snow ☃"),
            Err(TonelinkError::NonByteCharacter('☃'))
        );
        // Latin-1 range is one byte per character
        let frame = Frame::from_text(1, 2, "café").unwrap();
        assert_eq!(frame.payload, vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(frame.payload_text(), "café");
    }

    #[test]
    fn test_preamble_only_is_too_short() {
        let bits = make_preamble();
        match FrameDecoder::decode(&bits) {
            Err(TonelinkError::FrameTooShort { bits, minimum }) => {
                assert_eq!(bits, 64);
                assert_eq!(minimum, 244);
            }
            other => panic!("Expected FrameTooShort, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_preamble_rejected() {
        let frame = Frame::from_text(1, 2, "ab").unwrap();
        let mut bits = FrameEncoder::encode(&frame).unwrap();
        let bit = bits[63];
        bits.set(63, !bit);

        match FrameDecoder::decode(&bits) {
            Err(TonelinkError::PreambleNotFound) => {}
            other => panic!("Expected PreambleNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_codeword_rejected() {
        let mut bits = make_preamble();
        // line 0,1,1,1,... decodes to 1,1,0,0,0: not a codeword
        bits.resize(transmitted_len(0), true);
        bits.set(PREAMBLE_BITS, false);

        match FrameDecoder::decode(&bits) {
            Err(TonelinkError::InvalidCodeword { position }) => assert_eq!(position, 0),
            other => panic!("Expected InvalidCodeword, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_frame_misaligned() {
        let frame = Frame::from_text(1, 2, "hello").unwrap();
        let bits = FrameEncoder::encode(&frame).unwrap();
        let truncated = &bits[..bits.len() - 3];

        match FrameDecoder::decode(truncated) {
            Err(TonelinkError::MisalignedGroups { group, .. }) => assert_eq!(group, 5),
            other => panic!("Expected MisalignedGroups, got {:?}", other),
        }
    }

    #[test]
    fn test_crc_detects_any_single_flip() {
        let frame = Frame::from_text(1, 2, "ab").unwrap();
        let raw = FrameEncoder::encode_raw(&frame).unwrap();

        for i in 0..raw.len() {
            let mut corrupted = raw.clone();
            let bit = corrupted[i];
            corrupted.set(i, !bit);
            let bits = FrameEncoder::wrap_raw(&corrupted).unwrap();

            match FrameDecoder::decode(&bits) {
                Err(TonelinkError::CrcMismatch { .. }) => {}
                other => panic!("flip at raw bit {}: expected CrcMismatch, got {:?}", i, other),
            }
        }
    }

    #[test]
    fn test_length_mismatch_rejected_after_crc() {
        // declared length 3, four bytes of payload, valid CRC
        let raw = raw_with_declared_len(3, b"abcd");
        let bits = FrameEncoder::wrap_raw(&raw).unwrap();

        match FrameDecoder::decode(&bits) {
            Err(TonelinkError::LengthMismatch {
                declared,
                actual_bits,
            }) => {
                assert_eq!(declared, 3);
                assert_eq!(actual_bits, 32);
            }
            other => panic!("Expected LengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_byte_payload_rejected() {
        // 4 extra bits of payload: whole groups for 4B5B but not whole bytes
        let mut raw = int_to_bits(2, ADDRESS_OCTETS).unwrap();
        raw.extend_from_bitslice(&int_to_bits(1, ADDRESS_OCTETS).unwrap());
        raw.extend_from_bitslice(&int_to_bits(0, LENGTH_OCTETS).unwrap());
        raw.extend_from_bitslice(bits![u8, Msb0; 1, 0, 1, 0]);
        let crc = crc_field(&raw);
        raw.extend_from_bitslice(&crc);

        let bits = FrameEncoder::wrap_raw(&raw).unwrap();
        match FrameDecoder::decode(&bits) {
            Err(TonelinkError::LengthMismatch { actual_bits, .. }) => assert_eq!(actual_bits, 4),
            other => panic!("Expected LengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_known_encoding_prefix() {
        let frame = Frame::from_text(1, 2, "ab").unwrap();
        let bits = FrameEncoder::encode(&frame).unwrap();

        // first raw group is 0000 -> 11110, NRZI seeded high: 0,1,0,1,1
        let first_group = render_bits(&bits[PREAMBLE_BITS..PREAMBLE_BITS + 5]);
        assert_eq!(first_group, "01011");
    }
}
