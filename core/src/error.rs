use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TonelinkError {
    #[error("Frame too short: {bits} bits, need at least {minimum}")]
    FrameTooShort { bits: usize, minimum: usize },

    #[error("Failed to match preamble")]
    PreambleNotFound,

    #[error("Invalid line codeword at group {position}")]
    InvalidCodeword { position: usize },

    #[error("Bit length {len} is not a multiple of group size {group}")]
    MisalignedGroups { len: usize, group: usize },

    #[error("Declared payload length {declared} does not match {actual_bits} payload bits")]
    LengthMismatch { declared: usize, actual_bits: usize },

    #[error("CRC-32 mismatch: frame carries {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch { expected: u32, computed: u32 },

    #[error("Address {0} does not fit in 48 bits")]
    AddressOverflow(u64),

    #[error("Value {value} does not fit in {width} octets")]
    ValueOverflow { value: u64, width: usize },

    #[error("Payload of {0} bytes exceeds the 16-bit length field")]
    PayloadTooLong(usize),

    #[error("Character {0:?} cannot be sent as a single byte")]
    NonByteCharacter(char),

    #[error("Invalid character {0:?} in bit string")]
    InvalidBitString(char),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No FSK tone detected")]
    NoSignal,

    #[error("Insufficient data")]
    InsufficientData,
}

impl TonelinkError {
    /// Garbled or misaligned input: wrong preamble, bad codeword, bad length.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. }
                | Self::PreambleNotFound
                | Self::InvalidCodeword { .. }
                | Self::MisalignedGroups { .. }
                | Self::LengthMismatch { .. }
        )
    }

    /// Bit errors that survived the structural checks.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::CrcMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, TonelinkError>;
