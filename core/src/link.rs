use log::info;

use crate::error::Result;
use crate::framing::{Frame, FrameDecoder, FrameEncoder};
use crate::fsk::{FskConfig, FskDemodulator, FskModulator};

/// Frame encoder + FSK modulator: message in, audio samples out
pub struct Transmitter {
    fsk: FskModulator,
}

impl Transmitter {
    pub fn new(config: FskConfig) -> Result<Self> {
        Ok(Self {
            fsk: FskModulator::new(config)?,
        })
    }

    pub fn config(&self) -> &FskConfig {
        self.fsk.config()
    }

    pub fn transmit(&self, frame: &Frame) -> Result<Vec<f32>> {
        let bits = FrameEncoder::encode(frame)?;
        let samples = self.fsk.modulate(&bits);
        info!(
            "frame {} -> {}: {} bytes, {} bits, {} samples",
            frame.source,
            frame.target,
            frame.payload.len(),
            bits.len(),
            samples.len()
        );
        Ok(samples)
    }

    pub fn transmit_text(&self, source: u64, target: u64, message: &str) -> Result<Vec<f32>> {
        self.transmit(&Frame::from_text(source, target, message)?)
    }
}

/// FSK demodulator + frame decoder: audio samples in, validated message out
pub struct Receiver {
    fsk: FskDemodulator,
}

impl Receiver {
    pub fn new(config: FskConfig) -> Result<Self> {
        Ok(Self {
            fsk: FskDemodulator::new(config)?,
        })
    }

    pub fn config(&self) -> &FskConfig {
        self.fsk.config()
    }

    pub fn receive(&self, samples: &[f32]) -> Result<Frame> {
        let bits = self.fsk.receive(samples)?;
        let frame = FrameDecoder::decode(&bits)?;
        info!(
            "frame {} -> {}: {} bytes",
            frame.source,
            frame.target,
            frame.payload.len()
        );
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transmit_receive() {
        let transmitter = Transmitter::new(FskConfig::default()).unwrap();
        let receiver = Receiver::new(FskConfig::default()).unwrap();

        let samples = transmitter.transmit_text(1, 2, "ab").unwrap();
        assert_eq!(samples.len(), 264 * 441);

        let frame = receiver.receive(&samples).unwrap();
        assert_eq!(frame, Frame::from_text(1, 2, "ab").unwrap());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FskConfig {
            bit_rate: 0,
            ..FskConfig::default()
        };
        assert!(Transmitter::new(config.clone()).is_err());
        assert!(Receiver::new(config).is_err());
    }
}
