use bitvec::prelude::*;
use log::{debug, trace};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::assembler::{Assembly, FrameAssembler};
use crate::bits::Bits;
use crate::error::{Result, TonelinkError};

// Binary FSK: one tone per bit, phase restarting at every bit boundary.
//
// With the defaults a bit lasts 441 samples at 44.1 kHz, so FFT bins are
// 100 Hz apart and both tones land exactly on a bin.

/// Configuration shared by the modulator and the demodulator
#[derive(Debug, Clone, PartialEq)]
pub struct FskConfig {
    /// Samples per second
    pub sample_rate: u32,
    /// Bits per second; must divide `sample_rate`
    pub bit_rate: u32,
    /// Tone for a `0` bit, in Hz
    pub f0: f32,
    /// Tone for a `1` bit, in Hz
    pub f1: f32,
    /// Peak amplitude, 0 < amplitude <= 1
    pub amplitude: f32,
    /// Accepted distance between a detected peak and a tone; half a bin when unset
    pub tolerance: Option<f32>,
    /// Sub-bit offsets tried when aligning to the bit grid
    pub sync_steps: usize,
}

impl Default for FskConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            bit_rate: 100,
            f0: 1000.0,
            f1: 2000.0,
            amplitude: 0.7,
            tolerance: None,
            sync_steps: 6,
        }
    }
}

impl FskConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 || self.bit_rate == 0 {
            return Err(TonelinkError::InvalidConfig(
                "sample rate and bit rate must be positive".into(),
            ));
        }
        if self.sample_rate % self.bit_rate != 0 {
            return Err(TonelinkError::InvalidConfig(format!(
                "bit rate {} does not divide sample rate {}",
                self.bit_rate, self.sample_rate
            )));
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        for tone in [self.f0, self.f1] {
            if !(tone > 0.0 && tone < nyquist) {
                return Err(TonelinkError::InvalidConfig(format!(
                    "tone {} Hz outside (0, {}) Hz",
                    tone, nyquist
                )));
            }
        }
        if (self.f0 - self.f1).abs() <= 2.0 * self.tolerance_hz() {
            return Err(TonelinkError::InvalidConfig(format!(
                "tones {} Hz and {} Hz are not separable",
                self.f0, self.f1
            )));
        }
        if !(self.amplitude > 0.0 && self.amplitude <= 1.0) {
            return Err(TonelinkError::InvalidConfig(format!(
                "amplitude {} outside (0, 1]",
                self.amplitude
            )));
        }
        if self.sync_steps == 0 {
            return Err(TonelinkError::InvalidConfig("sync steps must be positive".into()));
        }
        Ok(())
    }

    pub fn samples_per_bit(&self) -> usize {
        (self.sample_rate / self.bit_rate) as usize
    }

    /// Frequency resolution of one bit-long FFT window
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.samples_per_bit() as f32
    }

    pub fn tolerance_hz(&self) -> f32 {
        self.tolerance.unwrap_or(self.bin_width() / 2.0)
    }

    fn tone(&self, bit: bool) -> f32 {
        if bit {
            self.f1
        } else {
            self.f0
        }
    }
}

/// FSK modulator - turns a bit sequence into audio samples
pub struct FskModulator {
    config: FskConfig,
}

impl FskModulator {
    pub fn new(config: FskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FskConfig {
        &self.config
    }

    /// One bit period of the tone for `bit`
    pub fn modulate_bit(&self, bit: bool) -> Vec<f32> {
        let angular_freq = 2.0 * PI * self.config.tone(bit) / self.config.sample_rate as f32;
        (0..self.config.samples_per_bit())
            .map(|i| self.config.amplitude * (angular_freq * i as f32).sin())
            .collect()
    }

    pub fn modulate(&self, bits: &BitSlice<u8, Msb0>) -> Vec<f32> {
        let zero = self.modulate_bit(false);
        let one = self.modulate_bit(true);

        let mut samples = Vec::with_capacity(bits.len() * self.config.samples_per_bit());
        for bit in bits.iter().by_vals() {
            samples.extend_from_slice(if bit { &one } else { &zero });
        }
        samples
    }
}

/// FSK demodulator - picks the dominant frequency of each bit window
pub struct FskDemodulator {
    config: FskConfig,
    fft: Arc<dyn Fft<f32>>,
}

impl fmt::Debug for FskDemodulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FskDemodulator")
            .field("config", &self.config)
            .finish()
    }
}

impl FskDemodulator {
    pub fn new(config: FskConfig) -> Result<Self> {
        config.validate()?;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.samples_per_bit());
        Ok(Self { config, fft })
    }

    pub fn config(&self) -> &FskConfig {
        &self.config
    }

    /// Strongest frequency in a bit-long window, as (Hz, magnitude).
    ///
    /// Shorter windows are zero-padded and longer ones truncated. Only bins
    /// below Nyquist are searched; ties keep the lowest bin.
    pub fn dominant_frequency(&self, window: &[f32]) -> (f32, f32) {
        let n = self.config.samples_per_bit();
        let mut buffer: Vec<Complex<f32>> = window
            .iter()
            .take(n)
            .map(|&s| Complex::new(s, 0.0))
            .collect();
        buffer.resize(n, Complex::new(0.0, 0.0));
        self.fft.process(&mut buffer);

        let mut peak_bin = 0;
        let mut peak = buffer[0].norm();
        for (bin, value) in buffer.iter().enumerate().take(n / 2).skip(1) {
            let magnitude = value.norm();
            if magnitude > peak {
                peak = magnitude;
                peak_bin = bin;
            }
        }

        (peak_bin as f32 * self.config.bin_width(), peak)
    }

    /// `Some(bit)` when the window carries one of the two tones, `None` for noise
    pub fn classify(&self, window: &[f32]) -> Option<bool> {
        let (freq, _) = self.dominant_frequency(window);
        self.classify_frequency(freq)
    }

    fn classify_frequency(&self, freq: f32) -> Option<bool> {
        let tolerance = self.config.tolerance_hz();
        if (freq - self.config.f0).abs() <= tolerance {
            Some(false)
        } else if (freq - self.config.f1).abs() <= tolerance {
            Some(true)
        } else {
            None
        }
    }

    /// Classify consecutive bit windows starting at sample 0. A trailing partial window is dropped.
    pub fn demodulate(&self, samples: &[f32]) -> Vec<Option<bool>> {
        samples
            .chunks_exact(self.config.samples_per_bit())
            .map(|window| self.classify(window))
            .collect()
    }

    /// Recover one transmitted frame (preamble included) from a recording.
    ///
    /// Skips leading noise, aligns to the bit grid at the first tone, waits for
    /// the two `1`s that end the preamble and collects frame bits until the
    /// length field says the frame is complete. Windows holding neither tone
    /// are skipped.
    pub fn receive(&self, samples: &[f32]) -> Result<Bits> {
        let n = self.config.samples_per_bit();

        let first_tone = (0..)
            .map(|i| i * n)
            .take_while(|pos| pos + n <= samples.len())
            .find(|&pos| self.classify(&samples[pos..pos + n]).is_some())
            .ok_or(TonelinkError::NoSignal)?;

        let mut pos = self.align(samples, first_tone);
        debug!("tone at sample {}, bit grid aligned at {}", first_tone, pos);

        let mut assembler = FrameAssembler::new();
        let mut listening = false;
        let mut last_bit = None;

        while pos + n <= samples.len() {
            let bit = self.classify(&samples[pos..pos + n]);
            pos += n;

            if listening {
                match bit {
                    Some(bit) => {
                        if let Assembly::Complete(frame) = assembler.push(bit)? {
                            debug!("frame complete: {} bits", frame.len());
                            return Ok(frame);
                        }
                    }
                    None => trace!("noise window at sample {}", pos - n),
                }
            } else if bit == Some(true) && last_bit == Some(true) {
                debug!("preamble ended at sample {}", pos);
                listening = true;
            }

            last_bit = bit;
        }

        debug!(
            "recording ended after {} frame bits (expected {:?})",
            assembler.collected(),
            assembler.expected_len()
        );
        Err(TonelinkError::InsufficientData)
    }

    /// Offset within one bit period of `start` whose window holds the strongest tone
    fn align(&self, samples: &[f32], start: usize) -> usize {
        let n = self.config.samples_per_bit();
        let step = (n / self.config.sync_steps).max(1);

        let mut best = start;
        let mut best_magnitude = -1.0f32;
        for offset in (0..self.config.sync_steps).map(|k| start + k * step) {
            if offset + n > samples.len() {
                break;
            }
            let (freq, magnitude) = self.dominant_frequency(&samples[offset..offset + n]);
            if self.classify_frequency(freq).is_some() && magnitude > best_magnitude {
                best = offset;
                best_magnitude = magnitude;
            }
        }
        best
    }
}
