// NOTE: The encoder only accepts 16-bit signed integer PCM, interleaved and
// little-endian. Anything else is rejected when the session is opened.

use crate::codec::EngineParams;
use crate::error::{EncoderError, Result};

/// Format parameters as supplied by the host, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParams {
    pub sample_rate: i32,
    pub bit_rate: i32,
    pub channels: i32,
    pub bits_per_sample: i32,
}

impl EncoderParams {
    pub fn new(bit_rate: i32, channels: i32, sample_rate: i32, bits_per_sample: i32) -> Self {
        Self {
            sample_rate,
            bit_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Check bit depth first, then the remaining fields.
    pub fn validate(&self) -> Result<AudioFormat> {
        if self.bits_per_sample != i32::from(AudioFormat::BITS_PER_SAMPLE) {
            return Err(EncoderError::UnsupportedFormat {
                bits_per_sample: self.bits_per_sample,
            });
        }

        let sample_rate = positive("sample_rate", self.sample_rate)?;
        let bit_rate = positive("bit_rate", self.bit_rate)?;
        let channels = positive("channels", self.channels)?;
        let channels = u16::try_from(channels).map_err(|_| EncoderError::InvalidParameter {
            name: "channels",
            value: i64::from(self.channels),
        })?;

        Ok(AudioFormat {
            sample_rate,
            bit_rate,
            channels,
        })
    }
}

fn positive(name: &'static str, value: i32) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(EncoderError::InvalidParameter {
            name,
            value: i64::from(value),
        })
}

/// Validated stream format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub bit_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    pub const BITS_PER_SAMPLE: u16 = 16;
    pub const BYTES_PER_SAMPLE: usize = 2;
    /// Samples per channel in one encoded frame.
    pub const SAMPLES_PER_FRAME: usize = 1024;

    /// PCM bytes consumed by one engine call.
    pub fn frame_byte_size(&self) -> usize {
        self.channels as usize * Self::BYTES_PER_SAMPLE * Self::SAMPLES_PER_FRAME
    }

    pub fn engine_params(&self) -> EngineParams {
        EngineParams {
            sample_rate: self.sample_rate,
            bit_rate: self.bit_rate,
            channels: self.channels,
            adts: true,
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            bit_rate: 64000,
            channels: 1,
        }
    }
}
