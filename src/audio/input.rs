use super::format::EncoderParams;
use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Source of interleaved little-endian 16-bit PCM, read in chunks.
pub trait PcmSource {
    /// Read up to `max_bytes` of PCM. Returns `None` once the source is
    /// exhausted; a returned chunk is never empty.
    fn read_chunk(&mut self, max_bytes: usize) -> Result<Option<Vec<u8>>>;
}

/// PCM taken from the data chunk of a WAV file.
pub struct WavInput {
    reader: WavReader<BufReader<File>>,
    spec: WavSpec,
}

impl WavInput {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {:?}", path))?;
        let spec = reader.spec();

        tracing::info!(
            "Opened {:?}: {} Hz, {} channel(s), {} bits",
            path,
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample
        );

        Ok(Self { reader, spec })
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Encoder parameters described by the WAV header.
    ///
    /// Float data is reported with its real bit depth so the session rejects
    /// it as an unsupported format.
    pub fn params(&self, bit_rate: i32) -> EncoderParams {
        let bits_per_sample = match self.spec.sample_format {
            SampleFormat::Int => i32::from(self.spec.bits_per_sample),
            SampleFormat::Float => 32,
        };
        EncoderParams::new(
            bit_rate,
            i32::from(self.spec.channels),
            self.spec.sample_rate as i32,
            bits_per_sample,
        )
    }
}

impl PcmSource for WavInput {
    fn read_chunk(&mut self, max_bytes: usize) -> Result<Option<Vec<u8>>> {
        let max_samples = (max_bytes / 2).max(1);
        let mut chunk = Vec::with_capacity(max_samples * 2);

        for sample in self.reader.samples::<i16>().take(max_samples) {
            let sample = sample.context("Failed to read WAV sample")?;
            chunk.extend_from_slice(&sample.to_le_bytes());
        }

        Ok((!chunk.is_empty()).then_some(chunk))
    }
}

/// Headerless PCM from any reader.
pub struct RawPcmInput<R> {
    reader: R,
}

impl<R: Read> RawPcmInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> PcmSource for RawPcmInput<R> {
    fn read_chunk(&mut self, max_bytes: usize) -> Result<Option<Vec<u8>>> {
        let mut chunk = vec![0u8; max_bytes.max(1)];
        let mut filled = 0;

        while filled < chunk.len() {
            let n = self
                .reader
                .read(&mut chunk[filled..])
                .context("Failed to read PCM input")?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        chunk.truncate(filled);
        Ok((!chunk.is_empty()).then_some(chunk))
    }
}
