//! ADTS frame inspection.
//!
//! Every frame emitted with ADTS framing carries its own header, so a
//! produced stream can be walked frame by frame without any container.

/// Sampling frequencies addressed by the 4-bit index in the header.
const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

const SYNC_WORD: u16 = 0xfff;

/// Samples per channel carried by one raw data block.
pub const SAMPLES_PER_BLOCK: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    pub protection_absent: bool,
    /// Audio object type minus one (1 = AAC LC).
    pub profile: u8,
    pub sampling_index: u8,
    pub channel_config: u8,
    /// Length of the whole frame, header included.
    pub frame_length: usize,
    pub buffer_fullness: u16,
    pub raw_blocks: u8,
}

impl AdtsHeader {
    /// Parse the header at the start of `bytes`.
    ///
    /// Returns `None` when the sync word is missing, the buffer is shorter
    /// than the header, or the declared frame length is impossible.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 7 {
            return None;
        }

        let sync = (u16::from(bytes[0]) << 4) | (u16::from(bytes[1]) >> 4);
        if sync != SYNC_WORD {
            return None;
        }

        let protection_absent = bytes[1] & 0x01 == 1;
        let profile = bytes[2] >> 6;
        let sampling_index = (bytes[2] >> 2) & 0x0f;
        let channel_config = ((bytes[2] & 0x01) << 2) | (bytes[3] >> 6);
        let frame_length = (usize::from(bytes[3] & 0x03) << 11)
            | (usize::from(bytes[4]) << 3)
            | (usize::from(bytes[5]) >> 5);
        let buffer_fullness = (u16::from(bytes[5] & 0x1f) << 6) | (u16::from(bytes[6]) >> 2);
        let raw_blocks = bytes[6] & 0x03;

        let header = Self {
            protection_absent,
            profile,
            sampling_index,
            channel_config,
            frame_length,
            buffer_fullness,
            raw_blocks,
        };

        (frame_length >= header.header_len()).then_some(header)
    }

    pub fn header_len(&self) -> usize {
        if self.protection_absent { 7 } else { 9 }
    }

    pub fn payload_len(&self) -> usize {
        self.frame_length - self.header_len()
    }

    pub fn sample_rate(&self) -> Option<u32> {
        SAMPLE_RATES.get(usize::from(self.sampling_index)).copied()
    }

    /// PCM samples per channel represented by this frame.
    pub fn samples(&self) -> u32 {
        (u32::from(self.raw_blocks) + 1) * SAMPLES_PER_BLOCK
    }
}

/// Sampling-frequency index for a rate, if the rate is addressable.
pub fn sampling_index(sample_rate: u32) -> Option<u8> {
    SAMPLE_RATES
        .iter()
        .position(|r| *r == sample_rate)
        .map(|i| i as u8)
}

/// Iterator over complete ADTS frames in a buffer.
///
/// Stops at the first position that does not hold a complete frame.
pub struct AdtsFrames<'a> {
    data: &'a [u8],
}

impl<'a> AdtsFrames<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Bytes not consumed by the frames yielded so far.
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }
}

impl<'a> Iterator for AdtsFrames<'a> {
    type Item = (AdtsHeader, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let header = AdtsHeader::parse(self.data)?;
        if header.frame_length > self.data.len() {
            return None;
        }
        let (frame, rest) = self.data.split_at(header.frame_length);
        self.data = rest;
        Some((header, frame))
    }
}

/// Aggregate view of an ADTS stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdtsSummary {
    pub frames: usize,
    pub payload_bytes: usize,
    pub total_bytes: usize,
    pub samples: u64,
    pub sample_rate: Option<u32>,
    pub channel_config: Option<u8>,
    /// Trailing bytes that did not form a complete frame.
    pub unparsed_bytes: usize,
}

impl AdtsSummary {
    pub fn scan(data: &[u8]) -> Self {
        let mut summary = Self::default();
        let mut frames = AdtsFrames::new(data);

        for (header, frame) in frames.by_ref() {
            if summary.frames == 0 {
                summary.sample_rate = header.sample_rate();
                summary.channel_config = Some(header.channel_config);
            }
            summary.frames += 1;
            summary.total_bytes += frame.len();
            summary.payload_bytes += header.payload_len();
            summary.samples += u64::from(header.samples());
        }

        summary.unparsed_bytes = frames.remaining().len();
        summary
    }

    pub fn duration_secs(&self) -> f64 {
        match self.sample_rate {
            Some(rate) if rate > 0 => self.samples as f64 / f64::from(rate),
            _ => 0.0,
        }
    }

    /// Average bitrate over the whole stream, in bits per second.
    pub fn avg_bitrate(&self) -> f64 {
        let duration = self.duration_secs();
        if duration > 0.0 {
            (self.total_bytes as f64 * 8.0) / duration
        } else {
            0.0
        }
    }
}
