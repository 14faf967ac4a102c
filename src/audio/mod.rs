pub mod adts;
pub mod file_sink;
pub mod format;
pub mod input;
pub mod sink;

pub use adts::{AdtsFrames, AdtsHeader, AdtsSummary};
pub use file_sink::{FileSink, ThreadedFileSink};
pub use format::{AudioFormat, EncoderParams};
pub use input::{PcmSource, RawPcmInput, WavInput};
pub use sink::FrameSink;
