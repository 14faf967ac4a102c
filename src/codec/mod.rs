//! Codec engine capability.
//!
//! The session never encodes audio itself. It drives an engine through the
//! [`CodecEngine`] trait: apply parameters once, then hand it one PCM frame
//! at a time together with an output buffer, and inspect the returned
//! [`EncodeOutcome`].

#[cfg(feature = "fdk")]
pub mod fdk;
pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use memory::{MemoryOperator, SystemMemory};

use std::fmt;
use std::sync::Arc;

/// Status reported by the engine for parameter application and per-frame
/// encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Success,
    /// The engine has no more output pending for the current input.
    InputBufferTooSmall,
    /// The output buffer could not hold everything; some input was left
    /// unconsumed.
    OutputBufferTooSmall,
    /// Any other engine-specific code. Always treated as fatal for the call.
    Other(u32),
}

impl EngineStatus {
    pub const SUCCESS_CODE: u32 = 0x0000_0000;
    pub const INPUT_BUFFER_SMALL_CODE: u32 = 0x8000_0005;
    pub const OUTPUT_BUFFER_SMALL_CODE: u32 = 0x8000_0006;

    pub fn from_code(code: u32) -> Self {
        match code {
            Self::SUCCESS_CODE => Self::Success,
            Self::INPUT_BUFFER_SMALL_CODE => Self::InputBufferTooSmall,
            Self::OUTPUT_BUFFER_SMALL_CODE => Self::OutputBufferTooSmall,
            other => Self::Other(other),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::Success => Self::SUCCESS_CODE,
            Self::InputBufferTooSmall => Self::INPUT_BUFFER_SMALL_CODE,
            Self::OutputBufferTooSmall => Self::OUTPUT_BUFFER_SMALL_CODE,
            Self::Other(code) => *code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::InputBufferTooSmall => write!(f, "input buffer too small"),
            Self::OutputBufferTooSmall => write!(f, "output buffer too small"),
            Self::Other(code) => write!(f, "status {:#010x}", code),
        }
    }
}

/// Parameters applied to a freshly created engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineParams {
    pub sample_rate: u32,
    pub bit_rate: u32,
    pub channels: u16,
    /// Emit self-describing ADTS frames.
    pub adts: bool,
}

/// Result of a single `encode_frame` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOutcome {
    pub status: EngineStatus,
    /// Bytes written to the front of the output buffer.
    pub output_len: usize,
    /// Input bytes the engine actually consumed.
    pub input_consumed: usize,
}

impl EncodeOutcome {
    pub fn success(output_len: usize, input_consumed: usize) -> Self {
        Self {
            status: EngineStatus::Success,
            output_len,
            input_consumed,
        }
    }

    pub fn with_status(status: EngineStatus) -> Self {
        Self {
            status,
            output_len: 0,
            input_consumed: 0,
        }
    }
}

/// A live engine instance. Dropping it releases every resource it holds.
///
/// Engines are not required to be `Send`; they stay on the thread that
/// created them.
pub trait CodecEngine {
    fn set_params(&mut self, params: &EngineParams) -> EngineStatus;

    /// Encode one PCM frame of interleaved little-endian 16-bit samples into
    /// `output`.
    fn encode_frame(&mut self, input: &[u8], output: &mut [u8]) -> EncodeOutcome;
}

/// Factory for engine instances.
///
/// The memory operator is handed to every engine it creates so that all
/// dynamic allocation on behalf of the engine goes through the caller's
/// allocator.
pub trait EngineBackend {
    fn name(&self) -> &'static str;

    fn create(
        &self,
        memory: Arc<dyn MemoryOperator>,
    ) -> Result<Box<dyn CodecEngine>, EngineStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_variants() {
        assert_eq!(EngineStatus::from_code(0), EngineStatus::Success);
        assert_eq!(
            EngineStatus::from_code(0x8000_0005),
            EngineStatus::InputBufferTooSmall
        );
        assert_eq!(
            EngineStatus::from_code(0x8000_0006),
            EngineStatus::OutputBufferTooSmall
        );
        assert_eq!(
            EngineStatus::from_code(0x8000_0001),
            EngineStatus::Other(0x8000_0001)
        );
    }

    #[test]
    fn code_is_preserved_for_unknown_statuses() {
        let status = EngineStatus::from_code(0x8000_0009);
        assert_eq!(status.code(), 0x8000_0009);
        assert!(!status.is_success());
        assert_eq!(status.to_string(), "status 0x80000009");
    }
}
