use crate::codec::EngineStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EncoderError>;

/// Errors surfaced by an encoding session.
///
/// Engine failures carry the raw status so callers can diagnose them without
/// this crate interpreting engine-specific codes.
#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: i64 },

    #[error("Unsupported format: {bits_per_sample} bits per sample (only 16-bit PCM is supported)")]
    UnsupportedFormat { bits_per_sample: i32 },

    #[error("Codec engine could not be created: {0}")]
    EngineInit(EngineStatus),

    #[error("Codec engine rejected parameters: {0}")]
    EngineRejectedParameters(EngineStatus),

    #[error("Encode failed with engine status {code:#010x}")]
    EncodeFailed { code: u32 },

    #[error("Session is already open")]
    AlreadyOpen,

    #[error("Session is closed")]
    SessionClosed,

    #[error("Session already closed")]
    AlreadyClosed,

    #[error("Sink write failed: {0}")]
    Sink(#[from] std::io::Error),
}

impl EncoderError {
    /// Raw engine status code, when the error originated in the engine.
    pub fn status_code(&self) -> Option<u32> {
        match self {
            Self::EngineInit(status) | Self::EngineRejectedParameters(status) => {
                Some(status.code())
            }
            Self::EncodeFailed { code } => Some(*code),
            _ => None,
        }
    }
}
