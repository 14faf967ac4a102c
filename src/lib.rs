//! Streaming PCM to AAC encoding.
//!
//! An [`EncodingSession`] owns a codec engine and an output sink. PCM of any
//! length goes in through [`EncodingSession::encode`], is cut into frames of
//! `channels * 2048` bytes, and every encoded ADTS frame is appended to the
//! sink as soon as the engine produces it.
//!
//! ```ignore
//! let mut session = EncodingSession::open(&FdkBackend, &params, Vec::new())?;
//! session.encode(&pcm)?;
//! session.close()?;
//! ```

pub mod audio;
pub mod binding;
pub mod codec;
pub mod config;
pub mod error;
pub mod services;
pub mod session;

pub use audio::{AudioFormat, EncoderParams, FrameSink};
pub use binding::StreamEncoder;
pub use codec::{CodecEngine, EncodeOutcome, EngineBackend, EngineParams, EngineStatus};
pub use error::{EncoderError, Result};
pub use session::{EncoderStats, EncodingSession, SessionOptions};
