use crate::error::EncoderError;
use crate::session::EncoderStats;
use anyhow::Result;
use tokio::sync::oneshot;

/// Commands for the encoder service
pub enum EncoderCommand<S> {
    /// PCM of any length; frames are carried over between commands.
    Encode(Vec<u8>),
    Close(oneshot::Sender<Result<Finished<S>>>),
}

/// Outcome of a closed service: final counters and the sink, handed back so
/// the caller can finish it.
#[derive(Debug)]
pub struct Finished<S> {
    pub stats: EncoderStats,
    pub sink: S,
    /// First error raised while encoding a chunk, if any.
    pub first_error: Option<EncoderError>,
}

impl<S> Finished<S> {
    /// Fail if any chunk failed to encode.
    pub fn check(&self) -> Result<()> {
        match &self.first_error {
            None => Ok(()),
            Some(e) => Err(anyhow::anyhow!(
                "{} encode call(s) failed, first: {}",
                self.stats.failed_calls,
                e
            )),
        }
    }
}
