use super::messages::{EncoderCommand, Finished};
use crate::audio::{EncoderParams, FrameSink};
use crate::codec::EngineBackend;
use crate::error::EncoderError;
use crate::session::{EncodingSession, SessionOptions};
use anyhow::Result;
use tokio::sync::{mpsc, oneshot};

/// Collects PCM until it covers whole frames.
#[derive(Debug)]
pub struct FrameAccumulator {
    frame_bytes: usize,
    pending: Vec<u8>,
}

impl FrameAccumulator {
    pub fn new(frame_bytes: usize) -> Self {
        Self {
            frame_bytes,
            pending: Vec::with_capacity(frame_bytes),
        }
    }

    /// Add `chunk` and take every whole frame collected so far. The result
    /// is empty when less than a frame is pending.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<u8> {
        self.pending.extend_from_slice(chunk);

        let whole = self.pending.len() / self.frame_bytes * self.frame_bytes;
        if whole == 0 {
            return Vec::new();
        }

        let rest = self.pending.split_off(whole);
        std::mem::replace(&mut self.pending, rest)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Serializes access to one encoding session
///
/// This service:
/// - Owns the session on a dedicated thread (engines may be thread-bound)
/// - Receives PCM chunks of any size via channel
/// - Regroups them into whole frames before encoding
/// - Hands the sink back on close
///
/// A failing chunk is logged and counted; the service keeps accepting input
/// and reports the first failure when it is closed.
pub struct EncoderService<S: FrameSink> {
    session: EncodingSession<S>,
    cmd_rx: mpsc::Receiver<EncoderCommand<S>>,
    pending: FrameAccumulator,
    first_error: Option<EncoderError>,
}

impl<S: FrameSink> EncoderService<S> {
    pub fn new(session: EncodingSession<S>, cmd_rx: mpsc::Receiver<EncoderCommand<S>>) -> Self {
        let pending = FrameAccumulator::new(session.frame_byte_size());
        Self {
            session,
            cmd_rx,
            pending,
            first_error: None,
        }
    }

    /// Process commands until `Close` arrives or every handle is dropped.
    pub fn run(mut self) {
        while let Some(cmd) = self.cmd_rx.blocking_recv() {
            match cmd {
                EncoderCommand::Encode(chunk) => self.handle_chunk(&chunk),
                EncoderCommand::Close(reply) => {
                    let _ = reply.send(self.finish());
                    return;
                }
            }
        }

        tracing::warn!("All encoder handles dropped without close, releasing session");
        if let Err(e) = self.session.close() {
            tracing::error!("Failed to close session: {}", e);
        }
    }

    fn handle_chunk(&mut self, chunk: &[u8]) {
        let frames = self.pending.push(chunk);
        if frames.is_empty() {
            return;
        }

        if let Err(e) = self.session.encode(&frames) {
            tracing::error!("Failed to encode audio chunk: {}", e);
            self.first_error.get_or_insert(e);
        }
    }

    fn finish(mut self) -> Result<Finished<S>> {
        self.session.close()?;

        let mut stats = self.session.stats().clone();
        stats.dropped_tail_bytes += self.pending.pending_len() as u64;

        tracing::info!(
            frames = stats.frames_encoded,
            failed_calls = stats.failed_calls,
            dropped_tail = stats.dropped_tail_bytes,
            "Encoder service stopped"
        );

        Ok(Finished {
            stats,
            sink: self.session.into_sink(),
            first_error: self.first_error,
        })
    }
}

/// Handle for communicating with the EncoderService
pub struct EncoderHandle<S> {
    tx: mpsc::Sender<EncoderCommand<S>>,
}

impl<S> Clone for EncoderHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S: FrameSink + 'static> EncoderHandle<S> {
    /// Open a session on a fresh worker thread and start serving it.
    ///
    /// Resolves once the session is open, so open failures surface here.
    pub async fn spawn<B>(
        backend: B,
        params: EncoderParams,
        sink: S,
        options: SessionOptions,
    ) -> Result<Self>
    where
        B: EngineBackend + Send + 'static,
    {
        let (tx, cmd_rx) = mpsc::channel(32);
        let (ready_tx, ready_rx) = oneshot::channel();

        std::thread::spawn(move || {
            match EncodingSession::open_with(&backend, &params, sink, options) {
                Ok(session) => {
                    let _ = ready_tx.send(Ok(()));
                    EncoderService::new(session, cmd_rx).run();
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            }
        });

        ready_rx
            .await
            .map_err(|e| anyhow::anyhow!("Encoder thread exited before opening: {}", e))??;

        Ok(Self { tx })
    }
}

impl<S> EncoderHandle<S> {
    pub async fn encode(&self, chunk: Vec<u8>) -> Result<()> {
        self.tx
            .send(EncoderCommand::Encode(chunk))
            .await
            .map_err(|_| anyhow::anyhow!("Failed to send encode command: service stopped"))
    }

    pub async fn close(&self) -> Result<Finished<S>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EncoderCommand::Close(reply))
            .await
            .map_err(|_| anyhow::anyhow!("Failed to send close command: service stopped"))?;

        rx.await
            .map_err(|e| anyhow::anyhow!("Failed to receive close response: {}", e))?
    }
}
