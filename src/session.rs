//! Streaming encode session.
//!
//! `EncodingSession` owns one engine instance, the validated format and the
//! output sink. PCM handed to [`EncodingSession::encode`] is cut into frames
//! of `frame_byte_size` bytes; each frame goes through the engine and
//! whatever it produces is appended to the sink before the next frame is
//! presented.

use crate::audio::{AudioFormat, EncoderParams, FrameSink};
use crate::codec::{CodecEngine, EngineBackend, EngineStatus, MemoryOperator, SystemMemory};
use crate::error::{EncoderError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tuning knobs that are not part of the stream format.
#[derive(Clone)]
pub struct SessionOptions {
    /// Size of the scratch output buffer. Defaults to twice the frame size.
    pub output_capacity: Option<usize>,
    /// Allocator shared with the engine and used for the scratch buffer.
    pub memory: Arc<dyn MemoryOperator>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            output_capacity: None,
            memory: Arc::new(SystemMemory),
        }
    }
}

impl SessionOptions {
    pub fn with_output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = Some(capacity);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryOperator>) -> Self {
        self.memory = memory;
        self
    }
}

/// Counters kept over the lifetime of a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncoderStats {
    /// Frames presented to the engine.
    pub engine_calls: u64,
    /// Frames whose output was forwarded to the sink.
    pub frames_encoded: u64,
    /// Frames the engine could only partially consume.
    pub degraded_frames: u64,
    /// `encode` calls that returned an error.
    pub failed_calls: u64,
    pub bytes_written: u64,
    /// PCM bytes discarded because they did not fill a frame.
    pub dropped_tail_bytes: u64,
}

pub struct EncodingSession<S: FrameSink> {
    engine: Option<Box<dyn CodecEngine>>,
    backend: &'static str,
    format: AudioFormat,
    frame_byte_size: usize,
    scratch: Vec<u8>,
    memory: Arc<dyn MemoryOperator>,
    sink: S,
    stats: EncoderStats,
}

impl<S: FrameSink> fmt::Debug for EncodingSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodingSession")
            .field("backend", &self.backend)
            .field("format", &self.format)
            .field("frame_byte_size", &self.frame_byte_size)
            .field("output_capacity", &self.scratch.len())
            .field("open", &self.engine.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<S: FrameSink> EncodingSession<S> {
    /// Open a session with default options.
    pub fn open<B>(backend: &B, params: &EncoderParams, sink: S) -> Result<Self>
    where
        B: EngineBackend + ?Sized,
    {
        Self::open_with(backend, params, sink, SessionOptions::default())
    }

    /// Validate `params`, create an engine and configure it.
    ///
    /// Validation happens before the backend is touched, so a rejected
    /// parameter set never acquires an engine. If the engine refuses the
    /// parameters it is released before the error is returned.
    pub fn open_with<B>(
        backend: &B,
        params: &EncoderParams,
        sink: S,
        options: SessionOptions,
    ) -> Result<Self>
    where
        B: EngineBackend + ?Sized,
    {
        Self::open_deferred(backend, params, options, || Ok(sink))
    }

    /// Like [`open_with`](Self::open_with), but the sink is only built once
    /// the engine has accepted the parameters. A failed open leaves whatever
    /// `make_sink` would have touched alone.
    pub fn open_deferred<B, F>(
        backend: &B,
        params: &EncoderParams,
        options: SessionOptions,
        make_sink: F,
    ) -> Result<Self>
    where
        B: EngineBackend + ?Sized,
        F: FnOnce() -> std::io::Result<S>,
    {
        let format = params.validate()?;
        let frame_byte_size = format.frame_byte_size();

        let output_capacity = options.output_capacity.unwrap_or(2 * frame_byte_size);
        if output_capacity == 0 {
            return Err(EncoderError::InvalidParameter {
                name: "output_capacity",
                value: 0,
            });
        }

        let mut engine = backend
            .create(options.memory.clone())
            .map_err(EncoderError::EngineInit)?;

        let status = engine.set_params(&format.engine_params());
        if !status.is_success() {
            drop(engine);
            warn!(
                backend = backend.name(),
                %status,
                "Engine rejected parameters"
            );
            return Err(EncoderError::EngineRejectedParameters(status));
        }

        let sink = make_sink()?;
        let scratch = options.memory.allocate(output_capacity);

        info!(
            backend = backend.name(),
            sample_rate = format.sample_rate,
            bit_rate = format.bit_rate,
            channels = format.channels,
            frame_bytes = frame_byte_size,
            output_capacity,
            "Encoding session opened"
        );

        Ok(Self {
            engine: Some(engine),
            backend: backend.name(),
            format,
            frame_byte_size,
            scratch,
            memory: options.memory,
            sink,
            stats: EncoderStats::default(),
        })
    }

    /// Encode as many whole frames of `pcm` as it holds.
    ///
    /// A trailing partial frame is dropped. `OutputBufferTooSmall` is
    /// recorded and tolerated, `InputBufferTooSmall` ends the call
    /// successfully, any other engine status fails this call only.
    pub fn encode(&mut self, pcm: &[u8]) -> Result<()> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(EncoderError::SessionClosed);
        };

        let mut windows = pcm.chunks_exact(self.frame_byte_size);

        for window in windows.by_ref() {
            self.stats.engine_calls += 1;
            let outcome = engine.encode_frame(window, &mut self.scratch);

            match outcome.status {
                EngineStatus::Success => {}
                EngineStatus::InputBufferTooSmall => {
                    debug!(
                        frame = self.stats.engine_calls,
                        "Engine has no more output for this input"
                    );
                    return Ok(());
                }
                EngineStatus::OutputBufferTooSmall => {
                    self.stats.degraded_frames += 1;
                    warn!(
                        frame = self.stats.engine_calls,
                        consumed = outcome.input_consumed,
                        frame_bytes = self.frame_byte_size,
                        "Output buffer too small, frame partially consumed"
                    );
                }
                EngineStatus::Other(code) => {
                    self.stats.failed_calls += 1;
                    return Err(EncoderError::EncodeFailed { code });
                }
            }

            let produced = outcome.output_len.min(self.scratch.len());
            if produced > 0 {
                if let Err(e) = self.sink.write_chunk(&self.scratch[..produced]) {
                    self.stats.failed_calls += 1;
                    return Err(e.into());
                }
                self.stats.bytes_written += produced as u64;
            }
            self.stats.frames_encoded += 1;

            debug!(
                frame = self.stats.engine_calls,
                size = produced,
                "Session encoded frame"
            );
        }

        let tail = windows.remainder().len();
        if tail > 0 {
            self.stats.dropped_tail_bytes += tail as u64;
            debug!(
                tail,
                frame_bytes = self.frame_byte_size,
                "Dropping partial frame"
            );
        }

        Ok(())
    }

    /// Release the engine. The sink stays open.
    pub fn close(&mut self) -> Result<()> {
        let Some(engine) = self.engine.take() else {
            return Err(EncoderError::AlreadyClosed);
        };
        drop(engine);
        self.memory.release(std::mem::take(&mut self.scratch));

        info!(
            backend = self.backend,
            frames = self.stats.frames_encoded,
            degraded = self.stats.degraded_frames,
            bytes = self.stats.bytes_written,
            "Encoding session closed"
        );
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn frame_byte_size(&self) -> usize {
        self.frame_byte_size
    }

    pub fn stats(&self) -> &EncoderStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Give the sink back to the caller, releasing the engine if the session
    /// is still open.
    pub fn into_sink(mut self) -> S {
        if self.engine.is_some() {
            let _ = self.close();
        }
        self.sink
    }
}
