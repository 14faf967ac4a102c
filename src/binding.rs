//! Host-facing facade.
//!
//! Mirrors the three calls a host runtime makes: open with plain integers
//! and an output path, encode raw bytes, close. At most one session is live
//! per `StreamEncoder`.

use crate::audio::{EncoderParams, FileSink};
use crate::codec::EngineBackend;
use crate::error::{EncoderError, Result};
use crate::session::{EncoderStats, EncodingSession, SessionOptions};

pub struct StreamEncoder<B: EngineBackend> {
    backend: B,
    options: SessionOptions,
    session: Option<EncodingSession<FileSink>>,
}

impl<B: EngineBackend> StreamEncoder<B> {
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, SessionOptions::default())
    }

    pub fn with_options(backend: B, options: SessionOptions) -> Self {
        Self {
            backend,
            options,
            session: None,
        }
    }

    /// Open a session writing ADTS frames to the file at `sink_target`.
    ///
    /// The file is created (or truncated) only after the engine has
    /// accepted the parameters, so a failed open leaves it untouched.
    pub fn open(
        &mut self,
        bit_rate: i32,
        channels: i32,
        sample_rate: i32,
        bits_per_sample: i32,
        sink_target: &str,
    ) -> Result<()> {
        if self.session.is_some() {
            return Err(EncoderError::AlreadyOpen);
        }

        let params = EncoderParams::new(bit_rate, channels, sample_rate, bits_per_sample);
        let session =
            EncodingSession::open_deferred(&self.backend, &params, self.options.clone(), || {
                FileSink::create(sink_target)
            })?;

        tracing::info!("Writing encoded stream to {}", sink_target);
        self.session = Some(session);
        Ok(())
    }

    pub fn encode(&mut self, pcm: &[u8]) -> Result<()> {
        self.session
            .as_mut()
            .ok_or(EncoderError::SessionClosed)?
            .encode(pcm)
    }

    /// Release the engine and flush the output file.
    pub fn close(&mut self) -> Result<EncoderStats> {
        let mut session = self.session.take().ok_or(EncoderError::AlreadyClosed)?;
        session.close()?;
        let stats = session.stats().clone();

        let mut sink = session.into_sink();
        sink.flush()?;
        Ok(stats)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn stats(&self) -> Option<&EncoderStats> {
        self.session.as_ref().map(|s| s.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EngineStatus;
    use crate::codec::testing::{DEFAULT_OUTPUT_LEN, ScriptedBackend};

    fn target(dir: &tempfile::TempDir) -> String {
        dir.path().join("out.aac").to_string_lossy().into_owned()
    }

    #[test]
    fn test_open_encode_close_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = target(&dir);
        let backend = ScriptedBackend::new();
        let mut encoder = StreamEncoder::new(backend.clone());

        encoder.open(64000, 1, 16000, 16, &path).unwrap();
        encoder.encode(&[0u8; 4096]).unwrap();
        let stats = encoder.close().unwrap();

        assert_eq!(stats.engine_calls, 2);
        assert_eq!(stats.bytes_written, 2 * DEFAULT_OUTPUT_LEN as u64);
        assert_eq!(
            std::fs::read(&path).unwrap().len(),
            2 * DEFAULT_OUTPUT_LEN
        );
        assert_eq!(backend.log().released, 1);
    }

    #[test]
    fn test_close_without_open_fails() {
        let mut encoder = StreamEncoder::new(ScriptedBackend::new());
        assert!(matches!(encoder.close(), Err(EncoderError::AlreadyClosed)));
    }

    #[test]
    fn test_encode_without_open_fails() {
        let backend = ScriptedBackend::new();
        let mut encoder = StreamEncoder::new(backend.clone());
        assert!(matches!(
            encoder.encode(&[0u8; 4096]),
            Err(EncoderError::SessionClosed)
        ));
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn test_double_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new();
        let mut encoder = StreamEncoder::new(backend.clone());

        encoder.open(64000, 1, 16000, 16, &target(&dir)).unwrap();
        encoder.close().unwrap();
        assert!(matches!(encoder.close(), Err(EncoderError::AlreadyClosed)));
        assert!(matches!(
            encoder.encode(&[0u8; 2048]),
            Err(EncoderError::SessionClosed)
        ));
        assert_eq!(backend.log().released, 1);
    }

    #[test]
    fn test_invalid_depth_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = target(&dir);
        let backend = ScriptedBackend::new();
        let mut encoder = StreamEncoder::new(backend.clone());

        let err = encoder.open(64000, 1, 16000, 8, &path).unwrap_err();
        assert!(matches!(err, EncoderError::UnsupportedFormat { .. }));
        assert!(!std::path::Path::new(&path).exists());
        assert_eq!(backend.log().created, 0);
        assert!(!encoder.is_open());
    }

    #[test]
    fn test_rejected_params_leave_existing_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = target(&dir);
        std::fs::write(&path, b"precious").unwrap();

        let backend = ScriptedBackend::new();
        backend.reject_params(EngineStatus::Other(0x8000_0004));
        let mut encoder = StreamEncoder::new(backend.clone());

        let err = encoder.open(64000, 1, 16000, 16, &path).unwrap_err();
        assert!(matches!(err, EncoderError::EngineRejectedParameters(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"precious");
        assert_eq!(backend.log().released, 1);
        assert!(!encoder.is_open());
    }

    #[test]
    fn test_engine_creation_failure_leaves_existing_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = target(&dir);
        std::fs::write(&path, b"precious").unwrap();

        let backend = ScriptedBackend::new();
        backend.fail_create(EngineStatus::Other(0x8000_0001));
        let mut encoder = StreamEncoder::new(backend);

        let err = encoder.open(64000, 1, 16000, 16, &path).unwrap_err();
        assert!(matches!(err, EncoderError::EngineInit(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"precious");
    }

    #[test]
    fn test_unwritable_target_releases_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.aac");
        let backend = ScriptedBackend::new();
        let mut encoder = StreamEncoder::new(backend.clone());

        let err = encoder
            .open(64000, 1, 16000, 16, &path.to_string_lossy())
            .unwrap_err();
        assert!(matches!(err, EncoderError::Sink(_)));
        assert_eq!(backend.log().created, 1);
        assert_eq!(backend.log().released, 1);
        assert!(!encoder.is_open());
    }

    #[test]
    fn test_second_open_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut encoder = StreamEncoder::new(ScriptedBackend::new());

        encoder.open(64000, 1, 16000, 16, &target(&dir)).unwrap();
        let err = encoder.open(64000, 1, 16000, 16, &target(&dir)).unwrap_err();
        assert!(matches!(err, EncoderError::AlreadyOpen));
        assert!(encoder.stats().is_some());
    }

    #[test]
    fn test_reopen_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ScriptedBackend::new();
        let mut encoder = StreamEncoder::new(backend.clone());

        encoder.open(64000, 1, 16000, 16, &target(&dir)).unwrap();
        encoder.close().unwrap();
        encoder.open(96000, 2, 44100, 16, &target(&dir)).unwrap();
        encoder.encode(&[0u8; 4096]).unwrap();
        encoder.close().unwrap();

        let log = backend.log();
        assert_eq!(log.created, 2);
        assert_eq!(log.released, 2);
        assert_eq!(log.calls, vec![4096]);
    }
}
