use super::sink::FrameSink;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// Synchronous file sink. Each chunk goes straight to a buffered writer on
/// the calling thread.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl FrameSink for FileSink {
    fn write_chunk(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }
}

enum WriteCommand {
    Chunk(Vec<u8>),
    Finalize { reply: oneshot::Sender<io::Result<u64>> },
}

/// Commands queued ahead of the writer thread before `write_chunk` blocks.
const WRITE_QUEUE_DEPTH: usize = 64;

/// File sink using a dedicated blocking thread for I/O
///
/// Chunks are copied into a bounded channel and written sequentially by the
/// writer thread. `write_chunk` blocks when the queue is full, so it must be
/// called from a plain thread, never from inside an async task. The first
/// write error stops the writer thread; the next `write_chunk` (or
/// `finalize`) returns that error.
pub struct ThreadedFileSink {
    path: PathBuf,
    tx: mpsc::Sender<WriteCommand>,
    failure: Arc<Mutex<Option<io::Error>>>,
}

impl ThreadedFileSink {
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {:?}", path))?;

        let (tx, mut rx) = mpsc::channel(WRITE_QUEUE_DEPTH);
        let failure = Arc::new(Mutex::new(None));
        let thread_failure = failure.clone();
        let thread_path = path.clone();

        std::thread::spawn(move || {
            let mut written = 0u64;

            while let Some(cmd) = rx.blocking_recv() {
                match cmd {
                    WriteCommand::Chunk(bytes) => match file.write_all(&bytes) {
                        Ok(()) => written += bytes.len() as u64,
                        Err(e) => {
                            tracing::error!("Failed to write to {:?}: {}", thread_path, e);
                            if let Ok(mut slot) = thread_failure.lock() {
                                *slot = Some(e);
                            }
                            break;
                        }
                    },
                    WriteCommand::Finalize { reply } => {
                        let _ = reply.send(file.flush().map(|_| written));
                        break;
                    }
                }
            }
        });

        Ok(Self { path, tx, failure })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush everything queued so far and stop the writer thread.
    ///
    /// Returns the number of bytes written to the file, or the write error
    /// that stopped the writer thread.
    pub async fn finalize(&mut self) -> Result<u64> {
        let (reply, rx) = oneshot::channel();
        let result = match self.tx.send(WriteCommand::Finalize { reply }).await {
            Ok(()) => rx.await.unwrap_or_else(|_| Err(self.writer_exited())),
            Err(_) => Err(self.writer_exited()),
        };

        let written =
            result.with_context(|| format!("Failed to finalize output file: {:?}", self.path))?;

        tracing::debug!("Finalized {:?} ({} bytes)", self.path, written);
        Ok(written)
    }

    fn take_failure(&self) -> Option<io::Error> {
        self.failure.lock().ok().and_then(|mut slot| slot.take())
    }

    /// The stored write error, or `BrokenPipe` once it has been reported.
    fn writer_exited(&self) -> io::Error {
        self.take_failure().unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "sink writer thread has exited")
        })
    }
}

impl FrameSink for ThreadedFileSink {
    fn write_chunk(&mut self, bytes: &[u8]) -> io::Result<()> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        self.tx
            .blocking_send(WriteCommand::Chunk(bytes.to_vec()))
            .map_err(|_| self.writer_exited())
    }
}
