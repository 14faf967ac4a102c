use std::io;

/// Append-only destination for encoded frames.
///
/// The session appends each chunk the engine produces as soon as it is
/// available, in order. Opening and closing the underlying storage is the
/// caller's business; a sink handed to a session is never closed by it.
pub trait FrameSink: Send {
    fn write_chunk(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl FrameSink for Vec<u8> {
    fn write_chunk(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn write_chunk(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_chunk(bytes)
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn write_chunk(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_chunk(bytes)
    }
}
