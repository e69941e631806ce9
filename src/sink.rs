//! Byte sinks receiving encoded frames.
//!
//! A [`ByteSink`] accepts encoded frame bytes and, once closed, tells its
//! consumer that no more input is coming. In production it wraps the
//! standard input of an `ffmpeg` encoder; any [`Write`] implementation works
//! through [`WriterSink`].

use std::io::{Error as IoError, ErrorKind, Write};

use crate::error::FramePipeError;

/// A writable stream of bytes with an explicit end-of-input signal.
pub trait ByteSink {
    /// Write `bytes`, returning how many were accepted. A count lower than
    /// `bytes.len()` means the sink stopped accepting data part-way.
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize>;

    /// Signal end-of-input. Later writes fail.
    fn close(&mut self) -> Result<(), FramePipeError>;
}

/// Adapts any [`Write`] into a [`ByteSink`].
///
/// Closing flushes and drops the writer, which for a pipe delivers
/// end-of-file to the reading process.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: Option<W>,
}

impl<W: Write> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    /// Whether [`close`](ByteSink::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Unwrap into the inner writer, or `None` once closed.
    pub fn into_inner(self) -> Option<W> {
        self.writer
    }
}

impl<W: Write> ByteSink for WriterSink<W> {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| IoError::new(ErrorKind::BrokenPipe, "sink is closed"))?;

        let mut written = 0;
        while written < bytes.len() {
            match writer.write(&bytes[written..]) {
                Ok(0) => break,
                Ok(count) => written += count,
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) if written == 0 => return Err(error),
                Err(error) => {
                    log::warn!("write stopped after {written} of {} bytes: {error}", bytes.len());
                    break;
                }
            }
        }
        Ok(written)
    }

    fn close(&mut self) -> Result<(), FramePipeError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
