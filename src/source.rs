//! Byte sources feeding the frame scanner.
//!
//! A [`ByteSource`] hands out bytes one chunk at a time and says when it has
//! nothing more to give. In production it wraps the standard output of an
//! `ffmpeg` process; any [`Read`] implementation works through
//! [`ReaderSource`], which is what the tests use.

use std::io::{ErrorKind, Read};

/// A readable stream of bytes consumed in bounded chunks.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes into `buf`, returning how many were read.
    ///
    /// Returning `Ok(0)` while [`at_end`](ByteSource::at_end) is still `false`
    /// means "nothing available right now"; callers may try again later.
    fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Whether the source has reported end-of-stream.
    fn at_end(&self) -> bool;
}

/// Adapts any [`Read`] into a [`ByteSource`].
///
/// `Interrupted` reads are retried. A zero-byte read marks the source as
/// finished. `WouldBlock` (non-blocking readers) is reported as a zero-byte
/// read without marking the end.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    finished: bool,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
        }
    }

    /// Borrow the wrapped reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Unwrap into the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.finished || buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.reader.read(buf) {
                Ok(0) => {
                    self.finished = true;
                    return Ok(0);
                }
                Ok(count) => return Ok(count),
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) if error.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(error) => return Err(error),
            }
        }
    }

    fn at_end(&self) -> bool {
        self.finished
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        (**self).read_chunk(buf)
    }

    fn at_end(&self) -> bool {
        (**self).at_end()
    }
}
