//! Streaming frame-boundary scanner.
//!
//! [`FrameScanner`] cuts an unbounded stream of concatenated PNG files into
//! individual payloads. It keeps an accumulation buffer of everything read
//! but not yet returned, looks for the [`PNG_START`] signature, then for the
//! [`PNG_END`] trailer after it, and pulls one more chunk from its
//! [`ByteSource`] every time a search comes up short.
//!
//! Once a payload has been handed out, every byte up to and including its
//! trailer is dropped from the front of the buffer. A trailing frame that is
//! cut off by end-of-stream is discarded silently.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//!
//! use framepipe::{FrameScanner, PNG_END, PNG_START, ReaderSource};
//!
//! let mut stream = b"junk".to_vec();
//! stream.extend_from_slice(PNG_START.as_bytes());
//! stream.extend_from_slice(b"payload");
//! stream.extend_from_slice(PNG_END.as_bytes());
//!
//! let mut scanner = FrameScanner::new(ReaderSource::new(Cursor::new(stream)));
//! let payload = scanner.next_payload()?.expect("one frame");
//! assert!(payload.starts_with(PNG_START.as_bytes()));
//! assert!(payload.ends_with(PNG_END.as_bytes()));
//! assert!(scanner.next_payload()?.is_none());
//! # Ok::<(), framepipe::FramePipeError>(())
//! ```

use std::ops::Range;

use crate::error::FramePipeError;
use crate::marker::{MarkerSearch, PNG_END, PNG_START};
use crate::source::ByteSource;

/// Bytes requested from the source per failed search.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Location of one complete payload inside the accumulation buffer.
///
/// Half-open: `start` is the first byte of the start marker, `end` is one
/// past the last byte of the end marker. Only meaningful until the buffer is
/// next modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpan {
    /// Offset of the start marker.
    pub start: usize,
    /// Offset just past the end marker.
    pub end: usize,
}

impl FrameSpan {
    /// Payload length in bytes, markers included.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// A span always contains both markers, so this is `false` for any span
    /// produced by the scanner.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// The span as a slice range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Looking for a start marker at or after `from`.
    SeekingStart { from: usize },
    /// Start marker found at `start`; looking for the end marker at or
    /// after `from`.
    SeekingEnd { start: usize, from: usize },
}

/// Incremental scanner producing complete frame payloads from a byte source.
///
/// The scanner is pull-based: it reads from its source only while a call to
/// [`next_payload`](FrameScanner::next_payload) (or
/// [`next_payload_with`](FrameScanner::next_payload_with)) is in progress,
/// and never more than one chunk per failed search.
#[derive(Debug)]
pub struct FrameScanner<S> {
    source: S,
    buffer: Vec<u8>,
    chunk: Vec<u8>,
    phase: Phase,
    bytes_read: u64,
    frames_extracted: u64,
    exhausted: bool,
}

impl<S: ByteSource> FrameScanner<S> {
    /// Create a scanner reading [`DEFAULT_CHUNK_SIZE`] bytes at a time.
    pub fn new(source: S) -> Self {
        Self::with_chunk_size(source, DEFAULT_CHUNK_SIZE)
    }

    /// Create a scanner with a custom chunk size (clamped to at least 1).
    pub fn with_chunk_size(source: S, chunk_size: usize) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            chunk: vec![0; chunk_size.max(1)],
            phase: Phase::SeekingStart { from: 0 },
            bytes_read: 0,
            frames_extracted: 0,
            exhausted: false,
        }
    }

    /// Return the next complete payload, markers included.
    ///
    /// `Ok(None)` means the source ended before another complete payload
    /// was found. [`FramePipeError::SourceStalled`] means the source had
    /// nothing to offer yet; the buffered data is kept and calling again
    /// resumes the search.
    pub fn next_payload(&mut self) -> Result<Option<Vec<u8>>, FramePipeError> {
        self.next_payload_with(|payload| payload.to_vec())
    }

    /// Locate the next payload and pass it to `consume` while it is still
    /// inside the accumulation buffer, then discard it.
    ///
    /// Whatever `consume` returns is handed back; the payload bytes are
    /// dropped either way, so a consumer that rejects a payload does not
    /// stop the scan.
    pub fn next_payload_with<T>(
        &mut self,
        consume: impl FnOnce(&[u8]) -> T,
    ) -> Result<Option<T>, FramePipeError> {
        let Some(span) = self.locate()? else {
            return Ok(None);
        };
        log::debug!(
            "frame {} spans {} bytes ({}..{} of {} buffered)",
            self.frames_extracted,
            span.len(),
            span.start,
            span.end,
            self.buffer.len(),
        );
        let value = consume(&self.buffer[span.range()]);
        self.discard_through(span);
        Ok(Some(value))
    }

    /// Total bytes read from the source so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Number of payloads handed out so far.
    pub fn frames_extracted(&self) -> u64 {
        self.frames_extracted
    }

    /// Bytes read but not yet consumed into a returned payload.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Bytes requested per read.
    pub fn chunk_size(&self) -> usize {
        self.chunk.len()
    }

    /// Borrow the byte source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Drop the scanner state and return the byte source.
    pub fn into_source(self) -> S {
        self.source
    }

    fn locate(&mut self) -> Result<Option<FrameSpan>, FramePipeError> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            match self.phase {
                Phase::SeekingStart { from } => match PNG_START.find(&self.buffer, from) {
                    MarkerSearch::Found(start) => {
                        self.phase = Phase::SeekingEnd {
                            start,
                            from: start + PNG_START.len(),
                        };
                        continue;
                    }
                    MarkerSearch::NeedMore { resume_at } => {
                        self.phase = Phase::SeekingStart { from: resume_at };
                    }
                },
                Phase::SeekingEnd { start, from } => match PNG_END.find(&self.buffer, from) {
                    MarkerSearch::Found(end) => {
                        return Ok(Some(FrameSpan {
                            start,
                            end: end + PNG_END.len(),
                        }));
                    }
                    MarkerSearch::NeedMore { resume_at } => {
                        self.phase = Phase::SeekingEnd {
                            start,
                            from: resume_at,
                        };
                    }
                },
            }

            if !self.fill()? {
                self.exhausted = true;
                if !self.buffer.is_empty() {
                    log::debug!(
                        "stream ended after {} bytes; dropping {} unterminated bytes",
                        self.bytes_read,
                        self.buffer.len(),
                    );
                }
                return Ok(None);
            }
        }
    }

    /// Append one chunk to the buffer. Returns `false` at end-of-stream.
    fn fill(&mut self) -> Result<bool, FramePipeError> {
        if self.source.at_end() {
            return Ok(false);
        }
        let count = self.source.read_chunk(&mut self.chunk)?;
        if count > 0 {
            self.buffer.extend_from_slice(&self.chunk[..count]);
            self.bytes_read += count as u64;
            log::trace!("read {count} bytes (cursor at {})", self.bytes_read);
            return Ok(true);
        }
        if self.source.at_end() {
            Ok(false)
        } else {
            Err(FramePipeError::SourceStalled {
                bytes_read: self.bytes_read,
            })
        }
    }

    fn discard_through(&mut self, span: FrameSpan) {
        self.buffer.drain(..span.end);
        self.phase = Phase::SeekingStart { from: 0 };
        self.frames_extracted += 1;
    }
}
