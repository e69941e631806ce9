//! Pull-based video frame reading.
//!
//! [`FrameReader`] couples a [`FrameScanner`] with the PNG decoder: each call
//! to [`next_frame`](FrameReader::next_frame) reads just enough of its byte
//! source to cut out one payload and decodes it. [`VideoReader`] is a
//! `FrameReader` over the stdout of an `ffmpeg` process that decodes a video
//! file into `image2pipe` PNG output.
//!
//! # Example
//!
//! ```no_run
//! use framepipe::VideoReader;
//!
//! let mut reader = VideoReader::open("input.mp4")?;
//! for result in reader.frames() {
//!     let (index, image) = result?;
//!     image.save(format!("frame_{index:06}.png"))?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;

use image::DynamicImage;

use crate::codec;
use crate::configuration::{PixelFormat, ReaderOptions};
use crate::error::FramePipeError;
use crate::ffmpeg::{self, Tool};
use crate::process::{ToolOutput, ToolProcess};
use crate::scanner::FrameScanner;
use crate::source::ByteSource;
use crate::utilities;

/// Bytes from each end of a rejected payload shown in debug logs.
const DUMP_EDGE_BYTES: usize = 32;

/// Decodes frames out of any [`ByteSource`].
#[derive(Debug)]
pub struct FrameReader<S> {
    scanner: FrameScanner<S>,
    pixel_format: PixelFormat,
    frames_produced: u64,
}

/// A [`FrameReader`] fed by an `ffmpeg` decoding process.
///
/// The process is spawned by [`open`](FrameReader::open); its stdout is
/// first read on the first call to
/// [`next_frame`](FrameReader::next_frame). Dropping the reader kills the
/// process whatever state it is in.
pub type VideoReader = FrameReader<ToolOutput>;

impl<S: ByteSource> FrameReader<S> {
    /// Create a reader over `source` using the chunk size and pixel format
    /// from `options` (tool settings are ignored).
    pub fn new(source: S, options: &ReaderOptions) -> Self {
        Self {
            scanner: FrameScanner::with_chunk_size(source, options.chunk_size),
            pixel_format: options.pixel_format,
            frames_produced: 0,
        }
    }

    /// Decode the next frame.
    ///
    /// Returns `Ok(None)` once the stream has ended. A payload that fails to
    /// decode yields [`FramePipeError::FrameDecode`]; the reader has already
    /// moved past it, so calling again continues with the next frame.
    pub fn next_frame(&mut self) -> Result<Option<DynamicImage>, FramePipeError> {
        let pixel_format = self.pixel_format;
        let frame_index = self.scanner.frames_extracted();
        let decoded = self.scanner.next_payload_with(|payload| {
            codec::decode_frame(payload, pixel_format).map_err(|error| {
                log::warn!("frame {frame_index} ({} bytes) failed to decode: {error}", payload.len());
                log::debug!(
                    "rejected payload:\n{}",
                    utilities::payload_edges(payload, DUMP_EDGE_BYTES)
                );
                FramePipeError::FrameDecode {
                    frame_index,
                    reason: error.to_string(),
                }
            })
        })?;

        match decoded {
            None => Ok(None),
            Some(Ok(image)) => {
                self.frames_produced += 1;
                Ok(Some(image))
            }
            Some(Err(error)) => Err(error),
        }
    }

    /// Iterate over the remaining frames.
    pub fn frames(&mut self) -> FrameIterator<'_, S> {
        FrameIterator {
            reader: self,
            done: false,
        }
    }

    /// Frames decoded successfully so far.
    pub fn frames_produced(&self) -> u64 {
        self.frames_produced
    }

    /// Payloads located so far, including ones that failed to decode.
    pub fn payloads_seen(&self) -> u64 {
        self.scanner.frames_extracted()
    }

    /// Total bytes read from the source.
    pub fn bytes_read(&self) -> u64 {
        self.scanner.bytes_read()
    }

    /// Pixel format of returned frames.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Drop the reader state and return the byte source.
    pub fn into_source(self) -> S {
        self.scanner.into_source()
    }
}

impl FrameReader<ToolOutput> {
    /// Start decoding `path` with default [`ReaderOptions`].
    ///
    /// # Errors
    ///
    /// [`FramePipeError::ToolSpawn`] if `ffmpeg` cannot be started.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramePipeError> {
        Self::open_with_options(path, ReaderOptions::new())
    }

    /// Start decoding `path` with custom options.
    ///
    /// # Errors
    ///
    /// [`FramePipeError::ToolSpawn`] if `ffmpeg` cannot be started.
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        options: ReaderOptions,
    ) -> Result<Self, FramePipeError> {
        let path = path.as_ref();
        let args = ffmpeg::decode_args(&options.tools, path);
        let mut process = ToolProcess::spawn(&options.tools, Tool::Ffmpeg, &args)?;
        process.close_stdin();
        Ok(Self::new(ToolOutput::new(process), &options))
    }

    /// Stop reading.
    ///
    /// When every frame was read, waits for `ffmpeg` and reports a failed
    /// exit (for example a missing input file, which otherwise looks like
    /// an empty video) as [`FramePipeError::ToolFailed`]. Otherwise the
    /// process is killed.
    pub fn close(self) -> Result<(), FramePipeError> {
        self.into_source().close()
    }
}

/// Iterator over the remaining frames of a [`FrameReader`].
///
/// Yields `(index, image)` pairs where `index` counts payloads from the
/// start of the stream, so frames that failed to decode leave a gap.
/// Recoverable errors (decode failures, a stalled source) are yielded as
/// `Err` and iteration continues; any other error ends the iteration after
/// being yielded.
pub struct FrameIterator<'a, S> {
    reader: &'a mut FrameReader<S>,
    done: bool,
}

impl<S: ByteSource> Iterator for FrameIterator<'_, S> {
    type Item = Result<(u64, DynamicImage), FramePipeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let index = self.reader.payloads_seen();
        match self.reader.next_frame() {
            Ok(Some(image)) => Some(Ok((index, image))),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) if error.is_recoverable() => Some(Err(error)),
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}
