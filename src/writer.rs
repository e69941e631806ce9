//! Video writing through an encoder pipe.
//!
//! [`FrameWriter`] encodes each [`DynamicImage`] as a PNG payload and writes
//! it to a [`ByteSink`]. [`VideoWriter`] is a `FrameWriter` over the stdin of
//! an `ffmpeg` process reading `image2pipe` input at a fixed frame rate and
//! encoding it into a video file.
//!
//! # Example
//!
//! ```no_run
//! use framepipe::{FrameRate, VideoReader, VideoWriter, WriterOptions};
//!
//! let mut reader = VideoReader::open("input.mp4")?;
//! let mut writer = VideoWriter::create("output.mp4", FrameRate::new(25, 1)?, WriterOptions::new())?;
//! while let Some(frame) = reader.next_frame()? {
//!     writer.write_frame(&frame.grayscale())?;
//! }
//! writer.finish()?;
//! # Ok::<(), framepipe::FramePipeError>(())
//! ```

use std::path::Path;

use image::DynamicImage;

use crate::codec;
use crate::configuration::WriterOptions;
use crate::error::FramePipeError;
use crate::ffmpeg::{self, Tool};
use crate::probe::FrameRate;
use crate::process::{ToolInput, ToolProcess};
use crate::sink::ByteSink;

/// Encodes frames into any [`ByteSink`].
///
/// Dropping a writer without calling [`finish`](FrameWriter::finish) still
/// closes the sink; errors from that close are only logged.
#[derive(Debug)]
pub struct FrameWriter<K: ByteSink> {
    sink: K,
    frames_written: u64,
    bytes_written: u64,
    closed: bool,
}

/// A [`FrameWriter`] feeding an `ffmpeg` encoding process.
pub type VideoWriter = FrameWriter<ToolInput>;

impl<K: ByteSink> FrameWriter<K> {
    /// Create a writer over `sink`.
    pub fn new(sink: K) -> Self {
        Self {
            sink,
            frames_written: 0,
            bytes_written: 0,
            closed: false,
        }
    }

    /// Encode `image` and write the whole payload to the sink.
    ///
    /// # Errors
    ///
    /// - [`FramePipeError::FrameEncode`] if the image cannot be encoded.
    /// - [`FramePipeError::ShortWrite`] if the sink accepted only part of the
    ///   payload. The frame is not retried.
    /// - [`FramePipeError::IoError`] if the sink accepted nothing.
    pub fn write_frame(&mut self, image: &DynamicImage) -> Result<(), FramePipeError> {
        let payload = codec::encode_frame(image)?;
        let written = self.sink.write(&payload)?;
        self.bytes_written += written as u64;
        if written != payload.len() {
            return Err(FramePipeError::ShortWrite {
                written,
                expected: payload.len(),
            });
        }
        self.frames_written += 1;
        log::trace!(
            "wrote frame {} ({} bytes)",
            self.frames_written - 1,
            payload.len()
        );
        Ok(())
    }

    /// Frames written completely so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Bytes accepted by the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Close the sink, signalling end-of-input, and return the number of
    /// frames written.
    pub fn finish(mut self) -> Result<u64, FramePipeError> {
        self.closed = true;
        self.sink.close()?;
        log::debug!(
            "writer finished: {} frames, {} bytes",
            self.frames_written,
            self.bytes_written
        );
        Ok(self.frames_written)
    }
}

impl FrameWriter<ToolInput> {
    /// Start an encoder writing `path` at `frame_rate`.
    ///
    /// # Errors
    ///
    /// [`FramePipeError::ToolSpawn`] if `ffmpeg` cannot be started.
    pub fn create<P: AsRef<Path>>(
        path: P,
        frame_rate: FrameRate,
        options: WriterOptions,
    ) -> Result<Self, FramePipeError> {
        let path = path.as_ref();
        log::info!(
            "Writing {:?} (codec={}, fps={frame_rate})",
            path,
            options.codec
        );
        let args = ffmpeg::encode_args(&options, frame_rate, path);
        let process = ToolProcess::spawn(&options.tools, Tool::Ffmpeg, &args)?;
        Ok(Self::new(ToolInput::new(process)))
    }
}

impl<K: ByteSink> Drop for FrameWriter<K> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(error) = self.sink.close() {
            log::warn!("closing frame sink on drop failed: {error}");
        }
    }
}
