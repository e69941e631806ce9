//! Read → transform → write pipelines.
//!
//! [`Transcoder`] wires a [`VideoReader`] to a [`VideoWriter`]: every decoded
//! frame goes through a caller-supplied transform before being re-encoded.
//! The output frame rate is probed from the input unless set explicitly.
//!
//! Frames that fail to decode are skipped with a warning, and a stalled
//! decoder is simply read again; any other error stops the run. The run can be observed with a [`ProgressCallback`] and
//! stopped between frames with a [`CancellationToken`].
//!
//! # Example
//!
//! ```no_run
//! use framepipe::{Transcoder, codec};
//!
//! let summary = Transcoder::new("input.mp4", "output.mp4")
//!     .run(|_, frame| Ok(codec::swap_red_blue(frame)))?;
//! println!("{} frames at {}", summary.frames_written, summary.frame_rate);
//! # Ok::<(), framepipe::FramePipeError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;

use crate::configuration::{ReaderOptions, WriterOptions};
use crate::error::FramePipeError;
use crate::probe::{self, FrameRate};
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback, ProgressTracker};
use crate::reader::VideoReader;
use crate::writer::VideoWriter;

/// What a finished [`Transcoder`] run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeSummary {
    /// Frames written to the output.
    pub frames_written: u64,
    /// Payloads that failed to decode and were skipped.
    pub frames_skipped: u64,
    /// Frame rate used for the output.
    pub frame_rate: FrameRate,
    /// Warning from the frame rate probe, if it fell back to the default.
    pub probe_warning: Option<String>,
}

/// Builder for a transcoding run.
pub struct Transcoder {
    input: PathBuf,
    output: PathBuf,
    reader_options: ReaderOptions,
    writer_options: WriterOptions,
    frame_rate: Option<FrameRate>,
    progress: Arc<dyn ProgressCallback>,
    cancellation: Option<CancellationToken>,
    batch_size: u64,
}

impl Transcoder {
    /// Transcode `input` into `output` with default options.
    pub fn new<I: AsRef<Path>, O: AsRef<Path>>(input: I, output: O) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            reader_options: ReaderOptions::new(),
            writer_options: WriterOptions::new(),
            frame_rate: None,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Set the decoding side's options.
    #[must_use]
    pub fn with_reader_options(mut self, options: ReaderOptions) -> Self {
        self.reader_options = options;
        self
    }

    /// Set the encoding side's options.
    #[must_use]
    pub fn with_writer_options(mut self, options: WriterOptions) -> Self {
        self.writer_options = options;
        self
    }

    /// Use `rate` for the output instead of probing the input.
    #[must_use]
    pub fn with_frame_rate(mut self, rate: FrameRate) -> Self {
        self.frame_rate = Some(rate);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked before each frame.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Report progress every `size` frames. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Run the pipeline, passing every frame through `transform`.
    ///
    /// `transform` receives the frame's index in the input stream and the
    /// decoded image, and returns the image to encode.
    ///
    /// # Errors
    ///
    /// - [`FramePipeError::ToolSpawn`] if either `ffmpeg` cannot start.
    /// - [`FramePipeError::Cancelled`] if the token was cancelled.
    /// - [`FramePipeError::ToolFailed`] if either tool exits unsuccessfully.
    /// - Any error returned by `transform`, or from writing a frame.
    pub fn run<F>(self, mut transform: F) -> Result<TranscodeSummary, FramePipeError>
    where
        F: FnMut(u64, DynamicImage) -> Result<DynamicImage, FramePipeError>,
    {
        let (frame_rate, probe_warning) = match self.frame_rate {
            Some(rate) => (rate, None),
            None => {
                let probe = probe::probe_frame_rate(&self.input, &self.reader_options.tools);
                (probe.rate, probe.warning)
            }
        };
        log::info!(
            "Transcoding {:?} -> {:?} at {frame_rate} fps",
            self.input,
            self.output
        );

        let mut reader = VideoReader::open_with_options(&self.input, self.reader_options.clone())?;
        let mut writer =
            VideoWriter::create(&self.output, frame_rate, self.writer_options.clone())?;
        let mut tracker = ProgressTracker::new(Arc::clone(&self.progress), self.batch_size);
        let mut frames_skipped = 0;

        loop {
            if self
                .cancellation
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                log::info!("Transcoding cancelled after {} frames", writer.frames_written());
                return Err(FramePipeError::Cancelled);
            }

            let index = reader.payloads_seen();
            let frame = match reader.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(error @ FramePipeError::FrameDecode { .. }) => {
                    log::warn!("skipping frame {index}: {error}");
                    frames_skipped += 1;
                    continue;
                }
                Err(error @ FramePipeError::SourceStalled { .. }) => {
                    log::debug!("{error}; retrying");
                    std::thread::yield_now();
                    continue;
                }
                Err(error) => return Err(error),
            };

            let frame = transform(index, frame)?;
            writer.write_frame(&frame)?;
            tracker.advance(reader.bytes_read());
        }

        tracker.finish(reader.bytes_read());
        reader.close()?;
        let frames_written = writer.finish()?;

        Ok(TranscodeSummary {
            frames_written,
            frames_skipped,
            frame_rate,
            probe_warning,
        })
    }
}
