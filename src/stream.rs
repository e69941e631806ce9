//! Async frame streaming.
//!
//! [`FrameStream`] runs a [`VideoReader`] on a Tokio blocking thread and
//! delivers its frames through a bounded channel, so the runtime's worker
//! threads never sit in a blocking pipe read.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use framepipe::{FramePipeError, FrameStream, ReaderOptions};
//!
//! # async fn example() -> Result<(), FramePipeError> {
//! let mut stream = FrameStream::open("input.mp4", ReaderOptions::new());
//! while let Some(result) = stream.next().await {
//!     let (index, image) = result?;
//!     println!("frame {index}: {}x{}", image.width(), image.height());
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use image::DynamicImage;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use crate::configuration::ReaderOptions;
use crate::error::FramePipeError;
use crate::reader::VideoReader;

/// Default bounded-channel capacity.
///
/// Kept small so decoded frames do not pile up in memory ahead of a slow
/// consumer.
const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type FrameResult = Result<(u64, DynamicImage), FramePipeError>;

/// A stream of decoded frames produced on a background blocking thread.
///
/// Dropping the stream closes the channel; the background reader stops at
/// the next frame boundary and its `ffmpeg` process is killed.
pub struct FrameStream {
    receiver: Receiver<FrameResult>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl FrameStream {
    /// Start decoding `path` on a blocking thread. Must be called from
    /// within a Tokio runtime.
    pub fn open<P: Into<PathBuf>>(path: P, options: ReaderOptions) -> Self {
        Self::open_with_capacity(path, options, DEFAULT_CHANNEL_CAPACITY)
    }

    /// Like [`open`](FrameStream::open) with a custom channel capacity
    /// (clamped to at least 1).
    pub fn open_with_capacity<P: Into<PathBuf>>(
        path: P,
        options: ReaderOptions,
        capacity: usize,
    ) -> Self {
        let path = path.into();
        let (sender, receiver) = tokio::sync::mpsc::channel(capacity.max(1));
        let handle = tokio::task::spawn_blocking(move || {
            if let Err(error) = read_frames_blocking(path, options, &sender) {
                // The receiver may already be gone.
                let _ = sender.blocking_send(Err(error));
            }
        });
        Self { receiver, handle }
    }
}

impl Stream for FrameStream {
    type Item = FrameResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

fn read_frames_blocking(
    path: PathBuf,
    options: ReaderOptions,
    sender: &Sender<FrameResult>,
) -> Result<(), FramePipeError> {
    let mut reader = VideoReader::open_with_options(&path, options)?;
    for result in reader.frames() {
        if sender.blocking_send(result).is_err() {
            log::debug!("frame stream for {path:?} dropped by consumer");
            return Ok(());
        }
    }
    reader.close()
}
