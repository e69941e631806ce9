//! # framepipe
//!
//! Stream video frames through `ffmpeg` pipes.
//!
//! `framepipe` asks an external `ffmpeg` process to decode a video into a
//! stream of concatenated PNG files (`-f image2pipe -vcodec png`), cuts that
//! stream into individual frames with an incremental marker scanner, and
//! decodes each one into an [`image::DynamicImage`]. The reverse path encodes
//! images back to PNG and pipes them into a second `ffmpeg` that writes the
//! finished video.
//!
//! ## Quick Start
//!
//! ### Read Frames
//!
//! ```no_run
//! use framepipe::VideoReader;
//!
//! let mut reader = VideoReader::open("input.mp4")?;
//! while let Some(frame) = reader.next_frame()? {
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! # Ok::<(), framepipe::FramePipeError>(())
//! ```
//!
//! ### Re-encode With a Transform
//!
//! ```no_run
//! use framepipe::{ToolOptions, Transcoder, VideoReader, VideoWriter, WriterOptions, probe_frame_rate};
//!
//! let rate = probe_frame_rate("input.mp4", &ToolOptions::from_env()).rate;
//! let mut reader = VideoReader::open("input.mp4")?;
//! let mut writer = VideoWriter::create("output.mp4", rate, WriterOptions::new())?;
//! while let Some(frame) = reader.next_frame()? {
//!     writer.write_frame(&frame.fliph())?;
//! }
//! writer.finish()?;
//!
//! // Or all at once:
//! Transcoder::new("input.mp4", "flipped.mp4").run(|_, frame| Ok(frame.fliph()))?;
//! # Ok::<(), framepipe::FramePipeError>(())
//! ```
//!
//! ### Scan Any Byte Stream
//!
//! The scanner works on any [`std::io::Read`], not only on `ffmpeg` output:
//!
//! ```no_run
//! use std::fs::File;
//!
//! use framepipe::{FrameScanner, ReaderSource};
//!
//! let file = File::open("frames.bin")?;
//! let mut scanner = FrameScanner::new(ReaderSource::new(file));
//! while let Some(payload) = scanner.next_payload()? {
//!     println!("{} byte PNG", payload.len());
//! }
//! # Ok::<(), framepipe::FramePipeError>(())
//! ```
//!
//! ## Tools
//!
//! `ffmpeg` and `ffprobe` are looked up on `PATH`, or in the directory named
//! by the `FF_PREFIX` environment variable when it is set (see
//! [`ToolOptions::from_env`]).
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://crates.io/crates/log) facade.
//! Tool stderr is forwarded at `debug` level under the `framepipe::tool`
//! target.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`FrameStream`] for async frame reading via Tokio |
//! | `full` | Enables all of the above |

pub mod codec;
pub mod configuration;
pub mod error;
pub mod ffmpeg;
pub mod marker;
pub mod pipeline;
pub mod probe;
pub mod process;
pub mod progress;
pub mod reader;
pub mod scanner;
pub mod sink;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
mod utilities;
pub mod writer;

pub use configuration::{
    FF_PREFIX_ENV, PixelFormat, ReaderOptions, ToolOptions, VideoCodec, WriterOptions,
};
pub use error::FramePipeError;
pub use ffmpeg::{Tool, ToolLogLevel};
pub use marker::{Marker, MarkerSearch, PNG_END, PNG_START};
pub use pipeline::{TranscodeSummary, Transcoder};
pub use probe::{FrameRate, FrameRateProbe, probe_frame_rate};
pub use process::{ToolInput, ToolOutput, ToolProcess};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use reader::{FrameIterator, FrameReader, VideoReader};
pub use scanner::{DEFAULT_CHUNK_SIZE, FrameScanner, FrameSpan};
pub use sink::{ByteSink, WriterSink};
pub use source::{ByteSource, ReaderSource};
#[cfg(feature = "async")]
pub use stream::FrameStream;
pub use utilities::hex_dump;
pub use writer::{FrameWriter, VideoWriter};
