//! Reader, writer, and tool configuration.
//!
//! [`ReaderOptions`] and [`WriterOptions`] are builders that thread tool
//! locations, chunk sizes, pixel formats, and encoder settings through the
//! video reader and writer without polluting every constructor signature.
//! Both embed a [`ToolOptions`] describing where the `ffmpeg` binaries live
//! and how chatty they should be.
//!
//! # Example
//!
//! ```
//! use framepipe::{PixelFormat, ReaderOptions, ToolLogLevel, ToolOptions, VideoCodec, WriterOptions};
//!
//! let tools = ToolOptions::new()
//!     .with_prefix("/opt/ffmpeg/bin")
//!     .with_log_level(ToolLogLevel::Warning);
//!
//! let reader = ReaderOptions::new()
//!     .with_tools(tools.clone())
//!     .with_chunk_size(64 * 1024)
//!     .with_pixel_format(PixelFormat::Rgba8);
//!
//! let writer = WriterOptions::new()
//!     .with_tools(tools)
//!     .with_codec(VideoCodec::H265)
//!     .with_crf(20);
//! assert_eq!(writer.crf, Some(20));
//! ```

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::ffmpeg::{Tool, ToolLogLevel};
use crate::scanner::DEFAULT_CHUNK_SIZE;

/// Environment variable naming the directory that holds `ffmpeg` and
/// `ffprobe`.
pub const FF_PREFIX_ENV: &str = "FF_PREFIX";

/// Output pixel format for decoded frames.
///
/// Controls the colour model and depth of the [`DynamicImage`] values
/// returned by [`VideoReader`](crate::VideoReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit RGBA (32 bpp).
    Rgba8,
    /// 8-bit grayscale (8 bpp).
    Gray8,
}

impl PixelFormat {
    /// Convert a decoded image into this pixel format. Images already in the
    /// requested format are passed through untouched.
    pub fn convert(self, image: DynamicImage) -> DynamicImage {
        match (self, image) {
            (PixelFormat::Rgb8, image @ DynamicImage::ImageRgb8(_)) => image,
            (PixelFormat::Rgba8, image @ DynamicImage::ImageRgba8(_)) => image,
            (PixelFormat::Gray8, image @ DynamicImage::ImageLuma8(_)) => image,
            (PixelFormat::Rgb8, image) => DynamicImage::ImageRgb8(image.to_rgb8()),
            (PixelFormat::Rgba8, image) => DynamicImage::ImageRgba8(image.to_rgba8()),
            (PixelFormat::Gray8, image) => DynamicImage::ImageLuma8(image.to_luma8()),
        }
    }

    /// Bytes per pixel in this format.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Output video codec used by [`VideoWriter`](crate::VideoWriter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoCodec {
    /// H.264 / AVC. This is the default.
    #[default]
    H264,
    /// H.265 / HEVC.
    H265,
    /// MPEG-4 Part 2 (for AVI compatibility).
    Mpeg4,
}

impl VideoCodec {
    /// Name passed to `ffmpeg -vcodec`.
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264",
            VideoCodec::H265 => "hevc",
            VideoCodec::Mpeg4 => "mpeg4",
        }
    }
}

impl Display for VideoCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.ffmpeg_name())
    }
}

/// Where the external tools live and how verbose they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOptions {
    /// Directory containing `ffmpeg` and `ffprobe`. `None` resolves the
    /// bare program names through `PATH`.
    pub prefix: Option<PathBuf>,
    /// Verbosity passed to the tools via `-loglevel`. `None` leaves the
    /// tool default.
    pub log_level: Option<ToolLogLevel>,
}

impl ToolOptions {
    /// Tools resolved through `PATH`, default verbosity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the tool directory from the `FF_PREFIX` environment variable.
    /// An unset or empty variable means "use `PATH`".
    pub fn from_env() -> Self {
        let prefix = env::var_os(FF_PREFIX_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self {
            prefix,
            log_level: None,
        }
    }

    /// Look for the tools in `prefix` instead of `PATH`.
    #[must_use]
    pub fn with_prefix<P: AsRef<Path>>(mut self, prefix: P) -> Self {
        self.prefix = Some(prefix.as_ref().to_path_buf());
        self
    }

    /// Set the `-loglevel` passed to every spawned tool.
    #[must_use]
    pub fn with_log_level(mut self, level: ToolLogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Resolve the program path for `tool`.
    pub fn program(&self, tool: Tool) -> PathBuf {
        match &self.prefix {
            Some(prefix) => prefix.join(tool.program_name()),
            None => PathBuf::from(tool.program_name()),
        }
    }
}

/// Configuration for [`VideoReader`](crate::VideoReader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Tool location and verbosity.
    pub tools: ToolOptions,
    /// Bytes requested from the decoder's stdout per read.
    pub chunk_size: usize,
    /// Pixel format of returned frames.
    pub pixel_format: PixelFormat,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderOptions {
    /// Defaults: tools from `FF_PREFIX`, 1 KiB chunks, RGB8 frames.
    pub fn new() -> Self {
        Self {
            tools: ToolOptions::from_env(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            pixel_format: PixelFormat::Rgb8,
        }
    }

    /// Set the tool options.
    #[must_use]
    pub fn with_tools(mut self, tools: ToolOptions) -> Self {
        self.tools = tools;
        self
    }

    /// Set the read chunk size. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the pixel format of returned frames.
    #[must_use]
    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }
}

/// Configuration for [`VideoWriter`](crate::VideoWriter).
///
/// Controls the output codec, pixel format, and quality of the encoded
/// video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Tool location and verbosity.
    pub tools: ToolOptions,
    /// Codec to use. Default is H.264.
    pub codec: VideoCodec,
    /// Pixel format of the encoded video, as named by ffmpeg. Default:
    /// `yuv420p`.
    pub output_pixel_format: String,
    /// Constant Rate Factor for quality (0-51, lower is better).
    pub crf: Option<u32>,
    /// Bitrate in bits per second. Passed alongside CRF when both are set.
    pub bitrate: Option<usize>,
    /// Replace an existing output file. Default: `true`.
    pub overwrite: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl WriterOptions {
    /// Defaults: tools from `FF_PREFIX`, H.264, `yuv420p`, overwrite.
    pub fn new() -> Self {
        Self {
            tools: ToolOptions::from_env(),
            codec: VideoCodec::H264,
            output_pixel_format: "yuv420p".to_string(),
            crf: None,
            bitrate: None,
            overwrite: true,
        }
    }

    /// Set the tool options.
    #[must_use]
    pub fn with_tools(mut self, tools: ToolOptions) -> Self {
        self.tools = tools;
        self
    }

    /// Set the codec.
    #[must_use]
    pub fn with_codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the encoded pixel format (e.g. `yuv444p`).
    #[must_use]
    pub fn with_output_pixel_format(mut self, format: impl Into<String>) -> Self {
        self.output_pixel_format = format.into();
        self
    }

    /// Set the CRF quality value.
    #[must_use]
    pub fn with_crf(mut self, crf: u32) -> Self {
        self.crf = Some(crf);
        self
    }

    /// Set the target bitrate in bits per second.
    #[must_use]
    pub fn with_bitrate(mut self, bitrate: usize) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    /// Control whether an existing output file is replaced.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}
