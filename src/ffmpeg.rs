//! Command lines for the external `ffmpeg` and `ffprobe` tools.
//!
//! The tools are always launched directly (never through a shell) with one
//! argument per `OsString`, so input and output paths need no quoting. Their
//! console verbosity is controlled per invocation with [`ToolLogLevel`],
//! which is separate from the Rust-side diagnostics emitted through the
//! [`log`](https://crates.io/crates/log) crate.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//!
//! use framepipe::{ToolLogLevel, ToolOptions, ffmpeg};
//!
//! let tools = ToolOptions::new().with_log_level(ToolLogLevel::Error);
//! let args = ffmpeg::decode_args(&tools, Path::new("input.mp4"));
//! assert_eq!(args[0], "-loglevel");
//! assert_eq!(args.last().unwrap(), "-");
//! ```

use std::ffi::OsString;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

use crate::configuration::{ToolOptions, WriterOptions};
use crate::probe::FrameRate;

/// The external programs this crate drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// The transcoder, used for both decoding and encoding.
    Ffmpeg,
    /// The metadata inspector, used by the frame rate probe.
    Ffprobe,
}

impl Tool {
    /// File name of the program, without any directory.
    pub fn program_name(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        }
    }
}

/// Tool console verbosity, passed as `-loglevel`.
///
/// # Ordering (most verbose → most quiet)
///
/// `Trace` > `Debug` > `Verbose` > `Info` > `Warning` > `Error` > `Fatal` > `Panic` > `Quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only log conditions that abort the process.
    Panic,
    /// Only log unrecoverable errors.
    Fatal,
    /// Log recoverable errors.
    Error,
    /// Log warnings.
    Warning,
    /// Log informational messages (the tools' default).
    Info,
    /// Log verbose informational messages.
    Verbose,
    /// Log debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl ToolLogLevel {
    /// The value given to `-loglevel`.
    pub fn as_str(self) -> &'static str {
        match self {
            ToolLogLevel::Quiet => "quiet",
            ToolLogLevel::Panic => "panic",
            ToolLogLevel::Fatal => "fatal",
            ToolLogLevel::Error => "error",
            ToolLogLevel::Warning => "warning",
            ToolLogLevel::Info => "info",
            ToolLogLevel::Verbose => "verbose",
            ToolLogLevel::Debug => "debug",
            ToolLogLevel::Trace => "trace",
        }
    }
}

impl Display for ToolLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiet" => Ok(ToolLogLevel::Quiet),
            "panic" => Ok(ToolLogLevel::Panic),
            "fatal" => Ok(ToolLogLevel::Fatal),
            "error" => Ok(ToolLogLevel::Error),
            "warning" | "warn" => Ok(ToolLogLevel::Warning),
            "info" => Ok(ToolLogLevel::Info),
            "verbose" => Ok(ToolLogLevel::Verbose),
            "debug" => Ok(ToolLogLevel::Debug),
            "trace" => Ok(ToolLogLevel::Trace),
            other => Err(format!("unknown tool log level: {other}")),
        }
    }
}

fn common_args(tools: &ToolOptions) -> Vec<OsString> {
    match tools.log_level {
        Some(level) => vec!["-loglevel".into(), level.as_str().into()],
        None => Vec::new(),
    }
}

/// Arguments that make `ffmpeg` decode `input` into concatenated PNG files
/// on stdout.
pub fn decode_args(tools: &ToolOptions, input: &Path) -> Vec<OsString> {
    let mut args = common_args(tools);
    args.push("-i".into());
    args.push(input.as_os_str().to_owned());
    for arg in ["-vcodec", "png", "-f", "image2pipe", "-"] {
        args.push(arg.into());
    }
    args
}

/// Arguments that make `ffmpeg` read concatenated images from stdin at
/// `frame_rate` and encode them into `output`.
pub fn encode_args(options: &WriterOptions, frame_rate: FrameRate, output: &Path) -> Vec<OsString> {
    let mut args = common_args(&options.tools);
    for arg in ["-f", "image2pipe", "-r"] {
        args.push(arg.into());
    }
    args.push(frame_rate.to_string().into());
    args.push("-i".into());
    args.push("-".into());
    args.push(if options.overwrite { "-y" } else { "-n" }.into());
    args.push("-pix_fmt".into());
    args.push(options.output_pixel_format.as_str().into());
    args.push("-vcodec".into());
    args.push(options.codec.ffmpeg_name().into());
    if let Some(crf) = options.crf {
        args.push("-crf".into());
        args.push(crf.to_string().into());
    }
    if let Some(bitrate) = options.bitrate {
        args.push("-b:v".into());
        args.push(bitrate.to_string().into());
    }
    args.push(output.as_os_str().to_owned());
    args
}

/// Arguments that make `ffprobe` print the average frame rate of the video
/// streams in `input`, one `num/den` per line.
pub fn probe_args(tools: &ToolOptions, input: &Path) -> Vec<OsString> {
    let mut args = common_args(tools);
    for arg in [
        "-select_streams",
        "v",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
        "-show_entries",
        "stream=avg_frame_rate",
    ] {
        args.push(arg.into());
    }
    args.push(input.as_os_str().to_owned());
    args
}
