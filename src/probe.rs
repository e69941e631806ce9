//! Frame rate probing.
//!
//! [`probe_frame_rate`] asks `ffprobe` once for the average frame rate of a
//! video. The probe never fails: if the tool cannot be started, prints
//! nothing useful, or reports a degenerate rate, the result falls back to
//! [`FrameRate::DEFAULT`] (30/1) and carries a warning instead.
//!
//! # Example
//!
//! ```no_run
//! use framepipe::{ToolOptions, probe_frame_rate};
//!
//! let probe = probe_frame_rate("input.mp4", &ToolOptions::from_env());
//! if let Some(warning) = &probe.warning {
//!     eprintln!("guessing {}: {warning}", probe.rate);
//! }
//! println!("{} fps", probe.rate.as_f64());
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

use crate::configuration::ToolOptions;
use crate::error::FramePipeError;
use crate::ffmpeg::{self, Tool};
use crate::process;

/// A rational frame rate, `numerator / denominator` frames per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRate {
    /// Frames counted over `denominator` seconds.
    pub numerator: u32,
    /// Seconds over which `numerator` frames are counted.
    pub denominator: u32,
}

impl FrameRate {
    /// Rate assumed when probing fails: 30 fps.
    pub const DEFAULT: FrameRate = FrameRate {
        numerator: 30,
        denominator: 1,
    };

    /// Build a rate, rejecting zero numerators and denominators.
    pub fn new(numerator: u32, denominator: u32) -> Result<Self, FramePipeError> {
        if numerator == 0 || denominator == 0 {
            return Err(FramePipeError::InvalidFrameRate(format!(
                "{numerator}/{denominator}"
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for FrameRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for FrameRate {
    type Err = FramePipeError;

    /// Parse `num/den`, or a bare integer meaning `num/1`. Surrounding
    /// whitespace is ignored.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || FramePipeError::InvalidFrameRate(trimmed.to_string());
        let (numerator, denominator) = match trimmed.split_once('/') {
            Some((numerator, denominator)) => (numerator.trim(), denominator.trim()),
            None => (trimmed, "1"),
        };
        let numerator = numerator.parse::<u32>().map_err(|_| invalid())?;
        let denominator = denominator.parse::<u32>().map_err(|_| invalid())?;
        Self::new(numerator, denominator)
    }
}

/// Result of a frame rate probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRateProbe {
    /// The probed rate, or [`FrameRate::DEFAULT`] on fallback.
    pub rate: FrameRate,
    /// Why the default was used. `None` when the probe succeeded.
    pub warning: Option<String>,
}

impl FrameRateProbe {
    /// Whether the rate is the fallback rather than a probed value.
    pub fn is_fallback(&self) -> bool {
        self.warning.is_some()
    }

    /// Interpret `ffprobe` output. `stderr` is only used to explain a
    /// fallback.
    ///
    /// The first non-empty line of `stdout` must be a valid `num/den` rate;
    /// a bare number is not accepted here.
    pub fn from_output(input: &Path, stdout: &str, stderr: &str) -> Self {
        let first_line = stdout.lines().map(str::trim).find(|line| !line.is_empty());
        match first_line {
            Some(line) if !line.contains('/') => Self::fallback(
                input,
                format!("expected num/den, got {line:?}"),
                stderr,
            ),
            Some(line) => match line.parse::<FrameRate>() {
                Ok(rate) => Self {
                    rate,
                    warning: None,
                },
                Err(error) => Self::fallback(input, error.to_string(), stderr),
            },
            None => Self::fallback(input, "no frame rate in output".to_string(), stderr),
        }
    }

    fn fallback(input: &Path, reason: String, stderr: &str) -> Self {
        let mut warning = format!(
            "failed to read fps from {}: {reason}, assuming {}",
            input.display(),
            FrameRate::DEFAULT,
        );
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            warning.push_str(": ");
            warning.push_str(stderr);
        }
        log::warn!("{warning}");
        Self {
            rate: FrameRate::DEFAULT,
            warning: Some(warning),
        }
    }
}

/// Query the average frame rate of the first video stream in `input`.
///
/// Never returns an error; see [`FrameRateProbe`].
pub fn probe_frame_rate<P: AsRef<Path>>(input: P, tools: &ToolOptions) -> FrameRateProbe {
    let input = input.as_ref();
    let args = ffmpeg::probe_args(tools, input);
    match process::run_to_completion(tools, Tool::Ffprobe, &args) {
        Ok(output) => FrameRateProbe::from_output(
            input,
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        ),
        Err(error) => FrameRateProbe::fallback(input, error.to_string(), ""),
    }
}
