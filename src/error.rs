//! Error types for the `framepipe` crate.
//!
//! This module defines [`FramePipeError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context to
//! diagnose a failure without extra logging at the call site: the tool that
//! was spawned, the frame index that failed to decode, byte counts of short
//! writes, and the tail of the tool's stderr when it exits unsuccessfully.
//!
//! Reaching the end of a frame stream is **not** an error: readers report it
//! as `Ok(None)`.

use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;

/// The unified error type for all `framepipe` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramePipeError {
    /// The external tool could not be started at all.
    #[error("Failed to start {}: {source}", .program.display())]
    ToolSpawn {
        /// Resolved path of the program that was launched.
        program: PathBuf,
        /// Underlying OS error.
        #[source]
        source: IoError,
    },

    /// A spawned tool was missing one of its standard pipes.
    #[error("Tool process has no {0} pipe")]
    MissingPipe(&'static str),

    /// A located frame payload could not be decoded into an image.
    ///
    /// Non-fatal: the scanner has already moved past the payload, so the
    /// next read continues with the following frame.
    #[error("Failed to decode frame {frame_index}: {reason}")]
    FrameDecode {
        /// Zero-based index of the payload in the stream.
        frame_index: u64,
        /// Why the payload was rejected.
        reason: String,
    },

    /// An image could not be encoded into a frame payload.
    #[error("Failed to encode frame: {0}")]
    FrameEncode(String),

    /// Fewer bytes than the encoded frame were accepted by the sink.
    #[error("Short write: {written} of {expected} frame bytes written")]
    ShortWrite {
        /// Bytes the sink accepted.
        written: usize,
        /// Size of the encoded frame.
        expected: usize,
    },

    /// The byte source returned no data without reaching end-of-stream.
    ///
    /// Non-fatal: buffered data is kept and the next call resumes.
    #[error("Byte source stalled after {bytes_read} bytes")]
    SourceStalled {
        /// Total bytes read from the source so far.
        bytes_read: u64,
    },

    /// The external tool exited unsuccessfully.
    #[error("{} exited with {status}: {stderr}", .program.display())]
    ToolFailed {
        /// Resolved path of the program.
        program: PathBuf,
        /// Exit status as reported by the OS.
        status: String,
        /// Last lines the tool wrote to stderr.
        stderr: String,
    },

    /// A frame rate string was not of the form `numerator/denominator`.
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(String),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O error occurred while talking to a pipe or file.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),
}

impl FramePipeError {
    /// Returns `true` when the failure only affects the current call and the
    /// same reader can be asked for the next frame.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FramePipeError::FrameDecode { .. } | FramePipeError::SourceStalled { .. }
        )
    }
}
