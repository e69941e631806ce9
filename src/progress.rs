//! Progress reporting and cancellation for frame pipelines.
//!
//! [`ProgressCallback`] receives [`ProgressInfo`] snapshots while a
//! [`Transcoder`](crate::Transcoder) runs, and [`CancellationToken`] lets any
//! thread ask it to stop between two frames.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framepipe::{CancellationToken, ProgressCallback, ProgressInfo, Transcoder};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!(
//!             "{} frames in {:.1?}, {:.1} fps",
//!             info.current, info.elapsed, info.throughput,
//!         );
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let summary = Transcoder::new("input.mp4", "output.mp4")
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_cancellation(token.clone())
//!     .run(|_, frame| Ok(frame))?;
//! # Ok::<(), framepipe::FramePipeError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of pipeline progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames processed so far.
    pub current: u64,
    /// Wall-clock time since the operation started.
    pub elapsed: Duration,
    /// Frames processed per second of wall-clock time.
    pub throughput: f64,
    /// Bytes read from the decoder so far.
    pub bytes_read: u64,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`] so a callback can be
/// shared with the async frame stream's worker thread.
///
/// Callbacks observe but cannot halt the operation; use
/// [`CancellationToken`] for that.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` frames and once at the end.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state: cancelling any clone cancels them all.
///
/// # Example
///
/// ```
/// use framepipe::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_copy = token.clone();
/// assert!(!worker_copy.is_cancelled());
///
/// token.cancel();
/// assert!(worker_copy.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks timing and fires the callback every `batch_size` frames.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, batch_size: u64) -> Self {
        Self {
            callback,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            since_last_report: 0,
        }
    }

    /// Record one processed frame.
    pub(crate) fn advance(&mut self, bytes_read: u64) {
        self.current += 1;
        self.since_last_report += 1;
        if self.since_last_report >= self.batch_size {
            self.report(bytes_read);
            self.since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self, bytes_read: u64) {
        self.report(bytes_read);
    }

    fn report(&self, bytes_read: u64) {
        let elapsed = self.start_time.elapsed();
        let seconds = elapsed.as_secs_f64();
        let throughput = if seconds > 0.0 {
            self.current as f64 / seconds
        } else {
            0.0
        };

        self.callback.on_progress(&ProgressInfo {
            current: self.current,
            elapsed,
            throughput,
            bytes_read,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{ProgressCallback, ProgressInfo, ProgressTracker};

    #[derive(Default)]
    struct Recorder {
        reports: Mutex<Vec<(u64, u64)>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            if let Ok(mut reports) = self.reports.lock() {
                reports.push((info.current, info.bytes_read));
            }
        }
    }

    #[test]
    fn reports_every_batch_and_at_finish() {
        let recorder = Arc::new(Recorder::default());
        let callback: Arc<dyn ProgressCallback> = Arc::clone(&recorder) as _;
        let mut tracker = ProgressTracker::new(callback, 2);
        for frame in 1..=5 {
            tracker.advance(frame * 100);
        }
        tracker.finish(555);

        let reports = recorder.reports.lock().unwrap().clone();
        assert_eq!(reports, vec![(2, 200), (4, 400), (5, 555)]);
    }

    #[test]
    fn zero_batch_size_reports_every_frame() {
        let recorder = Arc::new(Recorder::default());
        let callback: Arc<dyn ProgressCallback> = Arc::clone(&recorder) as _;
        let mut tracker = ProgressTracker::new(callback, 0);
        tracker.advance(1);
        tracker.advance(2);
        assert_eq!(recorder.reports.lock().unwrap().len(), 2);
    }
}
