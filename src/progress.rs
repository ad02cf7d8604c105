//! Progress reporting.
//!
//! Sampling and recognition both walk a known number of items per video.
//! A [`ProgressCallback`] receives a [`ProgressInfo`] snapshot after each
//! item so a front end can draw a bar or print a counter.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use endscan::{PipelineOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(total) = info.total {
//!             println!("[{:?}] {}: {}/{}", info.stage, info.video, info.current, total);
//!         }
//!     }
//! }
//!
//! let options = PipelineOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// The pipeline stage a progress snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Stage {
    /// Probing timestamps around checkpoints and saving frames.
    Sampling,
    /// Sending saved frames to the text recognizer.
    Recognition,
}

/// A snapshot of progress within one stage of one video.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Stage being reported.
    pub stage: Stage,
    /// Name of the video being processed.
    pub video: String,
    /// Items finished so far.
    pub current: u64,
    /// Items expected in this stage, when known.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time since the stage started.
    pub elapsed: Duration,
}

/// Receives progress updates.
///
/// Callbacks observe only; they cannot stop the pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called after every processed item.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. Used when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Counts items for one stage and forwards snapshots to a callback.
pub(crate) struct ProgressTracker<'a> {
    callback: &'a dyn ProgressCallback,
    stage: Stage,
    video: String,
    total: Option<u64>,
    current: u64,
    start_time: Instant,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(
        callback: &'a dyn ProgressCallback,
        stage: Stage,
        video: &str,
        total: Option<u64>,
    ) -> Self {
        Self {
            callback,
            stage,
            video: video.to_string(),
            total,
            current: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one finished item and notify the callback.
    pub(crate) fn advance(&mut self) {
        self.current += 1;

        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32) * 100.0);

        self.callback.on_progress(&ProgressInfo {
            stage: self.stage,
            video: self.video.clone(),
            current: self.current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
        });
    }
}

/// Shared no-op callback for option defaults.
pub(crate) fn no_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NoOpProgress)
}
