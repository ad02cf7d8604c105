//! End-credit detection.
//!
//! Recognized text is fed through a two-state machine in timestamp order.
//! Seeing "the end" arms the detector; the next frame whose text reads
//! "none" (no text on screen) confirms the end at that frame's timestamp and
//! disarms it again. Matching is case-insensitive substring matching.
//!
//! ```text
//! SEARCHING --"the end"--> ARMED --"none"--> SEARCHING  (emit timestamp)
//! ```

use crate::error::EndscanError;
use crate::progress::{NoOpProgress, ProgressCallback, ProgressTracker, Stage};
use crate::recognition::TextRecognizer;
use crate::sampler::SampledFrame;

/// Phrase that arms the detector.
pub const END_MARKER: &str = "the end";

/// Phrase that confirms an armed detection.
pub const CLEAR_MARKER: &str = "none";

/// Detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorState {
    /// Waiting for an end marker.
    #[default]
    Searching,
    /// End marker seen, waiting for a text-free frame.
    Armed,
}

/// The two-state end detector.
///
/// # Example
///
/// ```
/// use endscan::EndDetector;
///
/// let mut detector = EndDetector::new();
/// assert_eq!(detector.observe("THE END", 100.0), None);
/// assert_eq!(detector.observe("None", 101.0), Some(101.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EndDetector {
    state: DetectorState,
}

impl EndDetector {
    /// A detector in [`DetectorState::Searching`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Feed the text recognized in one frame.
    ///
    /// Returns the frame's timestamp when it confirms an end. Text that
    /// contains both markers leaves the state unchanged.
    pub fn observe(&mut self, text: &str, timestamp: f64) -> Option<f64> {
        let text = text.to_lowercase();
        let has_end = text.contains(END_MARKER);
        let has_clear = text.contains(CLEAR_MARKER);
        if has_end && has_clear {
            return None;
        }

        match self.state {
            DetectorState::Searching if has_end => {
                log::debug!("End marker at {timestamp}s");
                self.state = DetectorState::Armed;
                None
            }
            DetectorState::Armed if has_clear => {
                log::debug!("End confirmed at {timestamp}s");
                self.state = DetectorState::Searching;
                Some(timestamp)
            }
            _ => None,
        }
    }

    /// Drop any pending arm. An armed state at end of input emits nothing.
    pub fn finish(&mut self) {
        if self.state == DetectorState::Armed {
            log::debug!("End marker never confirmed");
        }
        self.state = DetectorState::Searching;
    }
}

/// What the recognizer produced for one frame.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecognitionOutcome {
    /// Text returned by the recognizer, possibly empty.
    Text(String),
    /// The recognizer failed; the reason is kept for the diagnostic log.
    Failed(String),
}

impl RecognitionOutcome {
    /// Text fed to the detector. Failures count as no text.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Failed(_) => "",
        }
    }

    /// Whether the recognizer failed for this frame.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One frame and what was read from it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RecognitionResult {
    pub frame: SampledFrame,
    pub outcome: RecognitionOutcome,
}

/// Detection output for one video.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Detection {
    /// Confirmed end timestamps, ascending.
    pub end_timestamps: Vec<f64>,
    /// Per-frame recognition results in processing order.
    pub results: Vec<RecognitionResult>,
}

impl Detection {
    /// Number of frames the recognizer failed on.
    pub fn failure_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome.is_failure())
            .count()
    }
}

/// Recognize each frame and run the detector over the results.
///
/// Frames are sorted by timestamp first, so the input order does not matter.
/// A recognizer error is recorded as [`RecognitionOutcome::Failed`] and the
/// frame is treated as having no text.
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
///
/// use endscan::{EndscanError, SampledFrame, detect_end_timestamps};
///
/// let frame = |timestamp: i64| SampledFrame {
///     video: "show.mp4".to_string(),
///     timestamp,
///     path: PathBuf::from(format!("frames/show.mp4_{timestamp}.png")),
/// };
/// let frames = vec![frame(10), frame(11), frame(12)];
///
/// let read = |frame: &SampledFrame| -> Result<String, EndscanError> {
///     Ok(match frame.timestamp {
///         10 => "The End".to_string(),
///         _ => "None".to_string(),
///     })
/// };
///
/// let detection = detect_end_timestamps(&frames, &read);
/// assert_eq!(detection.end_timestamps, vec![11.0]);
/// ```
pub fn detect_end_timestamps<R>(frames: &[SampledFrame], recognizer: &R) -> Detection
where
    R: TextRecognizer + ?Sized,
{
    detect_end_timestamps_with_progress(frames, recognizer, &NoOpProgress)
}

/// [`detect_end_timestamps`] with one [`Stage::Recognition`] step reported
/// per frame.
pub fn detect_end_timestamps_with_progress<R>(
    frames: &[SampledFrame],
    recognizer: &R,
    progress: &dyn ProgressCallback,
) -> Detection
where
    R: TextRecognizer + ?Sized,
{
    let mut ordered: Vec<&SampledFrame> = frames.iter().collect();
    ordered.sort_by_key(|frame| frame.timestamp);

    let video = ordered
        .first()
        .map(|frame| frame.video.clone())
        .unwrap_or_default();
    let mut tracker = ProgressTracker::new(
        progress,
        Stage::Recognition,
        &video,
        Some(ordered.len() as u64),
    );

    let mut detector = EndDetector::new();
    let mut detection = Detection::default();

    for frame in ordered {
        let outcome = match recognizer.recognize(frame) {
            Ok(text) => {
                if text.trim().is_empty() {
                    log::debug!("{}: no text returned", frame.path.display());
                }
                RecognitionOutcome::Text(text)
            }
            Err(error) => {
                log::warn!("{}: {error}", frame.path.display());
                RecognitionOutcome::Failed(failure_reason(error))
            }
        };

        if let Some(timestamp) = detector.observe(outcome.text(), frame.timestamp_seconds()) {
            detection.end_timestamps.push(timestamp);
        }
        detection.results.push(RecognitionResult {
            frame: frame.clone(),
            outcome,
        });
        tracker.advance();
    }
    detector.finish();

    detection
}

fn failure_reason(error: EndscanError) -> String {
    match error {
        EndscanError::RecognitionFailed(reason) => reason,
        other => other.to_string(),
    }
}
