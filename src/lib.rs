//! # endscan
//!
//! Find where episodes end inside videos that hold several of them back to
//! back.
//!
//! Given a folder of videos and the total number of episodes they contain,
//! `endscan` spreads the episodes evenly across the files, places a
//! checkpoint at each estimated boundary, samples one frame per second in a
//! window around every checkpoint, asks a vision model what text each frame
//! shows, and watches for an end card ("The End") followed by a blank frame.
//! The blank frame's timestamp is reported as the episode end.
//!
//! Decoding is done by FFmpeg via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next); text recognition
//! defaults to a local [Ollama](https://ollama.com) server.
//!
//! ## Quick Start
//!
//! ### Scan a folder
//!
//! ```no_run
//! use endscan::{OllamaRecognizer, Pipeline, PipelineOptions, RecognizerOptions};
//!
//! let recognizer = OllamaRecognizer::new(RecognizerOptions::new())?;
//! let report = Pipeline::new(&recognizer, PipelineOptions::new()).run("/videos/season_1", 12)?;
//!
//! for outcome in &report.processed {
//!     println!("{}: {:?}", outcome.video, outcome.end_timestamps);
//! }
//! for skipped in &report.skipped {
//!     eprintln!("skipped {}: {}", skipped.video, skipped.reason);
//! }
//! # Ok::<(), endscan::EndscanError>(())
//! ```
//!
//! ### Plan only
//!
//! ```
//! use endscan::{allocate_episodes, compute_checkpoints};
//!
//! let allocation = allocate_episodes(2, 5)?;
//! assert_eq!(allocation, vec![3, 2]);
//!
//! let checkpoints = compute_checkpoints(1200.0, allocation[0])?;
//! assert_eq!(checkpoints, vec![400.0, 800.0]);
//! # Ok::<(), endscan::EndscanError>(())
//! ```
//!
//! ### Custom recognizer
//!
//! Any `Fn(&SampledFrame) -> Result<String, EndscanError>` is a
//! [`TextRecognizer`], which is handy for tests or for wiring in another OCR
//! engine.
//!
//! ```no_run
//! use endscan::{EndscanError, Pipeline, PipelineOptions, SampledFrame};
//!
//! let recognizer = |frame: &SampledFrame| -> Result<String, EndscanError> {
//!     Ok(format!("frame at {}s", frame.timestamp))
//! };
//! let report = Pipeline::new(&recognizer, PipelineOptions::new()).run("/videos", 4)?;
//! # Ok::<(), endscan::EndscanError>(())
//! ```
//!
//! ## Logging
//!
//! The library logs through the [`log`](https://crates.io/crates/log)
//! facade. Install a logger such as `env_logger` to see per-video progress
//! (`info`) or every probe (`debug`). FFmpeg's own console output is set
//! separately with [`set_ffmpeg_log_level`].
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod config;
pub mod detector;
pub mod error;
pub mod ffmpeg;
pub mod media;
pub mod metadata;
pub mod pipeline;
pub mod planner;
pub mod preprocess;
pub mod progress;
pub mod recognition;
pub mod report;
pub mod sampler;
mod utilities;

pub use config::{
    DEFAULT_ENDPOINT, DEFAULT_FRAMES_DIR, DEFAULT_MODEL, DEFAULT_PROMPT, DEFAULT_RADIUS_SECONDS,
    DEFAULT_RESULTS_FILE, PipelineOptions, RecognizerOptions, SamplingOptions,
};
pub use detector::{
    CLEAR_MARKER, Detection, DetectorState, END_MARKER, EndDetector, RecognitionOutcome,
    RecognitionResult, detect_end_timestamps, detect_end_timestamps_with_progress,
};
pub use error::EndscanError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use media::{MediaFile, VideoSource};
pub use metadata::{MediaMetadata, VideoMetadata};
pub use pipeline::{
    BatchReport, Pipeline, PlannedVideo, SkippedVideo, VIDEO_EXTENSIONS, VideoOutcome,
    is_video_file, list_video_files, plan_batch,
};
pub use planner::{
    allocate_episodes, compute_checkpoints, parse_episode_count, validate_video_folder,
};
pub use preprocess::{FramePreprocessor, Passthrough, TextEnhancer};
pub use progress::{ProgressCallback, ProgressInfo, Stage};
pub use recognition::{OllamaRecognizer, TextRecognizer, encode_image};
pub use report::{DiagnosticLog, SEPARATOR};
pub use sampler::{
    FrameSampler, SampledFrame, artifact_file_name, parse_artifact_timestamp, round_timestamp,
};
