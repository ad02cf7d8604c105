//! Error types for the `endscan` crate.
//!
//! This module defines [`EndscanError`], the unified error type returned by
//! every fallible operation in the crate. Variants are grouped by how far a
//! failure is allowed to propagate: bad batch configuration stops the run,
//! an unreadable video skips that one file, and per-frame failures are
//! absorbed by the sampler and the detector.

use std::{
    io::Error as IoError,
    path::{Path, PathBuf},
};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `endscan` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EndscanError {
    /// Episode count, file count, or folder path failed validation.
    ///
    /// Raised before any planning happens. At batch level this is the only
    /// globally fatal error.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The duration of a video could not be derived from its frame rate and
    /// frame count.
    ///
    /// The pipeline skips the file and continues with the rest of the batch.
    #[error("Unreadable media{}: {reason}", describe_path(.path))]
    UnreadableMedia {
        /// Path of the offending video. Empty when the failure was raised
        /// from a bare duration, outside any video.
        path: PathBuf,
        /// Why the duration is unavailable.
        reason: String,
    },

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::MediaFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A single frame could not be retrieved at the requested time.
    ///
    /// The sampler treats this as "skip this sample"; it never escapes
    /// [`FrameSampler::sample_window`](crate::FrameSampler::sample_window).
    #[error("No decodable frame at {timestamp:.3}s: {reason}")]
    FrameRetrieval {
        /// Probe time in seconds.
        timestamp: f64,
        /// Seek or decode failure description.
        reason: String,
    },

    /// A decoded frame could not be turned into an image.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The text-recognition collaborator did not produce an answer.
    ///
    /// The detector records this as a failed outcome and feeds empty text
    /// to the state machine.
    #[error("Text recognition failed: {0}")]
    RecognitionFailed(String),

    /// A frame artifact file name does not follow the
    /// `<video>_<seconds>.png` convention.
    #[error("Malformed frame artifact name: {0}")]
    ArtifactName(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame artifact.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for EndscanError {
    fn from(error: FfmpegError) -> Self {
        EndscanError::FfmpegError(error.to_string())
    }
}

impl From<reqwest::Error> for EndscanError {
    fn from(error: reqwest::Error) -> Self {
        EndscanError::RecognitionFailed(error.to_string())
    }
}

fn describe_path(path: &Path) -> String {
    if path.as_os_str().is_empty() {
        String::new()
    } else {
        format!(" {}", path.display())
    }
}
