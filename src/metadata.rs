//! Media metadata types.
//!
//! This module defines the metadata returned by
//! [`MediaFile::metadata`](crate::MediaFile::metadata). Metadata is read once
//! when the file is opened and stays immutable for the rest of the run.

use std::{path::Path, time::Duration};

use crate::error::EndscanError;

/// Container-level metadata for a media file.
///
/// # Example
///
/// ```no_run
/// use endscan::MediaFile;
///
/// let media = MediaFile::open("season_1.mkv")?;
/// let metadata = media.metadata();
/// println!("{}: {:?}", metadata.format, metadata.duration);
/// # Ok::<(), endscan::EndscanError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// Metadata for the best video stream, if the file has one.
    pub video: Option<VideoMetadata>,
    /// Container duration as reported by the demuxer.
    pub duration: Duration,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"matroska,webm"`).
    pub format: String,
}

/// Metadata for a video stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second. Zero when the stream does not declare one.
    pub frames_per_second: f64,
    /// Number of frames in the stream.
    ///
    /// Taken from the stream header when present, otherwise estimated from
    /// the container duration and the frame rate.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"hevc"`).
    pub codec: String,
}

impl MediaMetadata {
    /// Duration of the video in seconds, computed as frame count divided by
    /// frame rate.
    ///
    /// # Errors
    ///
    /// Returns [`EndscanError::UnreadableMedia`] when there is no video
    /// stream, or when the frame rate or frame count is unavailable.
    pub fn duration_seconds(&self, path: &Path) -> Result<f64, EndscanError> {
        let video = self
            .video
            .as_ref()
            .ok_or_else(|| EndscanError::UnreadableMedia {
                path: path.to_path_buf(),
                reason: "no video stream".to_string(),
            })?;

        if !video.frames_per_second.is_finite() || video.frames_per_second <= 0.0 {
            return Err(EndscanError::UnreadableMedia {
                path: path.to_path_buf(),
                reason: "frame rate unavailable".to_string(),
            });
        }
        if video.frame_count == 0 {
            return Err(EndscanError::UnreadableMedia {
                path: path.to_path_buf(),
                reason: "frame count unavailable".to_string(),
            });
        }

        Ok(video.frame_count as f64 / video.frames_per_second)
    }
}
