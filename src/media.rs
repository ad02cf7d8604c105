//! Video access.
//!
//! [`VideoSource`] is the capability the sampler needs from a video: a name,
//! a location on disk, a duration, and "the nearest decodable frame at this
//! time". [`MediaFile`] implements it on top of FFmpeg.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{
    error::EndscanError,
    metadata::{MediaMetadata, VideoMetadata},
    utilities,
};

/// A video the sampler can probe.
///
/// Implementations are expected to be cheap to query for metadata and to
/// decode one frame per [`frame_at`](VideoSource::frame_at) call.
pub trait VideoSource {
    /// File name of the video, used to name frame artifacts.
    fn name(&self) -> &str;

    /// Location of the video on disk. Artifacts are written next to it.
    fn path(&self) -> &Path;

    /// Duration in seconds (frame count divided by frame rate).
    ///
    /// # Errors
    ///
    /// [`EndscanError::UnreadableMedia`] when the duration cannot be derived.
    fn duration_seconds(&self) -> Result<f64, EndscanError>;

    /// Return the first decodable frame at or after `seconds`.
    ///
    /// # Errors
    ///
    /// [`EndscanError::FrameRetrieval`] when the time is out of range or
    /// nothing can be decoded there.
    fn frame_at(&mut self, seconds: f64) -> Result<DynamicImage, EndscanError>;
}

/// A video file opened through FFmpeg.
///
/// # Example
///
/// ```no_run
/// use endscan::{MediaFile, VideoSource};
///
/// let mut media = MediaFile::open("season_1.mkv")?;
/// let duration = media.duration_seconds()?;
/// let frame = media.frame_at(duration / 2.0)?;
/// frame.save("middle.png")?;
/// # Ok::<(), endscan::EndscanError>(())
/// ```
pub struct MediaFile {
    input_context: Input,
    metadata: MediaMetadata,
    video_stream_index: Option<usize>,
    file_path: PathBuf,
    file_name: String,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a video file and read its metadata.
    ///
    /// Initializes FFmpeg (idempotent), opens the demuxer and inspects the
    /// best video stream. A file without a video stream still opens; its
    /// [`duration_seconds`](VideoSource::duration_seconds) will fail.
    ///
    /// # Errors
    ///
    /// Returns [`EndscanError::FileOpen`] if FFmpeg cannot open the file or
    /// read the video codec parameters.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EndscanError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| EndscanError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| EndscanError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };
        let format = input_context.format().name().to_string();

        let (video_stream_index, video) = match input_context.streams().best(Type::Video) {
            Some(stream) => {
                let index = stream.index();
                let decoder_context = CodecContext::from_parameters(stream.parameters())
                    .map_err(|error| EndscanError::FileOpen {
                        path: file_path.clone(),
                        reason: format!("Failed to read video codec parameters: {error}"),
                    })?;
                let decoder =
                    decoder_context
                        .decoder()
                        .video()
                        .map_err(|error| EndscanError::FileOpen {
                            path: file_path.clone(),
                            reason: format!("Failed to create video decoder: {error}"),
                        })?;

                let frames_per_second =
                    utilities::rational_to_fps(stream.avg_frame_rate(), stream.rate());
                let declared_frames = stream.frames();
                let frame_count = if declared_frames > 0 {
                    declared_frames as u64
                } else if frames_per_second > 0.0 {
                    (duration.as_secs_f64() * frames_per_second) as u64
                } else {
                    0
                };
                let codec = decoder
                    .codec()
                    .map(|codec| codec.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string());

                let metadata = VideoMetadata {
                    width: decoder.width(),
                    height: decoder.height(),
                    frames_per_second,
                    frame_count,
                    codec,
                };
                (Some(index), Some(metadata))
            }
            None => (None, None),
        };

        let metadata = MediaMetadata {
            video,
            duration,
            format,
        };

        log::info!(
            "Opened media file: {} (format={}, duration={:.2}s)",
            file_path.display(),
            metadata.format,
            metadata.duration.as_secs_f64(),
        );
        if let Some(video) = &metadata.video {
            log::debug!(
                "Video stream: {}x{}, {:.3} fps, {} frames, codec={}",
                video.width,
                video.height,
                video.frames_per_second,
                video.frame_count,
                video.codec,
            );
        }

        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.display().to_string());

        Ok(Self {
            input_context,
            metadata,
            video_stream_index,
            file_path,
            file_name,
        })
    }

    /// Metadata cached at open time.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    fn retrieval_error(seconds: f64, reason: impl Into<String>) -> EndscanError {
        EndscanError::FrameRetrieval {
            timestamp: seconds,
            reason: reason.into(),
        }
    }

    /// Seek to the keyframe before `seconds` and decode forward until the
    /// first frame whose presentation time reaches it.
    fn decode_frame_at(&mut self, seconds: f64) -> Result<DynamicImage, EndscanError> {
        let video_stream_index = self.video_stream_index.ok_or(EndscanError::NoVideoStream)?;
        let video = self
            .metadata
            .video
            .as_ref()
            .ok_or(EndscanError::NoVideoStream)?;
        let (width, height) = (video.width, video.height);

        let stream = self
            .input_context
            .stream(video_stream_index)
            .ok_or(EndscanError::NoVideoStream)?;
        let time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        let position = utilities::seconds_to_seek_position(seconds);
        self.input_context.seek(position, ..position)?;

        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if reaches_target(&decoded_frame, time_base, seconds) {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    return convert_frame_to_image(&rgb_frame, width, height);
                }
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if reaches_target(&decoded_frame, time_base, seconds) {
                scaler.run(&decoded_frame, &mut rgb_frame)?;
                return convert_frame_to_image(&rgb_frame, width, height);
            }
        }

        Err(Self::retrieval_error(seconds, "reached end of stream"))
    }
}

impl VideoSource for MediaFile {
    fn name(&self) -> &str {
        &self.file_name
    }

    fn path(&self) -> &Path {
        &self.file_path
    }

    fn duration_seconds(&self) -> Result<f64, EndscanError> {
        self.metadata.duration_seconds(&self.file_path)
    }

    fn frame_at(&mut self, seconds: f64) -> Result<DynamicImage, EndscanError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(Self::retrieval_error(seconds, "time is before the start"));
        }
        if self
            .duration_seconds()
            .is_ok_and(|duration| seconds >= duration)
        {
            return Err(Self::retrieval_error(seconds, "time is past the end"));
        }

        // Seek and decode failures are all reported as a missing sample.
        self.decode_frame_at(seconds).map_err(|error| match error {
            EndscanError::FrameRetrieval { .. } => error,
            other => Self::retrieval_error(seconds, other.to_string()),
        })
    }
}

/// Presentation time of a decoded frame in seconds.
///
/// Prefers FFmpeg's best-effort timestamp, which is filled in for containers
/// (AVI, FLV, WMV) whose packets often carry no PTS, and falls back to the
/// raw PTS.
fn frame_time(
    best_effort: Option<i64>,
    pts: Option<i64>,
    time_base: Rational,
) -> Option<f64> {
    best_effort
        .or(pts)
        .map(|timestamp| utilities::pts_to_seconds(timestamp, time_base))
}

/// Whether a frame decoded after the seek is the one to return for
/// `seconds`. A frame with no timestamp at all is taken as is, since the
/// seek already landed on the closest keyframe.
fn reaches_target(frame: &VideoFrame, time_base: Rational, seconds: f64) -> bool {
    frame_time(frame.timestamp(), frame.pts(), time_base).is_none_or(|time| time >= seconds)
}

/// Convert a scaled RGB24 frame to an [`image::DynamicImage`].
fn convert_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, EndscanError> {
    let buffer = utilities::frame_to_rgb_buffer(rgb_frame, width, height);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        EndscanError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_effort_timestamp_wins_over_pts() {
        let time_base = Rational::new(1, 1000);
        assert_eq!(frame_time(Some(2500), Some(0), time_base), Some(2.5));
        assert_eq!(frame_time(Some(2500), None, time_base), Some(2.5));
    }

    #[test]
    fn pts_is_used_when_best_effort_is_missing() {
        let time_base = Rational::new(1, 25);
        assert_eq!(frame_time(None, Some(50), time_base), Some(2.0));
        assert_eq!(frame_time(None, None, time_base), None);
    }

    #[test]
    fn untimed_frames_satisfy_any_probe() {
        let frame = VideoFrame::empty();
        assert!(frame.pts().is_none());
        assert!(reaches_target(&frame, Rational::new(1, 1000), 1290.0));
    }

    #[test]
    fn frames_with_only_pts_are_compared_by_pts() {
        let mut frame = VideoFrame::empty();
        frame.set_pts(Some(1_000));
        let time_base = Rational::new(1, 1000);
        assert!(reaches_target(&frame, time_base, 1.0));
        assert!(!reaches_target(&frame, time_base, 1.5));
    }
}
