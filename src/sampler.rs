//! Frame sampling around checkpoints.
//!
//! For every checkpoint `t` the sampler probes each whole-second offset in
//! `[t - radius, t + radius]`, asks the video for the nearest frame, runs the
//! preprocessing transform, and writes the result to
//! `<video dir>/<frames dir>/<video name>_<seconds>.png`. The returned
//! [`SampledFrame`] records are what the detector consumes; the file name is
//! a persisted copy of the same information.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SamplingOptions;
use crate::error::EndscanError;
use crate::media::VideoSource;
use crate::progress::{NoOpProgress, ProgressCallback, ProgressTracker, Stage};

/// Extension of every frame artifact.
pub const ARTIFACT_EXTENSION: &str = "png";

/// One persisted candidate frame.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SampledFrame {
    /// File name of the video the frame came from.
    pub video: String,
    /// Capture time in whole seconds.
    pub timestamp: i64,
    /// Where the preprocessed frame was written.
    pub path: PathBuf,
}

impl SampledFrame {
    /// Capture time as a real number of seconds.
    pub fn timestamp_seconds(&self) -> f64 {
        self.timestamp as f64
    }

    /// Rebuild a record from an artifact written by a previous run.
    ///
    /// # Errors
    ///
    /// Returns [`EndscanError::ArtifactName`] if the file name does not
    /// follow `<video>_<seconds>.png`.
    ///
    /// # Example
    ///
    /// ```
    /// use endscan::SampledFrame;
    ///
    /// let frame = SampledFrame::from_artifact("frames/show.mkv_1260.png")?;
    /// assert_eq!(frame.video, "show.mkv");
    /// assert_eq!(frame.timestamp, 1260);
    /// # Ok::<(), endscan::EndscanError>(())
    /// ```
    pub fn from_artifact<P: AsRef<Path>>(path: P) -> Result<Self, EndscanError> {
        let path = path.as_ref();
        let (video, timestamp) = split_artifact_name(path)?;
        Ok(Self {
            video,
            timestamp,
            path: path.to_path_buf(),
        })
    }
}

/// Round a probe time to the whole second used in artifact names.
///
/// Halves round to the even neighbour, so `1.5` and `2.5` both become `2`.
pub fn round_timestamp(seconds: f64) -> i64 {
    seconds.round_ties_even() as i64
}

/// File name of the artifact for `video_name` at `timestamp`.
pub fn artifact_file_name(video_name: &str, timestamp: i64) -> String {
    format!("{video_name}_{timestamp}.{ARTIFACT_EXTENSION}")
}

/// Read the timestamp back out of an artifact path.
///
/// # Errors
///
/// Returns [`EndscanError::ArtifactName`] for names without a `_` separator,
/// a `.png` extension, or an integer suffix.
pub fn parse_artifact_timestamp<P: AsRef<Path>>(path: P) -> Result<i64, EndscanError> {
    split_artifact_name(path.as_ref()).map(|(_, timestamp)| timestamp)
}

fn split_artifact_name(path: &Path) -> Result<(String, i64), EndscanError> {
    let malformed = || EndscanError::ArtifactName(path.display().to_string());

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(malformed)?;
    let stem = file_name
        .strip_suffix(ARTIFACT_EXTENSION)
        .and_then(|rest| rest.strip_suffix('.'))
        .ok_or_else(malformed)?;
    let (video, timestamp) = stem.rsplit_once('_').ok_or_else(malformed)?;
    if video.is_empty() {
        return Err(malformed());
    }
    let timestamp = timestamp.parse::<i64>().map_err(|_| malformed())?;

    Ok((video.to_string(), timestamp))
}

/// Samples and persists frames around checkpoints.
///
/// # Example
///
/// ```no_run
/// use endscan::{FrameSampler, MediaFile, SamplingOptions};
///
/// let mut media = MediaFile::open("season_1.mkv")?;
/// let options = SamplingOptions::new();
/// let frames = FrameSampler::new(&options).sample_window(&mut media, &[1320.0, 2640.0])?;
/// for frame in &frames {
///     println!("{} -> {}", frame.timestamp, frame.path.display());
/// }
/// # Ok::<(), endscan::EndscanError>(())
/// ```
pub struct FrameSampler<'a> {
    options: &'a SamplingOptions,
    progress: &'a dyn ProgressCallback,
}

impl<'a> FrameSampler<'a> {
    /// Create a sampler with no progress reporting.
    pub fn new(options: &'a SamplingOptions) -> Self {
        Self {
            options,
            progress: &NoOpProgress,
        }
    }

    /// Report one [`Stage::Sampling`] step per probe.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Directory that receives artifacts for `video`.
    pub fn frames_dir(&self, video: &dyn VideoSource) -> PathBuf {
        video
            .path()
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&self.options.frames_dir)
    }

    /// Probe the window around each checkpoint and persist what decodes.
    ///
    /// Probes run in checkpoint order and, within a window, in ascending
    /// offset order. A probe whose rounded timestamp was already captured by
    /// an earlier (overlapping) window is not decoded again. Probes that
    /// cannot be decoded are skipped.
    ///
    /// The result is sorted ascending by timestamp with no duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`EndscanError::IoError`] if the frames folder cannot be
    /// created, or [`EndscanError::ImageError`] if an artifact cannot be
    /// written.
    pub fn sample_window(
        &self,
        video: &mut dyn VideoSource,
        checkpoints: &[f64],
    ) -> Result<Vec<SampledFrame>, EndscanError> {
        let mut sampled: BTreeMap<i64, SampledFrame> = BTreeMap::new();
        if checkpoints.is_empty() {
            return Ok(Vec::new());
        }

        let output_dir = self.frames_dir(video);
        fs::create_dir_all(&output_dir)?;

        let radius = i64::from(self.options.radius_seconds);
        let total = checkpoints.len() as u64 * self.options.samples_per_checkpoint();
        let video_name = video.name().to_string();
        let mut tracker = ProgressTracker::new(self.progress, Stage::Sampling, &video_name, Some(total));

        for &checkpoint in checkpoints {
            log::debug!("Sampling {video_name} around {checkpoint:.3}s (±{radius}s)");

            for offset in -radius..=radius {
                let probe = checkpoint + offset as f64;
                let timestamp = round_timestamp(probe);

                if sampled.contains_key(&timestamp) {
                    log::trace!("{video_name}: {timestamp}s already sampled");
                    tracker.advance();
                    continue;
                }

                // A probe within half a second before the start names second 0.
                let probe = if probe < 0.0 && timestamp == 0 { 0.0 } else { probe };

                match video.frame_at(probe) {
                    Ok(frame) => {
                        let processed = self.options.preprocessor.process(&frame);
                        let path = output_dir.join(artifact_file_name(&video_name, timestamp));
                        processed.save(&path)?;
                        sampled.insert(
                            timestamp,
                            SampledFrame {
                                video: video_name.clone(),
                                timestamp,
                                path,
                            },
                        );
                    }
                    Err(error) => {
                        log::debug!("{video_name}: skipping sample at {probe:.3}s: {error}");
                    }
                }
                tracker.advance();
            }
        }

        if sampled.is_empty() {
            log::warn!(
                "No decodable frames in {video_name} around {} checkpoint(s)",
                checkpoints.len(),
            );
        }
        log::info!(
            "Sampled {} frame(s) from {video_name} around {} checkpoint(s)",
            sampled.len(),
            checkpoints.len(),
        );

        Ok(sampled.into_values().collect())
    }
}
