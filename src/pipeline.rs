//! Batch driver.
//!
//! A batch is a folder of videos plus the total number of episodes they
//! contain. [`Pipeline`] allocates episodes to files, then for each video in
//! turn computes checkpoints, samples frames, runs recognition and the end
//! detector, and appends a section to the diagnostic log.
//!
//! A video that cannot be opened or measured is skipped and reported in
//! [`BatchReport::skipped`]; the rest of the batch still runs.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PipelineOptions;
use crate::detector::detect_end_timestamps_with_progress;
use crate::error::EndscanError;
use crate::media::{MediaFile, VideoSource};
use crate::planner::{allocate_episodes, compute_checkpoints, validate_video_folder};
use crate::recognition::TextRecognizer;
use crate::report::DiagnosticLog;
use crate::sampler::FrameSampler;

/// File extensions treated as videos, compared case-insensitively.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv", "wmv"];

/// Whether `path` has one of the [`VIDEO_EXTENSIONS`].
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
}

/// List the video files directly inside `folder`, sorted by file name.
///
/// # Errors
///
/// [`EndscanError::InvalidInput`] if the folder is missing or holds no
/// videos, [`EndscanError::IoError`] if it cannot be read.
pub fn list_video_files<P: AsRef<Path>>(folder: P) -> Result<Vec<PathBuf>, EndscanError> {
    let folder = validate_video_folder(folder)?;

    let mut videos = Vec::new();
    for entry in fs::read_dir(&folder)? {
        let path = entry?.path();
        if path.is_file() && is_video_file(&path) {
            videos.push(path);
        }
    }
    videos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if videos.is_empty() {
        return Err(EndscanError::InvalidInput(format!(
            "No video files found in {}",
            folder.display()
        )));
    }

    log::debug!("Found {} video file(s) in {}", videos.len(), folder.display());
    Ok(videos)
}

/// Episode count and checkpoints planned for one video.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PlannedVideo {
    pub video: String,
    pub episodes: u32,
    pub duration_seconds: Option<f64>,
    pub checkpoints: Vec<f64>,
    /// Why checkpoints could not be computed, if they could not.
    pub error: Option<String>,
}

/// Plan a batch without sampling or recognition.
///
/// Each video is opened only to read its duration.
///
/// # Errors
///
/// [`EndscanError::InvalidInput`] if `videos` is empty or `episode_count`
/// is zero. Per-video failures are reported in [`PlannedVideo::error`].
pub fn plan_batch(
    videos: &[PathBuf],
    episode_count: u32,
) -> Result<Vec<PlannedVideo>, EndscanError> {
    let allocation = allocate_episodes(videos.len(), episode_count)?;

    Ok(videos
        .iter()
        .zip(allocation)
        .map(|(path, episodes)| {
            let planned = MediaFile::open(path).and_then(|media| {
                let duration = media.duration_seconds()?;
                Ok((duration, compute_checkpoints(duration, episodes)?))
            });
            let video = display_name(path);
            match planned {
                Ok((duration, checkpoints)) => PlannedVideo {
                    video,
                    episodes,
                    duration_seconds: Some(duration),
                    checkpoints,
                    error: None,
                },
                Err(error) => PlannedVideo {
                    video,
                    episodes,
                    duration_seconds: None,
                    checkpoints: Vec::new(),
                    error: Some(error.to_string()),
                },
            }
        })
        .collect())
}

/// Result for one processed video.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VideoOutcome {
    pub video: String,
    pub episodes: u32,
    pub duration_seconds: f64,
    pub checkpoints: Vec<f64>,
    /// Confirmed episode end times, ascending.
    pub end_timestamps: Vec<f64>,
    pub frames_sampled: usize,
    pub recognition_failures: usize,
}

/// A video left out of the batch, and why.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SkippedVideo {
    pub video: String,
    pub reason: String,
}

/// Summary of a batch run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchReport {
    /// Episodes assigned to each video, in input order.
    pub allocation: Vec<u32>,
    pub processed: Vec<VideoOutcome>,
    pub skipped: Vec<SkippedVideo>,
    /// Diagnostic log that received this batch's sections.
    pub results_path: PathBuf,
}

/// Runs the planner, sampler and detector over a batch of videos.
///
/// # Example
///
/// ```no_run
/// use endscan::{OllamaRecognizer, Pipeline, PipelineOptions, RecognizerOptions};
///
/// let recognizer = OllamaRecognizer::new(RecognizerOptions::new())?;
/// let pipeline = Pipeline::new(&recognizer, PipelineOptions::new());
/// let report = pipeline.run("/videos/season_1", 24)?;
/// for outcome in &report.processed {
///     println!("{}: {:?}", outcome.video, outcome.end_timestamps);
/// }
/// # Ok::<(), endscan::EndscanError>(())
/// ```
pub struct Pipeline<'r, R: TextRecognizer + ?Sized> {
    recognizer: &'r R,
    options: PipelineOptions,
}

impl<'r, R: TextRecognizer + ?Sized> Pipeline<'r, R> {
    pub fn new(recognizer: &'r R, options: PipelineOptions) -> Self {
        Self {
            recognizer,
            options,
        }
    }

    /// Options in effect.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Process every video in `folder`.
    ///
    /// The diagnostic log is written to `<folder>/<results file name>`.
    ///
    /// # Errors
    ///
    /// [`EndscanError::InvalidInput`] if the folder is missing, contains no
    /// videos, or `episode_count` is zero.
    pub fn run<P: AsRef<Path>>(
        &self,
        folder: P,
        episode_count: u32,
    ) -> Result<BatchReport, EndscanError> {
        let folder = folder.as_ref();
        let videos = list_video_files(folder)?;
        let results_path = folder.join(&self.options.results_file_name);
        self.run_videos(&videos, episode_count, results_path)
    }

    /// Process an explicit list of videos, in order.
    ///
    /// # Errors
    ///
    /// [`EndscanError::InvalidInput`] if `videos` is empty or `episode_count`
    /// is zero. Failures of individual videos are reported as skipped.
    pub fn run_videos<P: Into<PathBuf>>(
        &self,
        videos: &[PathBuf],
        episode_count: u32,
        results_path: P,
    ) -> Result<BatchReport, EndscanError> {
        let allocation = allocate_episodes(videos.len(), episode_count)?;
        let diagnostics = DiagnosticLog::new(results_path);
        log::info!("Episodes per file: {allocation:?}");

        let mut processed = Vec::new();
        let mut skipped = Vec::new();

        for (path, &episodes) in videos.iter().zip(&allocation) {
            let result = MediaFile::open(path)
                .and_then(|mut media| self.process_video(&mut media, episodes, &diagnostics));
            match result {
                Ok(outcome) => processed.push(outcome),
                Err(error) => {
                    log::warn!("Skipping {}: {error}", path.display());
                    skipped.push(SkippedVideo {
                        video: display_name(path),
                        reason: error.to_string(),
                    });
                }
            }
        }

        Ok(BatchReport {
            allocation,
            processed,
            skipped,
            results_path: diagnostics.path().to_path_buf(),
        })
    }

    /// Run one video through checkpoints, sampling, detection and logging.
    ///
    /// # Errors
    ///
    /// [`EndscanError::UnreadableMedia`] if the duration is unavailable; I/O
    /// and image errors from writing artifacts or the diagnostic log.
    pub fn process_video(
        &self,
        video: &mut dyn VideoSource,
        episodes: u32,
        diagnostics: &DiagnosticLog,
    ) -> Result<VideoOutcome, EndscanError> {
        let name = video.name().to_string();
        log::info!("Processing video: {name}");

        let duration_seconds = video.duration_seconds()?;
        let checkpoints =
            compute_checkpoints(duration_seconds, episodes).map_err(|error| match error {
                EndscanError::UnreadableMedia { reason, .. } => EndscanError::UnreadableMedia {
                    path: video.path().to_path_buf(),
                    reason,
                },
                other => other,
            })?;
        log::info!("Checkpoints for {name}: {checkpoints:?}");

        let progress = &*self.options.progress;
        let frames = FrameSampler::new(&self.options.sampling)
            .with_progress(progress)
            .sample_window(video, &checkpoints)?;

        let detection = detect_end_timestamps_with_progress(&frames, self.recognizer, progress);
        log::info!("End times for {name}: {:?}", detection.end_timestamps);

        diagnostics.append_video(&name, &detection.results)?;

        let recognition_failures = detection.failure_count();
        Ok(VideoOutcome {
            video: name,
            episodes,
            duration_seconds,
            checkpoints,
            end_timestamps: detection.end_timestamps,
            frames_sampled: frames.len(),
            recognition_failures,
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_match_case_insensitively() {
        assert!(is_video_file(Path::new("a/show.MKV")));
        assert!(is_video_file(Path::new("show.wmv")));
        assert!(!is_video_file(Path::new("show.txt")));
        assert!(!is_video_file(Path::new("mp4")));
    }
}
