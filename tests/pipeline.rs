//! Batch driver tests.
//!
//! Most tests drive [`Pipeline::process_video`] with a synthetic video and a
//! scripted recognizer. The last section runs a real file from
//! `tests/fixtures/` when present.

use std::fs;
use std::path::{Path, PathBuf};

use endscan::{
    DiagnosticLog, EndscanError, Pipeline, PipelineOptions, SampledFrame, SamplingOptions,
    VideoSource, list_video_files,
};
use image::{DynamicImage, GrayImage, Luma};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

struct SyntheticVideo {
    path: PathBuf,
    duration: Option<f64>,
}

impl SyntheticVideo {
    fn new(dir: &Path, duration: f64) -> Self {
        Self {
            path: dir.join("season.mkv"),
            duration: Some(duration),
        }
    }

    fn unmeasurable(dir: &Path) -> Self {
        Self {
            path: dir.join("season.mkv"),
            duration: None,
        }
    }
}

impl VideoSource for SyntheticVideo {
    fn name(&self) -> &str {
        "season.mkv"
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn duration_seconds(&self) -> Result<f64, EndscanError> {
        self.duration.ok_or_else(|| EndscanError::UnreadableMedia {
            path: self.path.clone(),
            reason: "frame rate unavailable".to_string(),
        })
    }

    fn frame_at(&mut self, seconds: f64) -> Result<DynamicImage, EndscanError> {
        Ok(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            4,
            4,
            Luma([(seconds as u32 % 256) as u8]),
        )))
    }
}

/// End card at 395 then blank at 396; end card at 805-806 then blank at 807.
fn season_recognizer(frame: &SampledFrame) -> Result<String, EndscanError> {
    Ok(match frame.timestamp {
        395 => "THE END",
        396 => "None",
        805 | 806 => "The End",
        807 => "none",
        _ => "Next time on...",
    }
    .to_string())
}

// ── list_video_files ───────────────────────────────────────────────

#[test]
fn lists_only_videos_sorted_by_name() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.MP4", "a.mkv", "notes.txt", "c.wmv", "cover.jpg"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }
    fs::create_dir(dir.path().join("extras.mp4")).unwrap();

    let videos = list_video_files(dir.path()).unwrap();
    let names: Vec<_> = videos
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.mkv", "b.MP4", "c.wmv"]);
}

#[test]
fn folder_without_videos_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("readme.txt"), b"").unwrap();

    assert!(matches!(
        list_video_files(dir.path()),
        Err(EndscanError::InvalidInput(_))
    ));
}

// ── process_video ──────────────────────────────────────────────────

#[test]
fn finds_end_near_each_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let mut video = SyntheticVideo::new(dir.path(), 1200.0);
    let log = DiagnosticLog::new(dir.path().join("text_results.txt"));
    let pipeline = Pipeline::new(&season_recognizer, PipelineOptions::new());

    let outcome = pipeline.process_video(&mut video, 3, &log).unwrap();

    assert_eq!(outcome.video, "season.mkv");
    assert_eq!(outcome.checkpoints, vec![400.0, 800.0]);
    assert_eq!(outcome.end_timestamps, vec![396.0, 807.0]);
    assert_eq!(outcome.frames_sampled, 122);
    assert_eq!(outcome.recognition_failures, 0);

    let contents = fs::read_to_string(log.path()).unwrap();
    assert!(contents.starts_with("Text results for season.mkv:\n"));
    assert_eq!(contents.matches("Frame: ").count(), 122);
    assert!(dir.path().join("frames/season.mkv_396.png").exists());
}

#[test]
fn rerun_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let log = DiagnosticLog::new(dir.path().join("text_results.txt"));
    let pipeline = Pipeline::new(&season_recognizer, PipelineOptions::new());

    let first = pipeline
        .process_video(&mut SyntheticVideo::new(dir.path(), 1200.0), 3, &log)
        .unwrap();
    let second = pipeline
        .process_video(&mut SyntheticVideo::new(dir.path(), 1200.0), 3, &log)
        .unwrap();

    assert_eq!(first, second);
    let contents = fs::read_to_string(log.path()).unwrap();
    assert_eq!(contents.matches("Text results for season.mkv:").count(), 2);
}

#[test]
fn single_episode_file_is_logged_without_frames() {
    let dir = tempfile::tempdir().unwrap();
    let mut video = SyntheticVideo::new(dir.path(), 1200.0);
    let log = DiagnosticLog::new(dir.path().join("text_results.txt"));
    let pipeline = Pipeline::new(&season_recognizer, PipelineOptions::new());

    let outcome = pipeline.process_video(&mut video, 1, &log).unwrap();

    assert!(outcome.checkpoints.is_empty());
    assert!(outcome.end_timestamps.is_empty());
    assert_eq!(outcome.frames_sampled, 0);
    assert_eq!(
        fs::read_to_string(log.path()).unwrap(),
        "Text results for season.mkv:\n\n"
    );
}

#[test]
fn unmeasurable_video_fails_before_sampling() {
    let dir = tempfile::tempdir().unwrap();
    let mut video = SyntheticVideo::unmeasurable(dir.path());
    let log = DiagnosticLog::new(dir.path().join("text_results.txt"));
    let pipeline = Pipeline::new(&season_recognizer, PipelineOptions::new());

    let result = pipeline.process_video(&mut video, 3, &log);

    assert!(matches!(result, Err(EndscanError::UnreadableMedia { .. })));
    assert!(!log.path().exists());
    assert!(!dir.path().join("frames").exists());
}

#[test]
fn zero_duration_names_the_video() {
    let dir = tempfile::tempdir().unwrap();
    let mut video = SyntheticVideo::new(dir.path(), 0.0);
    let log = DiagnosticLog::new(dir.path().join("text_results.txt"));
    let pipeline = Pipeline::new(&season_recognizer, PipelineOptions::new());

    let error = pipeline.process_video(&mut video, 3, &log).unwrap_err();

    match &error {
        EndscanError::UnreadableMedia { path, .. } => {
            assert_eq!(path, &dir.path().join("season.mkv"));
        }
        other => panic!("expected unreadable media, got {other:?}"),
    }
    assert!(error.to_string().contains("season.mkv"));
}

#[test]
fn failed_recognition_is_counted() {
    let dir = tempfile::tempdir().unwrap();
    let mut video = SyntheticVideo::new(dir.path(), 100.0);
    let log = DiagnosticLog::new(dir.path().join("text_results.txt"));
    let options =
        PipelineOptions::new().with_sampling(SamplingOptions::new().with_radius(2));
    let recognizer = |frame: &SampledFrame| -> Result<String, EndscanError> {
        if frame.timestamp % 2 == 0 {
            Err(EndscanError::RecognitionFailed("model not loaded".to_string()))
        } else {
            Ok(String::new())
        }
    };
    let pipeline = Pipeline::new(&recognizer, options);

    let outcome = pipeline.process_video(&mut video, 2, &log).unwrap();

    assert_eq!(outcome.frames_sampled, 5);
    assert_eq!(outcome.recognition_failures, 3);
    let contents = fs::read_to_string(log.path()).unwrap();
    assert_eq!(
        contents.matches("[recognition failed: model not loaded]").count(),
        3
    );
}

// ── run / run_videos ───────────────────────────────────────────────

#[test]
fn undecodable_files_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.mp4"), b"definitely not a video").unwrap();
    fs::write(dir.path().join("b.mkv"), b"").unwrap();

    let pipeline = Pipeline::new(&season_recognizer, PipelineOptions::new());
    let report = pipeline.run(dir.path(), 5).unwrap();

    assert_eq!(report.allocation, vec![3, 2]);
    assert!(report.processed.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].video, "a.mp4");
    assert_eq!(report.results_path, dir.path().join("text_results.txt"));
}

#[test]
fn invalid_batch_configuration_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(&season_recognizer, PipelineOptions::new());

    assert!(matches!(
        pipeline.run(dir.path(), 4),
        Err(EndscanError::InvalidInput(_))
    ));
    assert!(matches!(
        pipeline.run(dir.path().join("missing"), 4),
        Err(EndscanError::InvalidInput(_))
    ));

    fs::write(dir.path().join("a.mp4"), b"").unwrap();
    assert!(matches!(
        pipeline.run(dir.path(), 0),
        Err(EndscanError::InvalidInput(_))
    ));
}

#[test]
fn results_file_name_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.mp4"), b"").unwrap();

    let options = PipelineOptions::new().with_results_file_name("season_2.txt");
    let report = Pipeline::new(&season_recognizer, options)
        .run(dir.path(), 2)
        .unwrap();

    assert_eq!(report.results_path, dir.path().join("season_2.txt"));
}

// ── real media ─────────────────────────────────────────────────────

#[test]
fn fixture_video_runs_end_to_end() {
    let source = Path::new(sample_video_path());
    if !source.exists() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    fs::copy(source, dir.path().join("sample_video.mp4")).unwrap();

    let options =
        PipelineOptions::new().with_sampling(SamplingOptions::new().with_radius(1));
    let recognizer = |_: &SampledFrame| -> Result<String, EndscanError> { Ok("None".into()) };
    let report = Pipeline::new(&recognizer, options).run(dir.path(), 2).unwrap();

    assert!(report.skipped.is_empty(), "skipped: {:?}", report.skipped);
    let outcome = &report.processed[0];
    assert_eq!(outcome.checkpoints.len(), 1);
    assert!(outcome.frames_sampled > 0);
    assert!(outcome.end_timestamps.is_empty());
    assert!(dir.path().join("frames").is_dir());
    assert!(report.results_path.exists());
}
