//! FFmpeg-backed video access tests.
//!
//! Tests that need real media require `tests/fixtures/sample_video.mp4` and
//! return early when it is absent.

use std::path::Path;

use endscan::{EndscanError, MediaFile, VideoSource};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[test]
fn open_missing_file_fails() {
    let result = MediaFile::open("tests/fixtures/does_not_exist.mp4");
    assert!(matches!(result, Err(EndscanError::FileOpen { .. })));
}

#[test]
fn metadata_gives_duration_from_frames() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let media = MediaFile::open(path).expect("Failed to open fixture");
    let video = media.metadata().video.as_ref().expect("fixture has video");
    let duration = media.duration_seconds().unwrap();

    assert!(video.frames_per_second > 0.0);
    assert!(video.frame_count > 0);
    assert!((duration - video.frame_count as f64 / video.frames_per_second).abs() < 1e-9);
    assert_eq!(media.name(), "sample_video.mp4");
}

#[test]
fn frame_at_decodes_inside_the_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut media = MediaFile::open(path).expect("Failed to open fixture");
    let video = media.metadata().video.clone().expect("fixture has video");
    let duration = media.duration_seconds().unwrap();

    let first = media.frame_at(0.0).unwrap();
    assert_eq!((first.width(), first.height()), (video.width, video.height));

    let middle = media.frame_at(duration / 2.0).unwrap();
    assert_eq!(middle.width(), video.width);
}

#[test]
fn frame_at_rejects_out_of_range_times() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut media = MediaFile::open(path).expect("Failed to open fixture");
    let duration = media.duration_seconds().unwrap();

    for seconds in [-1.0, duration, duration + 30.0, f64::NAN] {
        assert!(
            matches!(
                media.frame_at(seconds),
                Err(EndscanError::FrameRetrieval { .. })
            ),
            "{seconds}s should not decode"
        );
    }
}
