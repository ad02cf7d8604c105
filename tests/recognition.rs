//! Recognizer tests that do not need a running model server.

use std::time::Duration;

use endscan::{
    DEFAULT_ENDPOINT, DEFAULT_MODEL, EndscanError, OllamaRecognizer, RecognizerOptions,
    SampledFrame, TextRecognizer, encode_image,
};
use image::{Rgb, RgbImage};

fn artifact(dir: &std::path::Path) -> SampledFrame {
    let path = dir.join("show.mp4_12.png");
    RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])).save(&path).unwrap();
    SampledFrame::from_artifact(path).unwrap()
}

#[test]
fn options_default_to_local_ollama() {
    let options = RecognizerOptions::default();
    assert_eq!(options.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(options.model, DEFAULT_MODEL);
    assert!(options.timeout.is_none());

    let options = options
        .with_endpoint("http://gpu-box:11434/api/generate")
        .with_model("llava:13b")
        .with_timeout(Duration::from_secs(90));
    assert_eq!(options.endpoint, "http://gpu-box:11434/api/generate");
    assert_eq!(options.model, "llava:13b");
    assert_eq!(options.timeout, Some(Duration::from_secs(90)));
}

#[test]
fn encoded_image_is_standard_base64() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bytes.bin");
    std::fs::write(&path, b"hello?").unwrap();

    assert_eq!(encode_image(&path).unwrap(), "aGVsbG8/");
}

#[test]
fn unreachable_server_is_a_recognition_failure() {
    let dir = tempfile::tempdir().unwrap();
    let frame = artifact(dir.path());

    // Port 9 (discard) is closed on test machines; the connection is refused.
    let options = RecognizerOptions::new()
        .with_endpoint("http://127.0.0.1:9/api/generate")
        .with_timeout(Duration::from_secs(5));
    let recognizer = OllamaRecognizer::new(options).unwrap();

    assert!(matches!(
        recognizer.recognize(&frame),
        Err(EndscanError::RecognitionFailed(_))
    ));
}

#[test]
fn missing_artifact_is_a_recognition_failure() {
    let dir = tempfile::tempdir().unwrap();
    let frame = SampledFrame::from_artifact(dir.path().join("show.mp4_3.png")).unwrap();
    let recognizer = OllamaRecognizer::new(RecognizerOptions::new()).unwrap();

    assert!(matches!(
        recognizer.recognize(&frame),
        Err(EndscanError::RecognitionFailed(_))
    ));
}

#[test]
fn closures_are_recognizers() {
    let dir = tempfile::tempdir().unwrap();
    let frame = artifact(dir.path());
    let recognizer = |frame: &SampledFrame| -> Result<String, EndscanError> {
        Ok(format!("{}@{}", frame.video, frame.timestamp))
    };

    assert_eq!(recognizer.recognize(&frame).unwrap(), "show.mp4@12");
}
