//! Diagnostic log tests.

use std::fs;
use std::path::PathBuf;

use endscan::{DiagnosticLog, RecognitionOutcome, RecognitionResult, SEPARATOR, SampledFrame};

fn result(timestamp: i64, outcome: RecognitionOutcome) -> RecognitionResult {
    RecognitionResult {
        frame: SampledFrame {
            video: "show.mp4".to_string(),
            timestamp,
            path: PathBuf::from(format!("/videos/frames/show.mp4_{timestamp}.png")),
        },
        outcome,
    }
}

#[test]
fn separator_is_eighty_dashes() {
    assert_eq!(SEPARATOR.len(), 80);
    assert!(SEPARATOR.chars().all(|c| c == '-'));
}

#[test]
fn section_layout() {
    let results = vec![
        result(1290, RecognitionOutcome::Text("THE END".to_string())),
        result(1291, RecognitionOutcome::Failed("timed out".to_string())),
    ];

    let section = DiagnosticLog::render_section("show.mp4", &results);

    let expected = format!(
        "Text results for show.mp4:\n\
         Frame: /videos/frames/show.mp4_1290.png\nTHE END\n{SEPARATOR}\n\
         Frame: /videos/frames/show.mp4_1291.png\n[recognition failed: timed out]\n{SEPARATOR}\n\
         \n"
    );
    assert_eq!(section, expected);
}

#[test]
fn empty_section_is_header_and_blank_line() {
    assert_eq!(
        DiagnosticLog::render_section("pilot.mkv", &[]),
        "Text results for pilot.mkv:\n\n"
    );
}

#[test]
fn sections_accumulate_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("text_results.txt");
    fs::write(&path, "previous run\n").unwrap();

    let log = DiagnosticLog::new(&path);
    log.append_video("a.mp4", &[result(1, RecognitionOutcome::Text("None".to_string()))])
        .unwrap();
    log.append_video("b.mp4", &[]).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("previous run\n"));

    let first = contents.find("Text results for a.mp4:").unwrap();
    let second = contents.find("Text results for b.mp4:").unwrap();
    assert!(first < second);
    assert!(contents.ends_with("Text results for b.mp4:\n\n"));
}

#[test]
fn log_file_is_created_on_first_append() {
    let dir = tempfile::tempdir().unwrap();
    let log = DiagnosticLog::new(dir.path().join("results.txt"));
    assert!(!log.path().exists());

    log.append_video("a.mp4", &[]).unwrap();
    assert!(log.path().exists());
}

#[test]
fn unwritable_location_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let log = DiagnosticLog::new(dir.path().join("missing/results.txt"));
    assert!(matches!(
        log.append_video("a.mp4", &[]),
        Err(endscan::EndscanError::IoError(_))
    ));
}
