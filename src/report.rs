//! Diagnostic results log.
//!
//! Every processed video appends one section to a plain-text file in the
//! batch folder:
//!
//! ```text
//! Text results for show.mp4:
//! Frame: /videos/frames/show.mp4_1290.png
//! THE END
//! --------------------------------------------------------------------------------
//!
//! ```
//!
//! The file is opened in append mode for each section and never truncated, so
//! repeated runs accumulate.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::detector::{RecognitionOutcome, RecognitionResult};
use crate::error::EndscanError;

/// Line written after each frame entry.
pub const SEPARATOR: &str =
    "--------------------------------------------------------------------------------";

/// Append-only results file.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: PathBuf,
}

impl DiagnosticLog {
    /// A log that writes to `path`. Nothing is created until the first
    /// section is appended.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render one video's section.
    ///
    /// Failed recognitions are written as `[recognition failed: <reason>]`
    /// so they stay distinguishable from frames with no text.
    pub fn render_section(video: &str, results: &[RecognitionResult]) -> String {
        let mut section = format!("Text results for {video}:\n");
        for result in results {
            section.push_str(&format!("Frame: {}\n", result.frame.path.display()));
            match &result.outcome {
                RecognitionOutcome::Text(text) => section.push_str(text),
                RecognitionOutcome::Failed(reason) => {
                    section.push_str(&format!("[recognition failed: {reason}]"));
                }
            }
            section.push('\n');
            section.push_str(SEPARATOR);
            section.push('\n');
        }
        section.push('\n');
        section
    }

    /// Append one video's section.
    ///
    /// # Errors
    ///
    /// [`EndscanError::IoError`] if the file cannot be opened or written.
    pub fn append_video(
        &self,
        video: &str,
        results: &[RecognitionResult],
    ) -> Result<(), EndscanError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(Self::render_section(video, results).as_bytes())?;
        file.flush()?;

        log::debug!(
            "Appended {} result(s) for {video} to {}",
            results.len(),
            self.path.display()
        );
        Ok(())
    }
}
