//! Text recognition.
//!
//! The detector only needs "what text is in this frame?". [`TextRecognizer`]
//! is that seam; [`OllamaRecognizer`] answers it by posting the frame to a
//! vision model behind an Ollama-style `/api/generate` endpoint.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::RecognizerOptions;
use crate::error::EndscanError;
use crate::sampler::SampledFrame;

/// Reads the text shown in a sampled frame.
///
/// Closures of the right shape implement this trait, which keeps tests and
/// ad-hoc recognizers short.
pub trait TextRecognizer {
    /// Return the text in `frame`, or an empty string if there is none.
    ///
    /// # Errors
    ///
    /// [`EndscanError::RecognitionFailed`] when no answer could be obtained.
    fn recognize(&self, frame: &SampledFrame) -> Result<String, EndscanError>;
}

impl<F> TextRecognizer for F
where
    F: Fn(&SampledFrame) -> Result<String, EndscanError>,
{
    fn recognize(&self, frame: &SampledFrame) -> Result<String, EndscanError> {
        self(frame)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Recognizer backed by an Ollama-compatible vision model.
///
/// # Example
///
/// ```no_run
/// use endscan::{OllamaRecognizer, RecognizerOptions, SampledFrame, TextRecognizer};
///
/// let recognizer = OllamaRecognizer::new(RecognizerOptions::new())?;
/// let frame = SampledFrame::from_artifact("frames/show.mkv_1260.png")?;
/// println!("{}", recognizer.recognize(&frame)?);
/// # Ok::<(), endscan::EndscanError>(())
/// ```
pub struct OllamaRecognizer {
    client: Client,
    options: RecognizerOptions,
}

impl Debug for OllamaRecognizer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OllamaRecognizer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl OllamaRecognizer {
    /// Build the HTTP client.
    ///
    /// # Errors
    ///
    /// [`EndscanError::RecognitionFailed`] if the client cannot be built.
    pub fn new(options: RecognizerOptions) -> Result<Self, EndscanError> {
        let client = Client::builder().timeout(options.timeout).build()?;
        Ok(Self { client, options })
    }

    /// Options in effect.
    pub fn options(&self) -> &RecognizerOptions {
        &self.options
    }

    fn request_body<'a>(&'a self, image: String) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.options.model,
            prompt: &self.options.prompt,
            stream: false,
            images: vec![image],
        }
    }
}

impl TextRecognizer for OllamaRecognizer {
    fn recognize(&self, frame: &SampledFrame) -> Result<String, EndscanError> {
        let image = encode_image(&frame.path)?;
        log::debug!(
            "Requesting text for {} from {} ({})",
            frame.path.display(),
            self.options.endpoint,
            self.options.model,
        );

        let response = self
            .client
            .post(&self.options.endpoint)
            .json(&self.request_body(image))
            .send()?
            .error_for_status()?;
        let body: GenerateResponse = response.json()?;

        log::trace!("{}: {:?}", frame.path.display(), body.response);
        Ok(body.response)
    }
}

/// Read a file and return its contents as standard base64.
///
/// # Errors
///
/// [`EndscanError::RecognitionFailed`] if the file cannot be read.
pub fn encode_image<P: AsRef<Path>>(path: P) -> Result<String, EndscanError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|error| {
        EndscanError::RecognitionFailed(format!("cannot read {}: {error}", path.display()))
    })?;
    Ok(STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_stream_disabled() {
        let recognizer = OllamaRecognizer::new(RecognizerOptions::new()).unwrap();
        let body = serde_json::to_value(recognizer.request_body("aGk=".to_string())).unwrap();

        assert_eq!(body["model"], "llava-llama3");
        assert_eq!(body["stream"], false);
        assert_eq!(body["images"][0], "aGk=");
        assert_eq!(
            body["prompt"],
            "What text is in this picture? If there isn't any, reply with 'None'"
        );
    }

    #[test]
    fn missing_response_field_reads_as_empty() {
        let body: GenerateResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert_eq!(body.response, "");

        let body: GenerateResponse =
            serde_json::from_str(r#"{"response": "THE END", "done": true}"#).unwrap();
        assert_eq!(body.response, "THE END");
    }

    #[test]
    fn encode_image_fails_for_missing_file() {
        let error = encode_image("/nonexistent/frame_1.png").unwrap_err();
        assert!(matches!(error, EndscanError::RecognitionFailed(_)));
    }
}
