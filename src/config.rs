//! Pipeline configuration.
//!
//! Option structs follow a builder style: start from `new()` (or
//! `Default`) and chain `with_*` setters.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use endscan::{PipelineOptions, RecognizerOptions, SamplingOptions};
//!
//! let sampling = SamplingOptions::new().with_radius(45);
//! let pipeline = PipelineOptions::new()
//!     .with_sampling(sampling)
//!     .with_results_file_name("season_2_results.txt");
//! let recognizer = RecognizerOptions::new()
//!     .with_model("llava:13b")
//!     .with_timeout(Duration::from_secs(120));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::preprocess::{FramePreprocessor, TextEnhancer};
use crate::progress::{ProgressCallback, no_progress};

/// Default number of seconds probed on each side of a checkpoint.
pub const DEFAULT_RADIUS_SECONDS: u32 = 30;

/// Default folder, next to the source video, that receives frame artifacts.
pub const DEFAULT_FRAMES_DIR: &str = "frames";

/// Default name of the per-batch diagnostic log.
pub const DEFAULT_RESULTS_FILE: &str = "text_results.txt";

/// Default Ollama-compatible generate endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "llava-llama3";

/// Instruction sent with every frame.
pub const DEFAULT_PROMPT: &str =
    "What text is in this picture? If there isn't any, reply with 'None'";

/// How frames are sampled around each checkpoint.
#[derive(Clone)]
pub struct SamplingOptions {
    /// Seconds probed before and after each checkpoint.
    pub(crate) radius_seconds: u32,
    /// Subfolder next to the video where frames are written.
    pub(crate) frames_dir: String,
    /// Transform applied to each frame before it is saved.
    pub(crate) preprocessor: Arc<dyn FramePreprocessor>,
}

impl Debug for SamplingOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SamplingOptions")
            .field("radius_seconds", &self.radius_seconds)
            .field("frames_dir", &self.frames_dir)
            .finish_non_exhaustive()
    }
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplingOptions {
    /// ±30 s window, `frames/` subfolder, [`TextEnhancer`] preprocessing.
    pub fn new() -> Self {
        Self {
            radius_seconds: DEFAULT_RADIUS_SECONDS,
            frames_dir: DEFAULT_FRAMES_DIR.to_string(),
            preprocessor: Arc::new(TextEnhancer::new()),
        }
    }

    /// Set the window radius in seconds.
    #[must_use]
    pub fn with_radius(mut self, radius_seconds: u32) -> Self {
        self.radius_seconds = radius_seconds;
        self
    }

    /// Set the artifact subfolder name.
    #[must_use]
    pub fn with_frames_dir(mut self, frames_dir: impl Into<String>) -> Self {
        self.frames_dir = frames_dir.into();
        self
    }

    /// Replace the preprocessing transform.
    #[must_use]
    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn FramePreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Window radius in seconds.
    pub fn radius_seconds(&self) -> u32 {
        self.radius_seconds
    }

    /// Number of probes per checkpoint (`2 * radius + 1`).
    pub fn samples_per_checkpoint(&self) -> u64 {
        2 * u64::from(self.radius_seconds) + 1
    }
}

/// Settings for [`OllamaRecognizer`](crate::OllamaRecognizer).
#[derive(Debug, Clone)]
#[must_use]
pub struct RecognizerOptions {
    /// URL of the generate endpoint.
    pub endpoint: String,
    /// Model name sent with each request.
    pub model: String,
    /// Instruction sent with each image.
    pub prompt: String,
    /// Request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for RecognizerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RecognizerOptions {
    /// Local Ollama endpoint, `llava-llama3`, the standard prompt, no timeout.
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            timeout: None,
        }
    }

    /// Set the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the instruction text.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Abort a request after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Settings for [`Pipeline`](crate::Pipeline).
#[derive(Clone)]
pub struct PipelineOptions {
    pub(crate) sampling: SamplingOptions,
    pub(crate) results_file_name: String,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for PipelineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineOptions")
            .field("sampling", &self.sampling)
            .field("results_file_name", &self.results_file_name)
            .finish_non_exhaustive()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineOptions {
    /// Default sampling, `text_results.txt`, no progress callback.
    pub fn new() -> Self {
        Self {
            sampling: SamplingOptions::new(),
            results_file_name: DEFAULT_RESULTS_FILE.to_string(),
            progress: no_progress(),
        }
    }

    /// Replace the sampling options.
    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingOptions) -> Self {
        self.sampling = sampling;
        self
    }

    /// Name of the diagnostic log written into the batch folder.
    #[must_use]
    pub fn with_results_file_name(mut self, name: impl Into<String>) -> Self {
        self.results_file_name = name.into();
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Sampling options in effect.
    pub fn sampling(&self) -> &SamplingOptions {
        &self.sampling
    }

    /// Results file name, relative to the batch folder.
    pub fn results_file_name(&self) -> &str {
        &self.results_file_name
    }
}
