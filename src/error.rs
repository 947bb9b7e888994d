use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the course processing pipeline.
///
/// Failures are caught at the smallest unit boundary (chunk, file, or stage)
/// and converted into logged, degraded results; only configuration problems
/// abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required configuration key is missing or empty.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The upstream stage produced no input for this stage.
    #[error("no input for {stage} stage in {dir}")]
    StageInputMissing { stage: String, dir: PathBuf },

    /// An external collaborator (ffmpeg, speech API, LLM) failed.
    #[error("{service} failure: {message}")]
    ExternalService { service: String, message: String },

    /// The configured note style is not one of the recognized values.
    #[error("unknown note style: {0:?} (expected \"note\" or \"cleaner\")")]
    UnknownStyle(String),
}

impl PipelineError {
    pub fn external(service: impl Into<String>, message: impl ToString) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.to_string(),
        }
    }
}
