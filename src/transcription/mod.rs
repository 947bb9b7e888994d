pub mod xunfei;

pub use xunfei::XunfeiTranscriber;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Speech-recognition collaborator: best-effort text for one audio file,
/// no formatting guarantees.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}
