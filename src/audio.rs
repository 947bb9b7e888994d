use crate::error::PipelineError;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Audio information reported after extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    pub path: PathBuf,
    pub duration: Duration,
    pub file_size: u64,
}

/// Extracts course soundtracks from lecture videos via ffmpeg
#[derive(Clone)]
pub struct AudioExtractor {
    /// Target audio format for extracted soundtracks
    pub target_format: String,
}

impl AudioExtractor {
    pub fn new(target_format: String) -> Self {
        Self { target_format }
    }

    /// Extract the soundtrack of one video into `output_dir`, keeping the
    /// video's base name so section identity survives the stage boundary.
    pub async fn extract_soundtrack(
        &self,
        video_path: &Path,
        output_dir: &Path,
    ) -> Result<AudioInfo> {
        let filename = video_path
            .file_stem()
            .ok_or_else(|| anyhow!("Invalid video filename: {}", video_path.display()))?
            .to_string_lossy();

        let audio_path = output_dir.join(format!("{}.{}", filename, self.target_format));

        info!("🎵 Extracting soundtrack: {}", video_path.display());

        tokio::fs::create_dir_all(output_dir).await?;

        let status = tokio::process::Command::new("ffmpeg")
            .args([
                "-i",
                video_path.to_str().unwrap_or_default(),
                "-vn", // No video stream
                "-acodec",
                "libmp3lame",
                "-q:a",
                "4", // VBR, plenty for speech
                "-ac",
                "1", // Mono
                "-y", // Overwrite existing
                audio_path.to_str().unwrap_or_default(),
            ])
            .status()
            .await
            .map_err(|e| PipelineError::external("ffmpeg", e))?;

        if !status.success() {
            return Err(PipelineError::external(
                "ffmpeg",
                format!("audio extraction failed for {}", video_path.display()),
            )
            .into());
        }

        let audio_info = self.get_audio_info(&audio_path).await?;

        info!(
            "✅ Soundtrack extracted: {} ({:.1}s, {:.1} MB)",
            audio_info.path.display(),
            audio_info.duration.as_secs_f64(),
            audio_info.file_size as f64 / 1_000_000.0
        );

        Ok(audio_info)
    }

    /// Probe duration and size of an audio file via ffprobe
    pub async fn get_audio_info(&self, audio_path: &Path) -> Result<AudioInfo> {
        let output = tokio::process::Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                audio_path.to_str().unwrap_or_default(),
            ])
            .output()
            .await
            .map_err(|e| PipelineError::external("ffprobe", e))?;

        if !output.status.success() {
            return Err(PipelineError::external(
                "ffprobe",
                format!("probe failed for {}", audio_path.display()),
            )
            .into());
        }

        let json_str = String::from_utf8(output.stdout)?;
        let ffprobe_data: serde_json::Value = serde_json::from_str(&json_str)?;

        let duration_seconds: f64 = ffprobe_data["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        let file_size = tokio::fs::metadata(audio_path).await?.len();

        Ok(AudioInfo {
            path: audio_path.to_path_buf(),
            duration: Duration::from_secs_f64(duration_seconds),
            file_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_creation() {
        let extractor = AudioExtractor::new("mp3".to_string());
        assert_eq!(extractor.target_format, "mp3");
    }
}
