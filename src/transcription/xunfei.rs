use super::Transcriber;
use crate::config::SpeechConfig;
use crate::error::PipelineError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Xunfei speech recognition client. One multipart upload per audio file;
/// requests are authenticated with an app id, a timestamp, and an md5
/// checksum over the secret key, timestamp, and engine parameters.
pub struct XunfeiTranscriber {
    config: SpeechConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct XunfeiResponse {
    code: String,
    desc: Option<String>,
    data: Option<String>,
}

impl XunfeiTranscriber {
    pub fn new(config: SpeechConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    /// Engine parameters for one upload. The declared audio encoding
    /// follows the file's actual extension, so a non-mp3 target format is
    /// never uploaded with a mismatched `aue`.
    fn engine_params(&self, audio_path: &Path) -> String {
        let aue = audio_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_else(|| "mp3".to_string());
        format!(r#"{{"engine_type":"lfasr","aue":"{}"}}"#, aue)
    }

    fn checksum(&self, cur_time: &str, param: &str) -> String {
        let digest = md5::compute(format!("{}{}{}", self.config.secret_key, cur_time, param));
        format!("{:x}", digest)
    }
}

#[async_trait]
impl Transcriber for XunfeiTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        info!("🎤 Transcribing: {}", audio_path.display());

        let audio_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.mp3".to_string());

        let cur_time = chrono::Utc::now().timestamp().to_string();
        let param = self.engine_params(audio_path);
        let checksum = self.checksum(&cur_time, &param);

        let form = reqwest::multipart::Form::new().part(
            "audio",
            reqwest::multipart::Part::bytes(audio_bytes).file_name(file_name),
        );

        debug!("Uploading audio to {}", self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("X-Appid", &self.config.app_id)
            .header("X-CurTime", &cur_time)
            .header("X-Param", &param)
            .header("X-CheckSum", &checksum)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::external("xunfei", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::external(
                "xunfei",
                format!("HTTP {}: {}", status, text),
            )
            .into());
        }

        let body: XunfeiResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::external("xunfei", e))?;

        if body.code != "0" {
            return Err(PipelineError::external(
                "xunfei",
                format!(
                    "API error {}: {}",
                    body.code,
                    body.desc.unwrap_or_default()
                ),
            )
            .into());
        }

        let text = body
            .data
            .ok_or_else(|| anyhow!("Xunfei response missing transcript data"))?;

        info!("✅ Transcribed {} characters", text.chars().count());
        Ok(text)
    }
}
