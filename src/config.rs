use crate::error::PipelineError;
use crate::llm::LLMConfig;
use crate::notes::NoteStyle;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the course notes pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Course identity and directory layout
    pub course: CourseConfig,

    /// Video/audio handling settings
    pub audio: AudioConfig,

    /// Speech recognition service settings
    pub speech: SpeechConfig,

    /// Note generation (LLM) settings
    pub llm: LLMConfig,

    /// Note style and chunking settings
    pub notes: NotesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfig {
    /// Course name, used for the directory layout and the aggregate title
    pub name: String,

    /// Root directory holding all course directories
    pub root_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Supported video file extensions in the Playback directory
    pub supported_extensions: Vec<String>,

    /// Target audio format for extracted soundtracks
    pub target_format: String,

    /// Skip files whose stage output already exists
    pub skip_existing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Xunfei application id
    pub app_id: String,

    /// Xunfei secret key used for request checksums
    pub secret_key: String,

    /// Speech API endpoint
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    /// Generation style: "note" or "cleaner"
    pub style: String,

    /// Token budget per transcript chunk, kept conservatively below the
    /// model context window to leave room for prompts and the response
    pub chunk_token_budget: usize,

    /// Number of sections generated concurrently
    pub workers: usize,
}

impl Config {
    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_paths = [
            "course-notes.toml",
            "config.toml",
            "config_private.toml",
            "~/.config/course-notes/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config.apply_env();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        // No file found: environment variables alone may be enough
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config file {}: {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Cannot parse config file {}: {}", path.display(), e))?;
        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides using the original key names
    pub fn apply_env(&mut self) {
        if let Ok(name) = std::env::var("COURSE_NAME") {
            self.course.name = name;
        }
        if let Ok(app_id) = std::env::var("XUNFEI_APP_ID") {
            self.speech.app_id = app_id;
        }
        if let Ok(secret) = std::env::var("XUNFEI_SECRET_KEY") {
            self.speech.secret_key = secret;
        }
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = Some(api_key);
        }
        if let Ok(endpoint) = std::env::var("OPENAI_ENDPOINT") {
            self.llm.endpoint = Some(endpoint);
        }
        if let Ok(model) = std::env::var("MODEL") {
            self.llm.model = model;
        }
        if let Ok(style) = std::env::var("STYLE") {
            self.notes.style = style;
        }
    }

    /// Save configuration to file (useful for bootstrapping a config.toml)
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration; required keys and the note style are checked
    /// once at startup so mistakes never surface mid-generation.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.course.name.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "COURSE_NAME is required".to_string(),
            ));
        }
        if self.speech.app_id.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "XUNFEI_APP_ID is required".to_string(),
            ));
        }
        if self.speech.secret_key.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "XUNFEI_SECRET_KEY is required".to_string(),
            ));
        }
        match &self.llm.api_key {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(PipelineError::Configuration(
                    "OPENAI_API_KEY is required".to_string(),
                ));
            }
        }
        if self.notes.chunk_token_budget == 0 {
            return Err(PipelineError::Configuration(
                "chunk_token_budget must be greater than 0".to_string(),
            ));
        }
        if self.notes.workers == 0 {
            return Err(PipelineError::Configuration(
                "workers must be greater than 0".to_string(),
            ));
        }

        // Fail fast on a bad style rather than per chunk
        self.note_style()?;

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Parse the configured note style
    pub fn note_style(&self) -> Result<NoteStyle, PipelineError> {
        self.notes.style.parse()
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Course Notes Configuration:\n\
            - Course: {}\n\
            - Course Root: {}\n\
            - Audio Format: {}\n\
            - Speech Endpoint: {}\n\
            - Model: {}\n\
            - Style: {}\n\
            - Chunk Token Budget: {}\n\
            - Workers: {}",
            self.course.name,
            self.course.root_dir.display(),
            self.audio.target_format,
            self.speech.endpoint,
            self.llm.model,
            self.notes.style,
            self.notes.chunk_token_budget,
            self.notes.workers
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            course: CourseConfig {
                name: String::new(),
                root_dir: PathBuf::from("Course"),
            },
            audio: AudioConfig {
                supported_extensions: vec![
                    "mp4".to_string(),
                    "avi".to_string(),
                    "mkv".to_string(),
                    "mov".to_string(),
                    "webm".to_string(),
                ],
                target_format: "mp3".to_string(),
                skip_existing: true,
            },
            speech: SpeechConfig {
                app_id: String::new(),
                secret_key: String::new(),
                endpoint: "https://api.xfyun.cn/v1/service/v1/iat".to_string(),
                timeout_seconds: 600, // lecture audio files are large
            },
            llm: LLMConfig::default(),
            notes: NotesConfig {
                style: "cleaner".to_string(),
                chunk_token_budget: 3000,
                workers: num_cpus::get().min(4),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.course.name = "Linear Algebra".to_string();
        config.speech.app_id = "app".to_string();
        config.speech.secret_key = "secret".to_string();
        config.llm.api_key = Some("sk-test".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.audio.target_format, "mp3");
        assert_eq!(config.notes.style, "cleaner");
        assert!(config.audio.skip_existing);
    }

    #[test]
    fn test_validation_requires_credentials() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Configuration(_))
        ));

        let config = configured();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_unknown_style() {
        let mut config = configured();
        config.notes.style = "poetic".to_string();
        assert!(matches!(
            config.validate(),
            Err(PipelineError::UnknownStyle(_))
        ));
    }

    #[test]
    fn test_missing_api_key_reported() {
        let mut config = configured();
        config.llm.api_key = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = configured();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.course.name, "Linear Algebra");
        assert_eq!(parsed.notes.chunk_token_budget, 3000);
    }
}
