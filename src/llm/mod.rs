pub mod openai;

pub use openai::OpenAIChatClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// LLM configuration for note generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// API endpoint; `None` uses the public OpenAI endpoint
    pub endpoint: Option<String>,
    /// API key
    pub api_key: Option<String>,
    /// Model to use
    pub model: String,
    /// Maximum tokens to generate per chunk
    pub max_tokens: u32,
    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.1, // low temperature for faithful note cleanup
            timeout_seconds: 120,
        }
    }
}

/// Chat message for LLM communication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub tokens_used: Option<u32>,
}

/// Trait for chat-completion backends; note generation only ever sends one
/// system message and one user message per call.
#[async_trait]
pub trait LLM: Send + Sync {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse>;
}

/// Create an LLM client based on configuration
pub fn create_llm(config: &LLMConfig) -> Result<Box<dyn LLM>> {
    Ok(Box::new(OpenAIChatClient::new(config.clone())?))
}
