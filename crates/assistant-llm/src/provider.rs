use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::ParsedReply;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Protocol conversion error: {0}")]
    Protocol(#[from] crate::protocol::ProtocolError),
}

pub type Result<T> = std::result::Result<T, LLMError>;

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 200,
        }
    }
}

/// A single-turn prompt. The provider sends `text` as the only content part.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
    pub settings: GenerationSettings,
}

impl Prompt {
    pub fn new(text: impl Into<String>, settings: GenerationSettings) -> Self {
        Self {
            text: text.into(),
            settings,
        }
    }
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate one completion.
    ///
    /// Transport failures, non-2xx statuses and undecodable bodies are
    /// errors. A decodable body without reply text is
    /// `Ok(ParsedReply::Malformed)`.
    async fn generate(&self, prompt: &Prompt) -> Result<ParsedReply>;
}
