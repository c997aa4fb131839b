//! Google Gemini `generateContent` wire format.
//!
//! # Example request
//! ```json
//! {
//!   "contents": [
//!     { "parts": [{ "text": "You are helpful...\n\nUser: Hi\n\nAssistant:" }] }
//!   ],
//!   "generationConfig": { "temperature": 0.7, "maxOutputTokens": 200 }
//! }
//! ```
//!
//! The reply text lives at `candidates[0].content.parts[0].text`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::{ProtocolError, ProtocolResult, ToProvider};
use crate::provider::{GenerationSettings, Prompt};

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

// ============================================================================
// Reply parsing
// ============================================================================

/// JSON pointer to the reply text in a `generateContent` response.
const REPLY_TEXT_POINTER: &str = "/candidates/0/content/parts/0/text";

/// Outcome of reading a successful response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedReply {
    Text(String),
    /// The body was JSON but had no usable reply text.
    Malformed,
}

impl ParsedReply {
    /// Only the path to the first candidate's first part is read; the rest of
    /// the body may have any shape.
    pub fn from_value(value: &Value) -> Self {
        match value.pointer(REPLY_TEXT_POINTER).and_then(Value::as_str) {
            Some(text) if !text.is_empty() => ParsedReply::Text(text.to_string()),
            Some(_) => ParsedReply::Malformed,
            None => {
                log::debug!("Gemini response has no text at {}", REPLY_TEXT_POINTER);
                ParsedReply::Malformed
            }
        }
    }
}

// ============================================================================
// Internal → Gemini (ToProvider)
// ============================================================================

impl ToProvider<GeminiGenerationConfig> for GenerationSettings {
    fn to_provider(&self) -> ProtocolResult<GeminiGenerationConfig> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ProtocolError::InvalidSetting {
                name: "temperature".to_string(),
                reason: format!("{} is not a non-negative number", self.temperature),
            });
        }
        if self.max_output_tokens == 0 {
            return Err(ProtocolError::InvalidSetting {
                name: "maxOutputTokens".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(GeminiGenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        })
    }
}

impl ToProvider<GeminiRequest> for Prompt {
    fn to_provider(&self) -> ProtocolResult<GeminiRequest> {
        if self.text.trim().is_empty() {
            return Err(ProtocolError::InvalidContent("prompt text is empty".to_string()));
        }

        Ok(GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(self.text.clone()),
                }],
            }],
            generation_config: Some(self.settings.to_provider()?),
        })
    }
}
