//! Google Gemini provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use site_core::AssistantConfig;

use crate::protocol::gemini::GeminiRequest;
use crate::protocol::{ParsedReply, ToProvider};
use crate::provider::{LLMError, LLMProvider, Prompt, Result};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Google Gemini API provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Build from the `[assistant]` config section. Fails without an API key.
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                LLMError::Auth("Gemini API key is not configured (set GEMINI_API_KEY)".to_string())
            })?;

        let mut provider = Self::new(api_key);
        if let Some(base) = &config.api_base {
            provider = provider.with_base_url(base.clone());
        }
        if let Some(model) = &config.model {
            provider = provider.with_model(model.clone());
        }
        Ok(provider)
    }

    /// Set a custom base URL (e.g., for proxies or alternative endpoints).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, prompt: &Prompt) -> Result<ParsedReply> {
        let request: GeminiRequest = prompt.to_provider()?;

        log::debug!(
            "Gemini request to model '{}' ({} prompt chars)",
            self.model,
            prompt.text.len()
        );

        let response = self
            .client
            .post(self.endpoint_url())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(LLMError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.map_err(LLMError::Http)?;

            if status == 401 || status == 403 {
                return Err(LLMError::Auth(format!(
                    "Gemini authentication failed: {}. Please check your API key.",
                    text
                )));
            }

            return Err(LLMError::Api(format!(
                "Gemini API error: HTTP {}: {}",
                status, text
            )));
        }

        let body = response.bytes().await.map_err(LLMError::Http)?;
        let value: Value = serde_json::from_slice(&body)?;

        Ok(ParsedReply::from_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_provider() {
        let provider = GeminiProvider::new("test_key");
        assert_eq!(provider.api_key, "test_key");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(provider.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_chained_builders() {
        let provider = GeminiProvider::new("test_key")
            .with_base_url("https://custom.api.com/")
            .with_model("gemini-ultra");

        assert_eq!(provider.base_url, "https://custom.api.com");
        assert_eq!(provider.model(), "gemini-ultra");
    }

    #[test]
    fn test_url_construction() {
        let provider = GeminiProvider::new("my_api_key_123")
            .with_base_url("https://test.api.com/v1beta")
            .with_model("gemini-custom");

        assert_eq!(
            provider.endpoint_url(),
            "https://test.api.com/v1beta/models/gemini-custom:generateContent?key=my_api_key_123"
        );
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = AssistantConfig::default();
        assert!(matches!(
            GeminiProvider::from_config(&config),
            Err(LLMError::Auth(_))
        ));

        let config = AssistantConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(GeminiProvider::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_applies_overrides() {
        let config = AssistantConfig {
            api_key: Some("k".to_string()),
            api_base: Some("http://localhost:9999".to_string()),
            model: Some("gemini-test".to_string()),
            ..Default::default()
        };
        let provider = GeminiProvider::from_config(&config).unwrap();
        assert_eq!(
            provider.endpoint_url(),
            "http://localhost:9999/models/gemini-test:generateContent?key=k"
        );
    }
}
