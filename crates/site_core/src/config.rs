use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Display name used in the greeting, prompt and fallback messages
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Destination for contact form mail, also quoted in chat fallbacks
    #[serde(default = "default_contact_email")]
    pub contact_email: String,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub greeting: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailConfig {
    pub api_base: Option<String>,
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub public_key: String,
    /// Private key, required when the account enforces it for non-browser calls
    pub access_token: Option<String>,
}

const CONFIG_FILE_PATH: &str = "config.toml";

fn default_owner() -> String {
    "the studio".to_string()
}

fn default_contact_email() -> String {
    "hello@example.com".to_string()
}

fn portfolio_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".portfolio")
}

fn portfolio_config_json_path() -> PathBuf {
    portfolio_dir().join("config.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            contact_email: default_contact_email(),
            assistant: AssistantConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

impl Config {
    /// Load from `~/.portfolio/config.json`, falling back to `./config.toml`,
    /// then apply environment overrides. Unreadable files are skipped.
    pub fn new() -> Self {
        let mut config = Config::default();

        let mut loaded = false;
        let json_path = portfolio_config_json_path();
        if json_path.exists() {
            match Self::load_json(&json_path) {
                Ok(file_config) => {
                    config = file_config;
                    loaded = true;
                }
                Err(e) => log::warn!("Ignoring {}: {}", json_path.display(), e),
            }
        }

        if !loaded && Path::new(CONFIG_FILE_PATH).exists() {
            match Self::load_toml(CONFIG_FILE_PATH) {
                Ok(file_config) => config = file_config,
                Err(e) => log::warn!("Ignoring {}: {}", CONFIG_FILE_PATH, e),
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load a TOML file and apply environment overrides on top of it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load_toml(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(owner) = lookup("SITE_OWNER") {
            self.owner = owner;
        }
        if let Some(email) = lookup("CONTACT_EMAIL") {
            self.contact_email = email;
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.assistant.api_key = Some(key);
        }
        if let Some(base) = lookup("GEMINI_API_BASE") {
            self.assistant.api_base = Some(base);
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.assistant.model = Some(model);
        }
        if let Some(base) = lookup("EMAILJS_API_BASE") {
            self.mail.api_base = Some(base);
        }
        if let Some(id) = lookup("EMAILJS_SERVICE_ID") {
            self.mail.service_id = id;
        }
        if let Some(id) = lookup("EMAILJS_TEMPLATE_ID") {
            self.mail.template_id = id;
        }
        if let Some(key) = lookup("EMAILJS_PUBLIC_KEY") {
            self.mail.public_key = key;
        }
        if let Some(token) = lookup("EMAILJS_ACCESS_TOKEN") {
            self.mail.access_token = Some(token);
        }
    }

    pub fn greeting(&self) -> String {
        self.assistant.greeting.clone().unwrap_or_else(|| {
            format!(
                "Hi! I'm {}'s AI assistant. Ask me anything about video editing services, pricing, or availability!",
                self.owner
            )
        })
    }

    pub fn system_prompt(&self) -> String {
        if let Some(prompt) = &self.assistant.system_prompt {
            return prompt.clone();
        }

        format!(
            "You are a helpful AI assistant for {owner}, a professional video editor.\n\n\
             Services:\n\
             - YouTube video editing (long-form and shorts)\n\
             - Motion graphics and animations\n\
             - Color grading and correction\n\
             - Thumbnail design\n\
             - Social media content\n\n\
             Contact: {email}\n\n\
             Keep responses concise, friendly, and helpful. If asked about pricing, suggest contacting directly for a custom quote.",
            owner = self.owner,
            email = self.contact_email,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            owner = "Jo"

            [mail]
            service_id = "service_1"
            "#,
        )
        .unwrap();

        assert_eq!(config.owner, "Jo");
        assert_eq!(config.contact_email, "hello@example.com");
        assert_eq!(config.mail.service_id, "service_1");
        assert!(config.mail.template_id.is_empty());
        assert!(config.assistant.api_key.is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config.assistant.model = Some("from-file".to_string());

        let env: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-test"),
            ("EMAILJS_PUBLIC_KEY", "pub"),
            ("CONTACT_EMAIL", "me@site.dev"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.assistant.api_key.as_deref(), Some("k"));
        assert_eq!(config.assistant.model.as_deref(), Some("gemini-test"));
        assert_eq!(config.mail.public_key, "pub");
        assert_eq!(config.contact_email, "me@site.dev");
        assert_eq!(config.owner, "the studio");
    }

    #[test]
    fn load_toml_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "contact_email = \"x@y.io\"\n[assistant]\ngreeting = \"Hello there\"\n",
        )
        .unwrap();

        let config = Config::load_toml(&path).unwrap();
        assert_eq!(config.contact_email, "x@y.io");
        assert_eq!(config.greeting(), "Hello there");
    }

    #[test]
    fn load_toml_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "owner = ").unwrap();

        assert!(matches!(Config::load_toml(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn default_prompt_mentions_owner_and_email() {
        let mut config = Config::default();
        config.owner = "Sam".to_string();
        config.contact_email = "sam@cuts.tv".to_string();

        let prompt = config.system_prompt();
        assert!(prompt.starts_with("You are a helpful AI assistant for Sam"));
        assert!(prompt.contains("Contact: sam@cuts.tv"));
        assert!(config.greeting().contains("Sam's AI assistant"));
    }
}
