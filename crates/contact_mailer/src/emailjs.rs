//! EmailJS REST client.
//!
//! `POST {api_base}/api/v1.0/email/send` with
//! `{ service_id, template_id, user_id, accessToken?, template_params }`.
//! EmailJS answers `200 OK` with a plain text body.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use site_core::MailConfig;
use tracing::debug;

use crate::error::{MailError, Result};
use crate::form::ContactFormState;

pub const DEFAULT_API_BASE: &str = "https://api.emailjs.com";

/// Variables handed to the email template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateParams {
    pub from_name: String,
    pub reply_to: String,
    pub subject: String,
    pub phone: String,
    pub message: String,
    pub to_email: String,
    pub time: String,
}

impl TemplateParams {
    pub fn from_form(form: &ContactFormState, to_email: &str, time: impl Into<String>) -> Self {
        Self {
            from_name: form.name.clone(),
            reply_to: form.email.clone(),
            subject: non_empty_or(&form.subject, "No subject"),
            phone: non_empty_or(&form.phone, "Not provided"),
            message: form.message.clone(),
            to_email: to_email.to_string(),
            time: time.into(),
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, params: &TemplateParams) -> Result<()>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a TemplateParams,
}

pub struct EmailJsClient {
    client: Client,
    api_base: String,
    service_id: String,
    template_id: String,
    public_key: String,
    access_token: Option<String>,
}

impl EmailJsClient {
    pub fn new(
        service_id: impl Into<String>,
        template_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            service_id: service_id.into(),
            template_id: template_id.into(),
            public_key: public_key.into(),
            access_token: None,
        }
    }

    /// Build from the `[mail]` config section. Service id, template id and
    /// public key are all required.
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let missing: Vec<&str> = [
            ("service_id", &config.service_id),
            ("template_id", &config.template_id),
            ("public_key", &config.public_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(MailError::Config(format!(
                "missing EmailJS settings: {}",
                missing.join(", ")
            )));
        }

        let mut client = Self::new(&config.service_id, &config.template_id, &config.public_key);
        if let Some(base) = &config.api_base {
            client = client.with_api_base(base.clone());
        }
        if let Some(token) = &config.access_token {
            client = client.with_access_token(token.clone());
        }
        Ok(client)
    }

    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn endpoint_url(&self) -> String {
        format!("{}/api/v1.0/email/send", self.api_base)
    }
}

#[async_trait]
impl EmailSender for EmailJsClient {
    async fn send(&self, params: &TemplateParams) -> Result<()> {
        let request = SendRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: &self.public_key,
            access_token: self.access_token.as_deref(),
            template_params: params,
        };

        debug!(
            service_id = %self.service_id,
            template_id = %self.template_id,
            "Sending contact email"
        );

        let response = self
            .client
            .post(self.endpoint_url())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> ContactFormState {
        ContactFormState {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: String::new(),
            phone: String::new(),
            message: "Need a trailer cut".to_string(),
        }
    }

    #[test]
    fn template_params_fill_optional_defaults() {
        let params =
            TemplateParams::from_form(&filled_form(), "owner@studio.tv", "1/2/2026, 3:04:05 PM");
        assert_eq!(params.from_name, "Ada");
        assert_eq!(params.reply_to, "ada@example.com");
        assert_eq!(params.subject, "No subject");
        assert_eq!(params.phone, "Not provided");
        assert_eq!(params.to_email, "owner@studio.tv");
        assert_eq!(params.time, "1/2/2026, 3:04:05 PM");
    }

    #[test]
    fn template_params_keep_provided_optionals() {
        let mut form = filled_form();
        form.subject = "Trailer".to_string();
        form.phone = "+44 20 7946 0000".to_string();

        let params = TemplateParams::from_form(&form, "owner@studio.tv", "now");
        assert_eq!(params.subject, "Trailer");
        assert_eq!(params.phone, "+44 20 7946 0000");
    }

    #[test]
    fn from_config_lists_missing_settings() {
        let config = MailConfig {
            service_id: "service_x".to_string(),
            ..Default::default()
        };
        match EmailJsClient::from_config(&config) {
            Err(MailError::Config(msg)) => {
                assert!(msg.contains("template_id"));
                assert!(msg.contains("public_key"));
                assert!(!msg.contains("service_id"));
            }
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn from_config_applies_base_and_token() {
        let config = MailConfig {
            api_base: Some("http://localhost:8025/".to_string()),
            service_id: "s".to_string(),
            template_id: "t".to_string(),
            public_key: "p".to_string(),
            access_token: Some("secret".to_string()),
        };
        let client = EmailJsClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint_url(), "http://localhost:8025/api/v1.0/email/send");
        assert_eq!(client.access_token.as_deref(), Some("secret"));
    }
}
