//! Email delivery for reminder emails.
//!
//! Providers:
//! - `console`: logs emails (development)
//! - `sendgrid`: SendGrid v3 API

use async_trait::async_trait;
use domain::services::reminder::REMINDER_TEMPLATE;
use domain::services::{EmailGateway, EmailTemplate, NotificationResult};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::EmailConfig;

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Unknown email template: {0}")]
    UnknownTemplate(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
}

/// Email service for transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Turns a named template into a message for `to`.
    pub fn render(&self, to: &str, template: &EmailTemplate) -> Result<EmailMessage, EmailError> {
        if template.name != REMINDER_TEMPLATE {
            return Err(EmailError::UnknownTemplate(template.name.to_string()));
        }
        let var = |key: &str| template.vars.get(key).map(String::as_str).unwrap_or_default();

        let title = var("event_title");
        let link = format!("{}{}", self.config.base_url, var("link"));
        let name = var("name");

        let body_text = format!(
            r#"Hi{name},

This is your reminder: {title} starts at {start}.

Event details: {link}

See you there,
The {sender} Team"#,
            name = if name.is_empty() {
                String::new()
            } else {
                format!(" {}", name)
            },
            title = title,
            start = var("start_datetime"),
            link = link,
            sender = self.config.sender_name,
        );

        Ok(EmailMessage {
            to: to.to_string(),
            to_name: (!name.is_empty()).then(|| name.to_string()),
            subject: format!("Reminder: {}", title),
            body_text,
        })
    }

    /// Send an email message through the configured provider.
    pub async fn send_message(&self, message: EmailMessage) -> Result<(), EmailError> {
        match self.config.provider.as_str() {
            "console" => {
                self.send_console(&message);
                Ok(())
            }
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    fn send_console(&self, message: &EmailMessage) {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        debug!(body_text = %message.body_text, "Email body");
    }

    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let mut recipient = serde_json::json!({ "email": message.to });
        if let Some(name) = &message.to_name {
            recipient["name"] = serde_json::json!(name);
        }

        let body = serde_json::json!({
            "personalizations": [{ "to": [recipient] }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [{
                "type": "text/plain",
                "value": message.body_text
            }]
        });

        let response = self
            .client
            .post(SENDGRID_ENDPOINT)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[async_trait]
impl EmailGateway for EmailService {
    async fn send(&self, to: &str, template: EmailTemplate) -> NotificationResult {
        if !self.config.enabled {
            debug!(template = template.name, "Email service disabled, skipping send");
            return NotificationResult::Skipped;
        }

        let result = match self.render(to, &template) {
            Ok(message) => self.send_message(message).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => NotificationResult::Sent,
            Err(e) => NotificationResult::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            sendgrid_api_key: String::new(),
            sender_email: "test@example.com".to_string(),
            sender_name: "Turnout".to_string(),
            base_url: "https://app.example.com".to_string(),
        }
    }

    fn reminder() -> EmailTemplate {
        let mut vars = BTreeMap::new();
        vars.insert("name", "Fox".to_string());
        vars.insert("event_title", "Board game night".to_string());
        vars.insert("start_datetime", "2026-03-14T18:00:00+00:00".to_string());
        vars.insert("option", "one_day".to_string());
        vars.insert("link", "/events/abc".to_string());
        EmailTemplate {
            name: REMINDER_TEMPLATE,
            vars,
        }
    }

    #[test]
    fn test_render_reminder() {
        let service = EmailService::new(test_config());
        let message = service.render("fox@example.com", &reminder()).unwrap();
        assert_eq!(message.subject, "Reminder: Board game night");
        assert_eq!(message.to_name.as_deref(), Some("Fox"));
        assert!(message.body_text.contains("https://app.example.com/events/abc"));
        assert!(message.body_text.contains("Hi Fox,"));
    }

    #[test]
    fn test_render_unknown_template() {
        let service = EmailService::new(test_config());
        let template = EmailTemplate {
            name: "password_reset",
            vars: BTreeMap::new(),
        };
        assert!(matches!(
            service.render("a@example.com", &template),
            Err(EmailError::UnknownTemplate(_))
        ));
    }

    #[tokio::test]
    async fn test_console_send() {
        let service = EmailService::new(test_config());
        assert_eq!(
            service.send("fox@example.com", reminder()).await,
            NotificationResult::Sent
        );
    }

    #[tokio::test]
    async fn test_disabled_is_skipped() {
        let mut config = test_config();
        config.enabled = false;
        let service = EmailService::new(config);
        assert!(!service.is_enabled());
        assert_eq!(
            service.send("fox@example.com", reminder()).await,
            NotificationResult::Skipped
        );
    }

    #[tokio::test]
    async fn test_sendgrid_without_key_fails() {
        let mut config = test_config();
        config.provider = "sendgrid".to_string();
        let service = EmailService::new(config);
        assert!(matches!(
            service.send("fox@example.com", reminder()).await,
            NotificationResult::Failed(_)
        ));
    }
}
