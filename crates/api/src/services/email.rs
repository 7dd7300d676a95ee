//! Email delivery for booking notifications.
//!
//! Supports two providers:
//! - `console`: logs emails (development)
//! - `sendgrid`: SendGrid v3 mail API over `reqwest`
//!
//! Delivery is best-effort. Every failure, including a disabled service or
//! missing credentials, becomes a failed [`DeliveryReport`] rather than an
//! error for the caller.

use async_trait::async_trait;
use domain::services::notification::{DeliveryReport, MailMessage, Mailer};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::EmailConfig;

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service disabled")]
    Disabled,

    #[error("Email service not configured: {0}")]
    NotConfigured(String),

    #[error("Unknown email provider: {0}")]
    UnknownProvider(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email service for booking notifications.
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

    /// Sends through the configured provider.
    pub async fn deliver(&self, message: &MailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Err(EmailError::Disabled);
        }

        match self.config.provider.as_str() {
            "console" => {
                self.send_console(message);
                Ok(())
            }
            "sendgrid" => self.send_sendgrid(message).await,
            provider => Err(EmailError::UnknownProvider(provider.to_string())),
        }
    }

    /// Console provider - logs email instead of sending it.
    fn send_console(&self, message: &MailMessage) {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            subject = %message.subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            "Email (console provider)"
        );
        debug!(body_text = %message.body_text, "Email body (plain text)");
    }

    /// Request body for the SendGrid v3 API.
    fn sendgrid_body(&self, message: &MailMessage) -> serde_json::Value {
        let mut recipient = json!({ "email": message.to });
        if let Some(name) = &message.to_name {
            recipient["name"] = json!(name);
        }

        let mut content = vec![json!({
            "type": "text/plain",
            "value": message.body_text
        })];
        if let Some(html) = &message.body_html {
            content.push(json!({
                "type": "text/html",
                "value": html
            }));
        }

        json!({
            "personalizations": [{ "to": [recipient] }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": content
        })
    }

    async fn send_sendgrid(&self, message: &MailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured(
                "sendgrid_api_key is empty".to_string(),
            ));
        }

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&self.sendgrid_body(message))
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(
                to = %message.to,
                subject = %message.subject,
                "Email sent via SendGrid"
            );
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
impl Mailer for EmailService {
    async fn send(&self, message: MailMessage) -> DeliveryReport {
        match self.deliver(&message).await {
            Ok(()) => DeliveryReport::delivered(),
            Err(err) => {
                warn!(to = %message.to, reason = %err, "Email not delivered");
                DeliveryReport::failed(err.to_string())
            }
        }
    }
}
