//! Console transport for development
//!
//! Logs envelopes instead of delivering them, so the gateway can run without
//! SMTP credentials.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{new_message_id, EmailError, MailEnvelope, MailTransport, SendResult};

/// Transport that logs every envelope and reports it as queued
#[derive(Debug, Clone, Default)]
pub struct ConsoleTransport {
    sender: Option<String>,
}

impl ConsoleTransport {
    /// Create a console transport
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `sender` for envelopes without their own `from`
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }
}

#[async_trait]
impl MailTransport for ConsoleTransport {
    async fn verify_connection(&self) -> bool {
        info!("Console transport active, no relay to verify");
        true
    }

    async fn send_message(&self, envelope: MailEnvelope) -> Result<SendResult, EmailError> {
        envelope.validate()?;

        let from = envelope
            .from
            .as_deref()
            .or(self.sender.as_deref())
            .unwrap_or("console@localhost");
        let domain = from.rsplit_once('@').map(|(_, domain)| domain);
        let delivery_id = new_message_id(domain);

        info!(
            delivery_id = %delivery_id,
            from = %from,
            to = ?envelope.to,
            cc = ?envelope.cc,
            bcc = ?envelope.bcc,
            subject = ?envelope.subject,
            attachments = ?envelope
                .attachments
                .iter()
                .map(|a| a.display_name.as_str())
                .collect::<Vec<_>>(),
            "Console email sent"
        );

        if let Some(text) = envelope.text_body() {
            debug!(text = %text, "Email text content");
        }
        if let Some(html) = envelope.html_body() {
            debug!(html = %html, "Email HTML content");
        }

        Ok(SendResult {
            delivery_id,
            raw_response: "250 queued on console".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_send() {
        let transport = ConsoleTransport::new().with_sender("noreply@myapp.com");
        let envelope = MailEnvelope::simple("user@example.com", "Test Email", "This is a test email");

        let result = transport.send_message(envelope).await.unwrap();
        assert!(result.delivery_id.ends_with("@myapp.com>"));
        assert_eq!(result.raw_response, "250 queued on console");
    }

    #[tokio::test]
    async fn test_console_still_validates() {
        let transport = ConsoleTransport::new();
        let envelope = MailEnvelope::new().to("user@example.com").subject("Empty");

        assert!(matches!(
            transport.send_message(envelope).await,
            Err(EmailError::NoContent)
        ));
    }

    #[tokio::test]
    async fn test_console_always_verifies() {
        assert!(ConsoleTransport::new().verify_connection().await);
    }
}
