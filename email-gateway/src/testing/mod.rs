//! Testing utilities
//!
//! [`RecordingTransport`] stands in for the SMTP relay in integration tests:
//! it captures every envelope, can be told to fail, and reads every attachment
//! at the moment of sending the way the SMTP transport does.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use email_gateway::{config::GatewayConfig, state::AppState, testing::RecordingTransport};
//!
//! let transport = RecordingTransport::new();
//! let state = AppState::new(GatewayConfig::default(), Arc::new(transport.clone()));
//! assert_eq!(transport.sent_count(), 0);
//! # let _ = state;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::email::{new_message_id, EmailError, MailEnvelope, MailTransport, SendResult};

/// Envelope captured by [`RecordingTransport`]
#[derive(Debug, Clone)]
pub struct RecordedSend {
    /// The envelope as handed to the transport
    pub envelope: MailEnvelope,

    /// Size of each attachment as read at send time
    pub attachment_sizes: Vec<usize>,

    /// Id returned to the caller
    pub delivery_id: String,
}

/// In-memory transport for tests
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<RecordedSend>>>,
    failing: Arc<AtomicBool>,
    unreachable: Arc<AtomicBool>,
}

impl RecordingTransport {
    /// Create a transport that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with an SMTP error
    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make `verify_connection` report failure
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of envelopes accepted
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned (should never happen in tests)
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Every accepted send, oldest first
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned (should never happen in tests)
    #[must_use]
    pub fn sent(&self) -> Vec<RecordedSend> {
        self.sent.lock().unwrap().clone()
    }

    /// Most recent accepted send
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned (should never happen in tests)
    #[must_use]
    pub fn last_sent(&self) -> Option<RecordedSend> {
        self.sent.lock().unwrap().last().cloned()
    }

    /// Whether any accepted envelope lists `address` in `to`
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned (should never happen in tests)
    #[must_use]
    pub fn was_sent_to(&self, address: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .any(|send| send.envelope.to.iter().any(|to| to == address))
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn verify_connection(&self) -> bool {
        !self.unreachable.load(Ordering::SeqCst)
    }

    async fn send_message(&self, envelope: MailEnvelope) -> Result<SendResult, EmailError> {
        envelope.validate()?;

        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::smtp("recording transport set to fail"));
        }

        let mut attachment_sizes = Vec::with_capacity(envelope.attachments.len());
        for attachment in &envelope.attachments {
            attachment_sizes.push(attachment.read().await?.len());
        }

        let delivery_id = new_message_id(Some("recording.test"));
        self.sent.lock().unwrap().push(RecordedSend {
            envelope,
            attachment_sizes,
            delivery_id: delivery_id.clone(),
        });

        Ok(SendResult {
            delivery_id,
            raw_response: "250 recorded".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::AttachmentRef;

    #[tokio::test]
    async fn test_records_sends() {
        let transport = RecordingTransport::new();
        let result = transport
            .send_message(MailEnvelope::simple("a@example.com", "Hi", "Hello"))
            .await
            .unwrap();

        assert_eq!(transport.sent_count(), 1);
        assert!(transport.was_sent_to("a@example.com"));
        assert!(!transport.was_sent_to("b@example.com"));
        assert_eq!(transport.last_sent().unwrap().delivery_id, result.delivery_id);
    }

    #[tokio::test]
    async fn test_failing_and_unreachable() {
        let transport = RecordingTransport::new();
        transport.fail_sends(true);
        transport.set_unreachable(true);

        assert!(!transport.verify_connection().await);
        let err = transport
            .send_message(MailEnvelope::simple("a@example.com", "Hi", "Hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, EmailError::SmtpError(_)));
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_reads_attachments() {
        let transport = RecordingTransport::new();
        let envelope = MailEnvelope::simple("a@example.com", "Hi", "Hello")
            .attach(AttachmentRef::inline("a.txt", b"abc".to_vec()));
        transport.send_message(envelope).await.unwrap();
        assert_eq!(transport.last_sent().unwrap().attachment_sizes, vec![3]);

        let missing = MailEnvelope::simple("a@example.com", "Hi", "Hello")
            .attach(AttachmentRef::from_path("gone.pdf", "/nonexistent/gone.pdf"));
        let err = transport.send_message(missing).await.unwrap_err();
        assert!(matches!(err, EmailError::Attachment { .. }));
        assert_eq!(transport.sent_count(), 1);
    }
}
