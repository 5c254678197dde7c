//! Mail transport abstraction

use async_trait::async_trait;

use super::{EmailError, MailEnvelope, SendResult};

/// Outbound mail transport
///
/// One instance is shared by every request, so implementations must be safe
/// for concurrent use.
///
/// # Examples
///
/// ```rust,no_run
/// use email_gateway::email::{MailEnvelope, MailTransport};
///
/// async fn notify(transport: &dyn MailTransport) -> Result<String, Box<dyn std::error::Error>> {
///     if !transport.verify_connection().await {
///         return Err("relay unavailable".into());
///     }
///
///     let envelope = MailEnvelope::simple("user@example.com", "Hello", "Hello, World!");
///     let result = transport.send_message(envelope).await?;
///     Ok(result.delivery_id)
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Lightweight handshake with the relay
    ///
    /// Returns `false` on any network or authentication failure and logs the cause.
    async fn verify_connection(&self) -> bool;

    /// Deliver an envelope
    ///
    /// # Errors
    ///
    /// Returns a validation error ([`EmailError::is_validation`]) for an
    /// undeliverable envelope, or a transport error wrapping the relay failure.
    async fn send_message(&self, envelope: MailEnvelope) -> Result<SendResult, EmailError>;
}
