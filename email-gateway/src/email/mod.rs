//! Email envelopes and outbound transports
//!
//! # Backends
//!
//! - [`SmtpTransport`]: delivers through an SMTP relay with `lettre`
//! - [`ConsoleTransport`]: logs envelopes, for development
//!
//! # Examples
//!
//! ```rust,no_run
//! use email_gateway::email::{AttachmentRef, MailEnvelope, MailTransport};
//!
//! # async fn example(transport: &dyn MailTransport) -> Result<(), Box<dyn std::error::Error>> {
//! let envelope = MailEnvelope::new()
//!     .to("user@example.com")
//!     .subject("Welcome!")
//!     .text("Welcome aboard!")
//!     .html("<h1>Welcome aboard!</h1>")
//!     .attach(AttachmentRef::from_path("guide.pdf", "./assets/guide.pdf"));
//!
//! let result = transport.send_message(envelope).await?;
//! println!("delivered as {}", result.delivery_id);
//! # Ok(())
//! # }
//! ```

mod console;
mod envelope;
mod error;
mod smtp;
mod template;
mod transport;

pub use console::ConsoleTransport;
pub use envelope::{AttachmentRef, AttachmentSource, MailEnvelope, SendResult};
pub use error::EmailError;
pub use smtp::SmtpTransport;
pub use template::{EmailTemplate, TestAttachmentEmail};
pub use transport::MailTransport;

#[cfg(test)]
pub use transport::MockMailTransport;

/// Fresh `Message-ID` value, `<uuid@domain>`
pub(crate) fn new_message_id(domain: Option<&str>) -> String {
    let domain = domain
        .filter(|d| !d.is_empty())
        .unwrap_or("email-gateway.localhost");
    format!("<{}@{}>", uuid::Uuid::new_v4(), domain)
}
