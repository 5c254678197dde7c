//! Email error types

use thiserror::Error;

/// Errors raised while assembling or delivering a message
#[derive(Debug, Error)]
pub enum EmailError {
    /// Envelope has no recipients
    #[error("email must have at least one recipient")]
    NoRecipients,

    /// No sender configured and none supplied
    #[error("email must have a from address")]
    NoSender,

    /// Envelope has no subject
    #[error("email must have a subject")]
    NoSubject,

    /// Envelope has no body content
    #[error("email must have either text or HTML content")]
    NoContent,

    /// Invalid email address format
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Attachment content could not be read
    #[error("failed to read attachment {name}: {source}")]
    Attachment {
        /// Display name of the attachment
        name: String,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// Template rendering error
    #[error("failed to render email template: {0}")]
    TemplateError(#[from] askama::Error),

    /// SMTP transport error
    #[error("SMTP error: {0}")]
    SmtpError(String),
}

impl EmailError {
    /// Create an SMTP error from a string message
    #[must_use]
    pub fn smtp<T: Into<String>>(msg: T) -> Self {
        Self::SmtpError(msg.into())
    }

    /// Whether the caller supplied something unusable, as opposed to a delivery failure
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NoRecipients | Self::NoSubject | Self::NoContent | Self::InvalidAddress(_)
        )
    }
}
