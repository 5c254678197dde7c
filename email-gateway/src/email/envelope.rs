//! Mail envelope model
//!
//! [`MailEnvelope`] is the fully assembled description of a message handed to a
//! [`MailTransport`](super::MailTransport). Everything here is transient and
//! lives for a single request.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::template::{EmailTemplate, TestAttachmentEmail};
use super::EmailError;

/// Where attachment bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// A file on disk, read when the message is built
    Path(PathBuf),
    /// Content already in memory
    Inline(Vec<u8>),
}

/// A file attached to an envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Filename shown to the recipient
    pub display_name: String,

    /// Location of the content
    pub source: AttachmentSource,

    /// MIME type; guessed from `display_name` when absent
    pub content_type: Option<String>,
}

impl AttachmentRef {
    /// Attachment backed by a file on disk
    #[must_use]
    pub fn from_path(display_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            source: AttachmentSource::Path(path.into()),
            content_type: None,
        }
    }

    /// Attachment backed by bytes in memory
    #[must_use]
    pub fn inline(display_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            display_name: display_name.into(),
            source: AttachmentSource::Inline(data.into()),
            content_type: None,
        }
    }

    /// Set an explicit MIME type
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// MIME type derived from the display name, `application/octet-stream` if unknown
    #[must_use]
    pub fn guessed_content_type(&self) -> String {
        mime_guess::from_path(&self.display_name)
            .first_or_octet_stream()
            .to_string()
    }

    /// Load the attachment content
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::Attachment`] if a path-backed file cannot be read.
    pub async fn read(&self) -> Result<Vec<u8>, EmailError> {
        match &self.source {
            AttachmentSource::Inline(data) => Ok(data.clone()),
            AttachmentSource::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| EmailError::Attachment {
                        name: self.display_name.clone(),
                        source,
                    })
            }
        }
    }
}

/// Outcome of a successful delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendResult {
    /// `Message-ID` stamped on the delivered message
    pub delivery_id: String,

    /// Final reply from the relay, e.g. `250 2.0.0 OK queued`
    pub raw_response: String,
}

/// Fully assembled message description
///
/// # Examples
///
/// ```rust
/// use email_gateway::email::{AttachmentRef, MailEnvelope};
///
/// let envelope = MailEnvelope::new()
///     .to("user@example.com")
///     .cc("manager@example.com")
///     .subject("Quarterly report")
///     .text("Report attached.")
///     .attach(AttachmentRef::inline("report.csv", b"a,b\n1,2\n".to_vec()));
///
/// assert!(envelope.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailEnvelope {
    /// Primary recipients, in order
    pub to: Vec<String>,

    /// Carbon-copy recipients
    pub cc: Vec<String>,

    /// Blind carbon-copy recipients
    pub bcc: Vec<String>,

    /// Sender override; the transport default is used when absent
    pub from: Option<String>,

    /// Reply-To address
    pub reply_to: Option<String>,

    /// Subject line
    pub subject: Option<String>,

    /// Plain text body
    pub text: Option<String>,

    /// HTML body
    pub html: Option<String>,

    /// Attachments, in order
    pub attachments: Vec<AttachmentRef>,
}

impl MailEnvelope {
    /// Create an empty envelope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipient
    #[must_use]
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Add a CC recipient
    #[must_use]
    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(address.into());
        self
    }

    /// Add a BCC recipient
    #[must_use]
    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.push(address.into());
        self
    }

    /// Set the sender
    #[must_use]
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Set the Reply-To address
    #[must_use]
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Set the subject
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the plain text body
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the HTML body
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Append an attachment
    #[must_use]
    pub fn attach(mut self, attachment: AttachmentRef) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Plain text message
    #[must_use]
    pub fn simple(to: impl Into<String>, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new().to(to).subject(subject).text(message)
    }

    /// HTML message with an optional plain text alternative
    #[must_use]
    pub fn html_message(
        to: impl Into<String>,
        subject: impl Into<String>,
        html: impl Into<String>,
        text: Option<String>,
    ) -> Self {
        let mut envelope = Self::new().to(to).subject(subject).html(html);
        envelope.text = text;
        envelope
    }

    /// Plain text message carrying one file from disk
    ///
    /// The attachment is named `attachment` unless `name` is given.
    #[must_use]
    pub fn with_attachment(
        to: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        name: Option<String>,
    ) -> Self {
        let name = name.unwrap_or_else(|| "attachment".to_string());
        Self::simple(to, subject, message).attach(AttachmentRef::from_path(name, path))
    }

    /// Canned message proving attachment delivery works, with `path` attached
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::TemplateError`] if the bodies fail to render.
    pub fn test_attachment(to: impl Into<String>, path: &Path) -> Result<Self, EmailError> {
        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        let template = TestAttachmentEmail::new(file_name.clone());
        let (html, text) = template.render_email()?;

        Ok(Self {
            to: vec![to.into()],
            subject: Some(template.subject()),
            text,
            html,
            attachments: vec![AttachmentRef::from_path(file_name, path)],
            ..Self::default()
        })
    }

    /// Plain text body, ignoring blank strings
    #[must_use]
    pub fn text_body(&self) -> Option<&str> {
        non_blank(self.text.as_deref())
    }

    /// HTML body, ignoring blank strings
    #[must_use]
    pub fn html_body(&self) -> Option<&str> {
        non_blank(self.html.as_deref())
    }

    /// Check the envelope is deliverable
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No recipients are set (`EmailError::NoRecipients`)
    /// - No subject is set (`EmailError::NoSubject`)
    /// - Neither text nor HTML content is set (`EmailError::NoContent`)
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.to.iter().all(|address| address.trim().is_empty()) {
            return Err(EmailError::NoRecipients);
        }

        if non_blank(self.subject.as_deref()).is_none() {
            return Err(EmailError::NoSubject);
        }

        if self.text_body().is_none() && self.html_body().is_none() {
            return Err(EmailError::NoContent);
        }

        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
