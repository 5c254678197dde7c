//! SMTP transport for sending emails
//!
//! Uses the `lettre` crate to deliver envelopes through an SMTP relay. One
//! `AsyncSmtpTransport` is built up front and shared by every request.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
        response::Response,
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, error, info, warn};

use super::{new_message_id, AttachmentRef, EmailError, MailEnvelope, MailTransport, SendResult};
use crate::config::SmtpSettings;

/// Attachment content resolved and ready for MIME encoding
struct LoadedAttachment {
    name: String,
    content_type: ContentType,
    data: Vec<u8>,
}

enum Body {
    Single(SinglePart),
    Alternative(MultiPart),
}

/// SMTP mail transport
///
/// # Examples
///
/// ```rust,no_run
/// use email_gateway::config::SmtpSettings;
/// use email_gateway::email::{MailEnvelope, MailTransport, SmtpTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = SmtpSettings {
///     user: Some("sender@example.com".to_string()),
///     pass: Some("app-password".to_string()),
///     ..Default::default()
/// };
/// let transport = SmtpTransport::new(&settings)?;
///
/// let envelope = MailEnvelope::simple("user@example.com", "Hello!", "Hello, World!");
/// let result = transport.send_message(envelope).await?;
/// println!("queued as {}", result.delivery_id);
/// # Ok(())
/// # }
/// ```
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Option<String>,
    relay: String,
}

impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport")
            .field("relay", &self.relay)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

impl SmtpTransport {
    /// Build the transport from relay settings
    ///
    /// # Errors
    ///
    /// Returns `EmailError::SmtpError` if TLS parameters cannot be created
    pub fn new(settings: &SmtpSettings) -> Result<Self, EmailError> {
        Ok(Self {
            transport: Self::create_transport(settings)?,
            sender: settings.sender().map(str::to_string),
            relay: format!("{}:{}", settings.host, settings.port),
        })
    }

    fn create_transport(
        settings: &SmtpSettings,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let tls_parameters = TlsParameters::builder(settings.host.clone())
            .dangerous_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .map_err(|e| EmailError::smtp(format!("TLS parameters error: {e}")))?;

        // Implicit TLS on connect, otherwise upgrade via STARTTLS when offered
        let tls = if settings.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            .port(settings.port)
            .tls(tls)
            .timeout(Some(settings.timeout()));

        if let Some(user) = &settings.user {
            transport = transport.credentials(Credentials::new(
                user.clone(),
                settings.pass.clone().unwrap_or_default(),
            ));
        }

        Ok(transport.build())
    }

    /// Build lettre Message from an envelope and its resolved attachments
    ///
    /// Returns the message together with the `Message-ID` stamped on it.
    fn build_message(
        envelope: &MailEnvelope,
        default_sender: Option<&str>,
        attachments: Vec<LoadedAttachment>,
    ) -> Result<(Message, String), EmailError> {
        envelope.validate()?;

        let from_addr = envelope
            .from
            .as_deref()
            .or(default_sender)
            .ok_or(EmailError::NoSender)?;
        let from = parse_mailbox(from_addr)?;
        let delivery_id = new_message_id(Some(from.email.domain()));

        let mut builder = Message::builder()
            .from(from)
            .message_id(Some(delivery_id.clone()));

        for to_addr in envelope.to.iter().filter(|a| !a.trim().is_empty()) {
            builder = builder.to(parse_mailbox(to_addr)?);
        }

        for cc_addr in &envelope.cc {
            builder = builder.cc(parse_mailbox(cc_addr)?);
        }

        for bcc_addr in &envelope.bcc {
            builder = builder.bcc(parse_mailbox(bcc_addr)?);
        }

        if let Some(reply_to_addr) = &envelope.reply_to {
            builder = builder.reply_to(parse_mailbox(reply_to_addr)?);
        }

        let subject = envelope.subject.as_deref().ok_or(EmailError::NoSubject)?;
        builder = builder.subject(subject);

        let body = match (envelope.text_body(), envelope.html_body()) {
            (Some(text), Some(html)) => Body::Alternative(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            )),
            (Some(text), None) => Body::Single(SinglePart::plain(text.to_string())),
            (None, Some(html)) => Body::Single(SinglePart::html(html.to_string())),
            (None, None) => return Err(EmailError::NoContent),
        };

        let message = if attachments.is_empty() {
            match body {
                Body::Single(part) => builder.singlepart(part),
                Body::Alternative(parts) => builder.multipart(parts),
            }
        } else {
            let mut mixed = match body {
                Body::Single(part) => MultiPart::mixed().singlepart(part),
                Body::Alternative(parts) => MultiPart::mixed().multipart(parts),
            };
            for attachment in attachments {
                mixed = mixed.singlepart(
                    Attachment::new(attachment.name).body(attachment.data, attachment.content_type),
                );
            }
            builder.multipart(mixed)
        }
        .map_err(|e| EmailError::smtp(e.to_string()))?;

        Ok((message, delivery_id))
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn verify_connection(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(true) => {
                info!(relay = %self.relay, "SMTP connection verified");
                true
            }
            Ok(false) => {
                warn!(relay = %self.relay, "SMTP relay did not accept the connection");
                false
            }
            Err(e) => {
                warn!(relay = %self.relay, error = %e, "SMTP connection failed");
                false
            }
        }
    }

    async fn send_message(&self, envelope: MailEnvelope) -> Result<SendResult, EmailError> {
        envelope.validate()?;

        let attachments = load_attachments(&envelope.attachments).await?;
        let (message, delivery_id) =
            Self::build_message(&envelope, self.sender.as_deref(), attachments)?;

        let response = self.transport.send(message).await.map_err(|e| {
            error!(relay = %self.relay, error = %e, "Failed to send email");
            EmailError::smtp(e.to_string())
        })?;

        let raw_response = format_response(&response);
        info!(
            delivery_id = %delivery_id,
            recipients = envelope.to.len(),
            attachments = envelope.attachments.len(),
            "Email sent"
        );
        debug!(response = %raw_response, "SMTP relay response");

        Ok(SendResult {
            delivery_id,
            raw_response,
        })
    }
}

async fn load_attachments(refs: &[AttachmentRef]) -> Result<Vec<LoadedAttachment>, EmailError> {
    let mut loaded = Vec::with_capacity(refs.len());
    for attachment in refs {
        let data = attachment.read().await?;
        loaded.push(LoadedAttachment {
            name: attachment.display_name.clone(),
            content_type: content_type_for(attachment)?,
            data,
        });
    }
    Ok(loaded)
}

/// Explicit MIME type when it parses, otherwise one guessed from the filename
fn content_type_for(attachment: &AttachmentRef) -> Result<ContentType, EmailError> {
    if let Some(parsed) = attachment
        .content_type
        .as_deref()
        .and_then(|ct| ContentType::parse(ct).ok())
    {
        return Ok(parsed);
    }

    let guessed = attachment.guessed_content_type();
    ContentType::parse(&guessed)
        .map_err(|_| EmailError::smtp(format!("unusable content type {guessed}")))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .trim()
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}

fn format_response(response: &Response) -> String {
    let lines: Vec<&str> = response.message().collect();
    format!("{} {}", response.code(), lines.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(name: &str, data: &[u8]) -> LoadedAttachment {
        let attachment = AttachmentRef::inline(name, data.to_vec());
        LoadedAttachment {
            name: name.to_string(),
            content_type: content_type_for(&attachment).unwrap(),
            data: data.to_vec(),
        }
    }

    fn formatted(message: &Message) -> String {
        String::from_utf8_lossy(&message.formatted()).into_owned()
    }

    #[test]
    fn test_build_message_simple() {
        let envelope = MailEnvelope::simple("recipient@example.com", "Test Email", "This is a test email");

        let result = SmtpTransport::build_message(&envelope, Some("sender@example.com"), Vec::new());
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_message_with_html_and_text() {
        let envelope = MailEnvelope::new()
            .to("recipient@example.com")
            .subject("Test Email")
            .text("This is plain text")
            .html("<h1>This is HTML</h1>");

        let (message, _) =
            SmtpTransport::build_message(&envelope, Some("sender@example.com"), Vec::new()).unwrap();
        assert!(formatted(&message).contains("multipart/alternative"));
    }

    #[test]
    fn test_build_message_with_cc_and_bcc() {
        let envelope = MailEnvelope::new()
            .to("recipient@example.com")
            .cc("cc@example.com")
            .bcc("bcc@example.com")
            .subject("Test Email")
            .text("Test content");

        let (message, _) =
            SmtpTransport::build_message(&envelope, Some("sender@example.com"), Vec::new()).unwrap();
        let raw = formatted(&message);
        assert!(raw.contains("Cc: cc@example.com"));
        assert_eq!(message.envelope().to().len(), 3);
    }

    #[test]
    fn test_build_message_with_attachments() {
        let envelope = MailEnvelope::simple("recipient@example.com", "Files", "See attached");

        let (message, _) = SmtpTransport::build_message(
            &envelope,
            Some("sender@example.com"),
            vec![loaded("report.pdf", b"%PDF-1.4"), loaded("notes.txt", b"hello")],
        )
        .unwrap();

        let raw = formatted(&message);
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("filename=\"report.pdf\""));
        assert!(raw.contains("filename=\"notes.txt\""));
        assert!(raw.contains("application/pdf"));
    }

    #[test]
    fn test_build_message_requires_sender() {
        let envelope = MailEnvelope::simple("recipient@example.com", "Test", "Body");

        let result = SmtpTransport::build_message(&envelope, None, Vec::new());
        assert!(matches!(result, Err(EmailError::NoSender)));
    }

    #[test]
    fn test_envelope_sender_overrides_default() {
        let envelope =
            MailEnvelope::simple("recipient@example.com", "Test", "Body").from("team@corp.example");

        let (message, delivery_id) =
            SmtpTransport::build_message(&envelope, Some("sender@example.com"), Vec::new()).unwrap();
        assert!(formatted(&message).contains("From: team@corp.example"));
        assert!(delivery_id.ends_with("@corp.example>"));
    }

    #[test]
    fn test_build_message_rejects_invalid_address() {
        let envelope = MailEnvelope::simple("not an address", "Test", "Body");

        let result = SmtpTransport::build_message(&envelope, Some("sender@example.com"), Vec::new());
        assert!(matches!(result, Err(EmailError::InvalidAddress(addr)) if addr == "not an address"));
    }

    #[test]
    fn test_message_ids_are_distinct() {
        let envelope = MailEnvelope::simple("recipient@example.com", "Test", "Body");

        let (message, first) =
            SmtpTransport::build_message(&envelope, Some("sender@example.com"), Vec::new()).unwrap();
        let (_, second) =
            SmtpTransport::build_message(&envelope, Some("sender@example.com"), Vec::new()).unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with('<') && first.ends_with("@example.com>"));
        assert!(formatted(&message).contains(&format!("Message-ID: {first}")));
    }

    #[test]
    fn test_content_type_falls_back_to_guess() {
        let bogus = AttachmentRef::inline("photo.png", Vec::new()).with_content_type("not a mime");
        assert_eq!(content_type_for(&bogus).unwrap(), ContentType::parse("image/png").unwrap());

        let explicit = AttachmentRef::inline("data.bin", Vec::new()).with_content_type("text/csv");
        assert_eq!(content_type_for(&explicit).unwrap(), ContentType::parse("text/csv").unwrap());
    }

    fn unreachable_settings() -> SmtpSettings {
        SmtpSettings {
            host: "127.0.0.1".to_string(),
            // Port 1 (tcpmux) is closed on any sane test host
            port: 1,
            user: Some("sender@example.com".to_string()),
            pass: Some("secret".to_string()),
            timeout_secs: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_verify_connection_unreachable_returns_false() {
        let transport = SmtpTransport::new(&unreachable_settings()).unwrap();
        assert!(!transport.verify_connection().await);
    }

    #[tokio::test]
    async fn test_send_to_unreachable_relay_is_transport_error() {
        let transport = SmtpTransport::new(&unreachable_settings()).unwrap();
        let envelope = MailEnvelope::simple("recipient@example.com", "Test", "Body");

        let err = transport.send_message(envelope).await.unwrap_err();
        assert!(matches!(err, EmailError::SmtpError(_)));
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_send_rejects_invalid_envelope_before_connecting() {
        let transport = SmtpTransport::new(&unreachable_settings()).unwrap();
        let envelope = MailEnvelope::new().to("recipient@example.com").subject("No body");

        let err = transport.send_message(envelope).await.unwrap_err();
        assert!(matches!(err, EmailError::NoContent));
    }

    #[test]
    fn test_format_response_joins_lines() {
        use lettre::transport::smtp::response::{Category, Code, Detail, Severity};

        let response = Response::new(
            Code::new(Severity::PositiveCompletion, Category::MailSystem, Detail::Zero),
            vec!["OK".to_string(), "queued as 4F2A".to_string()],
        );
        assert_eq!(format_response(&response), "250 OK queued as 4F2A");
    }
}
