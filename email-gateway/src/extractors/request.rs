//! Send request payloads and their validation

use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::email::{AttachmentRef, MailEnvelope};
use crate::error::GatewayError;

/// Fields of a send request, shared by the JSON and multipart endpoints
///
/// Recipient fields accept a single address, a comma-separated list, or a JSON
/// array. Blank strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[validate(schema(function = "validate_body", skip_on_field_errors = false))]
pub struct SendEmailRequest {
    /// Primary recipients
    #[serde(default, deserialize_with = "deserialize_recipients")]
    #[validate(length(min = 1, message = "at least one recipient is required"))]
    pub to: Vec<String>,

    /// Subject line
    #[serde(default, deserialize_with = "deserialize_text")]
    #[validate(required(message = "subject is required"))]
    pub subject: Option<String>,

    /// Plain text body
    #[serde(default, deserialize_with = "deserialize_text")]
    pub text: Option<String>,

    /// HTML body
    #[serde(default, deserialize_with = "deserialize_text")]
    pub html: Option<String>,

    /// Carbon-copy recipients
    #[serde(default, deserialize_with = "deserialize_recipients")]
    pub cc: Vec<String>,

    /// Blind carbon-copy recipients
    #[serde(default, deserialize_with = "deserialize_recipients")]
    pub bcc: Vec<String>,
}

impl SendEmailRequest {
    /// Record a multipart text field; unknown names are ignored
    pub fn apply_form_field(&mut self, name: &str, value: &str) {
        match name {
            "to" => self.to.extend(split_addresses(value)),
            "cc" => self.cc.extend(split_addresses(value)),
            "bcc" => self.bcc.extend(split_addresses(value)),
            "subject" => self.subject = non_blank(value),
            "text" => self.text = non_blank(value),
            "html" => self.html = non_blank(value),
            _ => {}
        }
    }

    /// Require a recipient, a subject and at least one body
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] naming the missing fields.
    pub fn check(&self) -> Result<(), GatewayError> {
        self.validate()
            .map_err(|errors| GatewayError::missing_fields(Some(format_validation_errors(&errors))))
    }

    /// Envelope carrying these fields and `attachments`
    #[must_use]
    pub fn into_envelope(self, attachments: Vec<AttachmentRef>) -> MailEnvelope {
        MailEnvelope {
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            subject: self.subject,
            text: self.text,
            html: self.html,
            attachments,
            ..MailEnvelope::default()
        }
    }
}

fn validate_body(request: &SendEmailRequest) -> Result<(), ValidationError> {
    if request.text.is_none() && request.html.is_none() {
        let mut error = ValidationError::new("body_required");
        error.message = Some("either text or html is required".into());
        return Err(error);
    }
    Ok(())
}

/// Body of `POST /api/send-test-pdf`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct TestPdfRequest {
    /// Recipients of the test message
    #[serde(default, deserialize_with = "deserialize_recipients")]
    #[validate(length(min = 1, message = "Recipient email is required"))]
    pub to: Vec<String>,

    /// Replaces the canned subject
    #[serde(default, deserialize_with = "deserialize_text")]
    pub subject: Option<String>,

    /// Replaces the canned plain text body
    #[serde(default, deserialize_with = "deserialize_text")]
    pub text: Option<String>,
}

impl TestPdfRequest {
    /// Require a recipient
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] when `to` is missing.
    pub fn check(&self) -> Result<(), GatewayError> {
        self.validate().map_err(|errors| GatewayError::Validation {
            message: "Recipient email is required".to_string(),
            detail: Some(format_validation_errors(&errors)),
        })
    }
}

/// Format validation errors as `field: message` pairs, sorted by field
#[must_use]
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let reason = error
                .message
                .as_ref()
                .map_or_else(|| error.code.to_string(), ToString::to_string);
            if field == "__all__" {
                messages.push(reason);
            } else {
                messages.push(format!("{field}: {reason}"));
            }
        }
    }

    messages.sort();
    messages.join("; ")
}

/// Split a comma-separated address list, dropping blanks
#[must_use]
pub fn split_addresses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipientsField {
    One(String),
    Many(Vec<String>),
}

fn deserialize_recipients<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RecipientsField>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RecipientsField::One(raw)) => split_addresses(&raw),
        Some(RecipientsField::Many(list)) => list.iter().flat_map(|raw| split_addresses(raw)).collect(),
    })
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.and_then(|value| non_blank(&value)))
}
