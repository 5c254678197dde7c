//! Send endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::email::{MailEnvelope, SendResult};
use crate::error::GatewayError;
use crate::extractors::{ApiJson, AttachmentForm, SendEmailRequest, TestPdfRequest};
use crate::staging::StagedAttachments;
use crate::state::AppState;

/// Body of a successful send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    /// Always `true`
    pub success: bool,

    /// Human readable outcome
    pub message: String,

    /// Identifier assigned to the delivered message
    pub message_id: String,

    /// Number of files attached, for the multipart endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_count: Option<usize>,
}

impl SendResponse {
    fn delivered(message: &str, result: SendResult) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            message_id: result.delivery_id,
            attachment_count: None,
        }
    }

    const fn with_attachment_count(mut self, count: usize) -> Self {
        self.attachment_count = Some(count);
        self
    }
}

/// `POST /api/send-email`
///
/// Sends a message without attachments.
pub async fn send_email(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SendEmailRequest>,
) -> Result<Json<SendResponse>, GatewayError> {
    request.check()?;

    let result = state
        .transport()
        .send_message(request.into_envelope(Vec::new()))
        .await
        .map_err(|err| GatewayError::from_send_failure("Failed to send email", err))?;

    info!(message_id = %result.delivery_id, "Email sent");
    Ok(Json(SendResponse::delivered("Email sent successfully", result)))
}

/// `POST /api/send-email-with-attachments`
///
/// Staged files are removed before the response is produced, whether the
/// send succeeded, failed validation, or failed in the transport.
pub async fn send_email_with_attachments(
    State(state): State<AppState>,
    form: AttachmentForm,
) -> Result<Json<SendResponse>, GatewayError> {
    let AttachmentForm { request, staged } = form;
    let count = staged.len();

    let outcome = deliver_staged(&state, request, &staged).await;
    staged.cleanup().await;
    let result = outcome?;

    info!(message_id = %result.delivery_id, count, "Email with attachments sent");
    Ok(Json(
        SendResponse::delivered("Email with attachments sent successfully", result)
            .with_attachment_count(count),
    ))
}

async fn deliver_staged(
    state: &AppState,
    request: SendEmailRequest,
    staged: &StagedAttachments,
) -> Result<SendResult, GatewayError> {
    request.check()?;

    state
        .transport()
        .send_message(request.into_envelope(staged.attachment_refs()))
        .await
        .map_err(|err| GatewayError::from_send_failure("Failed to send email with attachments", err))
}

/// `POST /api/send-test-pdf`
///
/// Sends the canned attachment test message with the configured PDF. A
/// `subject` or `text` in the request replaces the canned one; a `text`
/// override sends a plain text message without the canned HTML.
pub async fn send_test_pdf(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TestPdfRequest>,
) -> Result<Json<SendResponse>, GatewayError> {
    request.check()?;

    let envelope = test_pdf_envelope(&state, request)
        .map_err(|err| GatewayError::from_send_failure("Failed to send test PDF", err))?;

    let result = state
        .transport()
        .send_message(envelope)
        .await
        .map_err(|err| GatewayError::from_send_failure("Failed to send test PDF", err))?;

    info!(message_id = %result.delivery_id, "Test PDF email sent");
    Ok(Json(SendResponse::delivered("Test PDF email sent successfully", result)))
}

fn test_pdf_envelope(
    state: &AppState,
    request: TestPdfRequest,
) -> Result<MailEnvelope, crate::email::EmailError> {
    let TestPdfRequest { to, subject, text } = request;
    let path = &state.config().attachments.test_pdf_path;

    let mut envelope = MailEnvelope::test_attachment(String::new(), path)?;
    envelope.to = to;
    if let Some(subject) = subject {
        envelope.subject = Some(subject);
    }
    if let Some(text) = text {
        envelope.text = Some(text);
        envelope.html = None;
    }

    Ok(envelope)
}
