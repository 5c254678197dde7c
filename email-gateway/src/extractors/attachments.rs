//! Multipart extractor that stages attachments as they stream in
//!
//! Text parts become [`SendEmailRequest`] fields. File parts named
//! `attachments` are written straight to the staging directory, so memory use
//! stays flat regardless of upload size. The count and per-file size limits
//! from `[attachments]` are enforced while reading; exceeding either rejects
//! the whole request after removing anything already staged.

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        FromRequest, Multipart, Request,
    },
    http::StatusCode,
};
use tracing::debug;

use super::SendEmailRequest;
use crate::config::AttachmentSettings;
use crate::error::GatewayError;
use crate::staging::{StagedAttachments, StagingError};
use crate::state::AppState;

/// Form field carrying uploaded files
pub const ATTACHMENTS_FIELD: &str = "attachments";

/// Parsed multipart send request with its staged files
///
/// Validation is left to the handler so that an invalid request still owns
/// (and cleans up) its staged files.
///
/// # Example
///
/// ```rust,no_run
/// use email_gateway::extractors::AttachmentForm;
///
/// async fn handler(form: AttachmentForm) -> String {
///     let count = form.staged.len();
///     form.staged.cleanup().await;
///     format!("received {count} files")
/// }
/// ```
#[derive(Debug)]
pub struct AttachmentForm {
    /// Text fields
    pub request: SendEmailRequest,

    /// Files written for this request
    pub staged: StagedAttachments,
}

impl FromRequest<AppState> for AttachmentForm {
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| GatewayError::BadRequest(rejection.body_text()))?;

        let config = state.config();
        let mut staged = StagedAttachments::new(&config.server.uploads_dir);
        let mut request = SendEmailRequest::default();

        match read_fields(&mut multipart, &mut request, &mut staged, &config.attachments).await {
            Ok(()) => Ok(Self { request, staged }),
            Err(err) => {
                staged.cleanup().await;
                Err(err)
            }
        }
    }
}

async fn read_fields(
    multipart: &mut Multipart,
    request: &mut SendEmailRequest,
    staged: &mut StagedAttachments,
    limits: &AttachmentSettings,
) -> Result<(), GatewayError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await.map_err(multipart_error)?;
            request.apply_form_field(&name, &value);
            continue;
        };

        // Browsers send an empty filename for an untouched file input
        if file_name.trim().is_empty() {
            continue;
        }

        if name != ATTACHMENTS_FIELD {
            return Err(GatewayError::BadRequest(format!("Unexpected file field: {name}")));
        }

        if staged.len() >= limits.max_files {
            return Err(GatewayError::PayloadTooLarge {
                message: format!(
                    "Too many files. Maximum is {} attachments.",
                    limits.max_files
                ),
                detail: format!("more than {} files uploaded", limits.max_files),
            });
        }

        stage_field(field, &file_name, staged, limits).await?;
    }

    Ok(())
}

async fn stage_field(
    mut field: Field<'_>,
    file_name: &str,
    staged: &mut StagedAttachments,
    limits: &AttachmentSettings,
) -> Result<(), GatewayError> {
    let content_type = field.content_type().map(str::to_string);
    let mut writer = staged
        .create(file_name, content_type)
        .await
        .map_err(staging_error)?;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if writer.written() + chunk.len() > limits.max_file_size {
            return Err(GatewayError::PayloadTooLarge {
                message: format!(
                    "File too large. Maximum size is {}.",
                    limits.max_file_size_label()
                ),
                detail: format!("{file_name} exceeds {} bytes", limits.max_file_size),
            });
        }
        writer.write_chunk(&chunk).await.map_err(staging_error)?;
    }

    let size = writer.finish().await.map_err(staging_error)?;
    debug!(file = %file_name, size, "Attachment staged");
    Ok(())
}

fn multipart_error(err: MultipartError) -> GatewayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::body_too_large(err.body_text())
    } else {
        GatewayError::BadRequest(err.body_text())
    }
}

fn staging_error(err: StagingError) -> GatewayError {
    GatewayError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::email::ConsoleTransport;
    use axum::body::Body;
    use axum::http::header;
    use std::path::Path;
    use std::sync::Arc;

    const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

    fn state_with_uploads(dir: &Path, max_files: usize, max_file_size: usize) -> AppState {
        let mut config = GatewayConfig::default();
        config.server.uploads_dir = dir.to_path_buf();
        config.attachments.max_files = max_files;
        config.attachments.max_file_size = max_file_size;
        AppState::new(config, Arc::new(ConsoleTransport::new()))
    }

    fn multipart_request(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Request {
        let mut body = Vec::new();

        for (name, value) in fields {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
            );
        }

        for (name, filename, content) in files {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn staged_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map_or(0, Iterator::count)
    }

    #[tokio::test]
    async fn test_fields_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_uploads(dir.path(), 5, 1024);
        let req = multipart_request(
            &[("to", "a@example.com"), ("subject", "Files"), ("text", "See attached")],
            &[
                ("attachments", "one.txt", b"first".as_slice()),
                ("attachments", "two.txt", b"second".as_slice()),
            ],
        );

        let form = AttachmentForm::from_request(req, &state).await.unwrap();
        assert_eq!(form.request.to, vec!["a@example.com"]);
        assert_eq!(form.request.subject.as_deref(), Some("Files"));
        assert_eq!(form.staged.len(), 2);
        assert_eq!(form.staged.files()[0].display_name, "one.txt");
        assert_eq!(staged_count(dir.path()), 2);

        form.staged.cleanup().await;
        assert_eq!(staged_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_no_files_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_uploads(dir.path(), 5, 1024);
        let req = multipart_request(&[("to", "a@example.com")], &[]);

        let form = AttachmentForm::from_request(req, &state).await.unwrap();
        assert!(form.staged.is_empty());
    }

    #[tokio::test]
    async fn test_too_many_files_rejected_and_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_uploads(dir.path(), 5, 1024);
        let files: Vec<(&str, &str, &[u8])> = (0..6)
            .map(|_| ("attachments", "file.txt", b"x".as_slice()))
            .collect();
        let req = multipart_request(&[("to", "a@example.com")], &files);

        let err = AttachmentForm::from_request(req, &state).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::PayloadTooLarge { ref message, .. }
                if message == "Too many files. Maximum is 5 attachments."
        ));
        assert_eq!(staged_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_and_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_uploads(dir.path(), 5, 16);
        let req = multipart_request(
            &[],
            &[
                ("attachments", "small.txt", b"tiny".as_slice()),
                ("attachments", "big.bin", [7u8; 64].as_slice()),
            ],
        );

        let err = AttachmentForm::from_request(req, &state).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::PayloadTooLarge { ref detail, .. } if detail == "big.bin exceeds 16 bytes"
        ));
        assert_eq!(staged_count(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_unexpected_file_field() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_uploads(dir.path(), 5, 1024);
        let req = multipart_request(&[], &[("avatar", "me.png", b"png".as_slice())]);

        let err = AttachmentForm::from_request(req, &state).await.unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_not_multipart_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_uploads(dir.path(), 5, 1024);
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let err = AttachmentForm::from_request(req, &state).await.unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));
    }
}
