//! HTTP client for the gateway API
//!
//! Every call is made once; failures are returned to the caller as-is.

use std::path::PathBuf;

use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::form::{EmailForm, SendMode};

/// Gateway URL used when none is given
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Client-side failures
#[derive(Debug, Error)]
pub enum ClientError {
    /// The gateway could not be reached or the connection dropped
    #[error("Connection error: {0}")]
    Network(#[from] reqwest::Error),

    /// A selected file could not be read
    #[error("Cannot read {}: {source}", path.display())]
    File {
        /// File that failed
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },

    /// The gateway answered with something other than its JSON shape
    #[error("Unexpected response ({status}): {body}")]
    UnexpectedResponse {
        /// HTTP status
        status: StatusCode,
        /// Raw body
        body: String,
    },
}

/// JSON body the gateway answers send requests with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// Whether the gateway accepted the request
    pub success: bool,

    /// Human readable outcome
    pub message: String,

    /// Delivered message id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Number of files attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_count: Option<usize>,

    /// Failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of `GET /api/test-connection`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The gateway verified its SMTP relay
    Connected,
    /// The gateway is up but its SMTP relay is not
    Failed,
}

/// Gateway API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Client for the gateway at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Gateway root this client talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Ask the gateway to verify its SMTP relay
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway is unreachable or answers garbage.
    pub async fn test_connection(&self) -> Result<ConnectionStatus, ClientError> {
        let response = dispatch(self.http.get(self.url("/api/test-connection"))).await?;
        Ok(if response.success {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Failed
        })
    }

    /// Submit a form using the mode it selects
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read, the gateway is unreachable,
    /// or the response is not the gateway's JSON shape. Rejections by the
    /// gateway come back as `Ok` with `success == false`.
    pub async fn send(&self, form: &EmailForm) -> Result<ApiResponse, ClientError> {
        match form.mode() {
            SendMode::WithAttachments => self.send_multipart(form).await,
            SendMode::FieldsOnly => self.send_json(form).await,
        }
    }

    /// Submit the form fields as JSON, ignoring any files
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn send_json(&self, form: &EmailForm) -> Result<ApiResponse, ClientError> {
        let request = self
            .http
            .post(self.url(SendMode::FieldsOnly.path()))
            .json(&form.json_body());
        dispatch(request).await
    }

    /// Submit the form as multipart with its files
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn send_multipart(&self, form: &EmailForm) -> Result<ApiResponse, ClientError> {
        let body = form.multipart_body().await?;
        let request = self
            .http
            .post(self.url(SendMode::WithAttachments.path()))
            .multipart(body);
        dispatch(request).await
    }

    /// Send the gateway's fixed test PDF
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn send_test_pdf(
        &self,
        to: &[String],
        subject: Option<&str>,
        text: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let mut body = json!({ "to": to.join(", ") });
        if let Some(subject) = subject {
            body["subject"] = json!(subject);
        }
        if let Some(text) = text {
            body["text"] = json!(text);
        }

        dispatch(self.http.post(self.url("/api/send-test-pdf")).json(&body)).await
    }
}

async fn dispatch(request: RequestBuilder) -> Result<ApiResponse, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    serde_json::from_str(&body).map_err(|_| ClientError::UnexpectedResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(client.url("/api/send-email"), "http://localhost:3000/api/send-email");
        assert_eq!(client.base_url(), DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_response_parsing() {
        let ok: ApiResponse = serde_json::from_str(
            r#"{"success":true,"message":"Email sent successfully","messageId":"<id@x>"}"#,
        )
        .unwrap();
        assert_eq!(ok.message_id.as_deref(), Some("<id@x>"));
        assert_eq!(ok.attachment_count, None);

        let failed: ApiResponse = serde_json::from_str(
            r#"{"success":false,"message":"Failed to send email","error":"SMTP error: refused"}"#,
        )
        .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("SMTP error: refused"));
    }
}
