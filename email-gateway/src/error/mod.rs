//! Error types and error handling
//!
//! Every failure is turned into the same JSON shape at the request boundary:
//!
//! ```json
//! { "success": false, "message": "Failed to send email", "error": "SMTP error: ..." }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::email::EmailError;

/// Message returned when required send fields are missing
pub const MISSING_FIELDS_MESSAGE: &str =
    "Missing required fields: to, subject, and either text or html";

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required field missing or unusable (400)
    #[error("{message}")]
    Validation {
        /// Caller-facing summary
        message: String,
        /// Which field failed, when known
        detail: Option<String>,
    },

    /// Attachment count or size exceeded (400)
    #[error("{message}")]
    PayloadTooLarge {
        /// Caller-facing summary
        message: String,
        /// Offending file or count
        detail: String,
    },

    /// SMTP handshake or delivery failure (500)
    #[error("{message}: {detail}")]
    Transport {
        /// Caller-facing summary
        message: String,
        /// Underlying cause
        detail: String,
    },

    /// Body could not be parsed (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Anything else that went wrong on our side (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Uniform failure body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `false`
    pub success: bool,
    /// Human readable summary
    pub message: String,
    /// Underlying cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GatewayError {
    /// Missing `to`, `subject` or body
    #[must_use]
    pub fn missing_fields(detail: Option<String>) -> Self {
        Self::Validation {
            message: MISSING_FIELDS_MESSAGE.to_string(),
            detail,
        }
    }

    /// Request body over the configured cap
    #[must_use]
    pub fn body_too_large(detail: impl Into<String>) -> Self {
        Self::PayloadTooLarge {
            message: "Request body too large".to_string(),
            detail: detail.into(),
        }
    }

    /// Map a failed send, keeping caller mistakes as 400s
    ///
    /// `context` becomes the message of a transport failure, e.g. `Failed to send email`.
    #[must_use]
    pub fn from_send_failure(context: &str, err: EmailError) -> Self {
        match err {
            EmailError::InvalidAddress(address) => Self::Validation {
                message: format!("Invalid email address: {address}"),
                detail: Some(EmailError::InvalidAddress(address).to_string()),
            },
            err if err.is_validation() => Self::missing_fields(Some(err.to_string())),
            err => Self::Transport {
                message: context.to_string(),
                detail: err.to_string(),
            },
        }
    }

    /// HTTP status for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::PayloadTooLarge { .. } | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Transport { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorBody {
        let (message, error) = match self {
            Self::Validation { message, detail } => (message, detail),
            Self::PayloadTooLarge { message, detail } | Self::Transport { message, detail } => {
                (message, Some(detail))
            }
            Self::BadRequest(detail) => ("Invalid request".to_string(), Some(detail)),
            Self::Internal(detail) => ("Internal server error".to_string(), Some(detail)),
        };

        ErrorBody {
            success: false,
            message,
            error,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            debug!(error = %self, "Request rejected");
        }

        (status, Json(self.into_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(err: GatewayError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_is_400() {
        let (status, body) = body_json(GatewayError::missing_fields(None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], MISSING_FIELDS_MESSAGE);
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_payload_too_large_is_400() {
        let err = GatewayError::PayloadTooLarge {
            message: "File too large. Maximum size is 10MB.".into(),
            detail: "big.iso".into(),
        };
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "File too large. Maximum size is 10MB.");
        assert_eq!(body["error"], "big.iso");
    }

    #[tokio::test]
    async fn test_transport_is_500_with_detail() {
        let err = GatewayError::from_send_failure(
            "Failed to send email",
            EmailError::smtp("connection refused"),
        );
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to send email");
        assert_eq!(body["error"], "SMTP error: connection refused");
    }

    #[test]
    fn test_send_failure_classification() {
        assert!(matches!(
            GatewayError::from_send_failure("x", EmailError::NoContent),
            GatewayError::Validation { .. }
        ));
        assert!(matches!(
            GatewayError::from_send_failure("x", EmailError::InvalidAddress("bad".into())),
            GatewayError::Validation { message, .. } if message == "Invalid email address: bad"
        ));
        assert!(matches!(
            GatewayError::from_send_failure("x", EmailError::NoSender),
            GatewayError::Transport { .. }
        ));
    }
}
