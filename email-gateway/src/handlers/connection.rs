//! SMTP connectivity probe

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::AppState;

/// Body of `GET /api/test-connection`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionResponse {
    /// Whether the relay accepted the handshake
    pub success: bool,
    /// Human readable outcome
    pub message: String,
}

/// Verify the SMTP relay is reachable
///
/// Always answers `200`; the outcome is carried in `success`.
pub async fn test_connection(State(state): State<AppState>) -> Json<ConnectionResponse> {
    let success = state.transport().verify_connection().await;
    info!(success, "SMTP connection probed");

    let message = if success {
        "SMTP connection verified"
    } else {
        "SMTP connection failed"
    };

    Json(ConnectionResponse {
        success,
        message: message.to_string(),
    })
}
