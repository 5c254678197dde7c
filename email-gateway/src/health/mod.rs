//! Health check endpoints
//!
//! - `GET /health`: component report (transport backend, staging directory)
//! - `GET /health/live`: plain liveness probe
//!
//! The SMTP relay itself is not contacted here; `GET /api/test-connection`
//! does that on demand.
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use email_gateway::health::{health_check, liveness};
//! use email_gateway::state::AppState;
//!
//! # fn example(state: AppState) {
//! let app: Router = Router::new()
//!     .route("/health", get(health_check))
//!     .route("/health/live", get(liveness))
//!     .with_state(state);
//! # }
//! ```

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::config::TransportBackend;
use crate::state::AppState;

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is healthy and ready
    Healthy,
    /// Service is degraded but operational
    Degraded,
    /// Service is unhealthy
    Unhealthy,
}

/// Individual component health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component status
    pub status: HealthStatus,
    /// Optional message with details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    /// Healthy component with a note
    #[must_use]
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: Some(message.into()),
        }
    }

    /// Degraded component
    #[must_use]
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Degraded,
            message: Some(message.into()),
        }
    }

    /// Unhealthy component
    #[must_use]
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Worst status across components
    pub status: HealthStatus,
    /// Gateway version
    pub version: String,
    /// Unix epoch seconds
    pub timestamp: u64,
    /// Individual component healths
    pub components: BTreeMap<String, ComponentHealth>,
}

impl HealthCheckResponse {
    /// Empty, healthy report
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            version: version.into(),
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            components: BTreeMap::new(),
        }
    }

    /// Add component health
    pub fn add_component(&mut self, name: impl Into<String>, health: ComponentHealth) {
        self.components.insert(name.into(), health);
        self.recalculate_status();
    }

    fn recalculate_status(&mut self) {
        let worst = |status| self.components.values().any(|c| c.status == status);
        self.status = if worst(HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if worst(HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
    }

    /// HTTP status for the overall health
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for HealthCheckResponse {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

/// Liveness probe handler
#[allow(clippy::unused_async)]
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Component report
///
/// The staging directory is created if missing; failing to do so makes the
/// gateway unhealthy since no multipart request could succeed.
pub async fn health_check(State(state): State<AppState>) -> HealthCheckResponse {
    let config = state.config();
    let mut response = HealthCheckResponse::new(env!("CARGO_PKG_VERSION"));

    let transport = match config.smtp.backend {
        TransportBackend::Smtp => {
            ComponentHealth::healthy(format!("smtp {}:{}", config.smtp.host, config.smtp.port))
        }
        TransportBackend::Console => ComponentHealth::degraded("console backend, mail is not delivered"),
    };
    response.add_component("transport", transport);

    let uploads = &config.server.uploads_dir;
    let staging = match tokio::fs::create_dir_all(uploads).await {
        Ok(()) => ComponentHealth::healthy(uploads.display().to_string()),
        Err(e) => ComponentHealth::unhealthy(format!("{}: {e}", uploads.display())),
    };
    response.add_component("staging", staging);

    response
}
