//! Router assembly and serving
//!
//! ```rust,no_run
//! use email_gateway::{config::GatewayConfig, server, state::AppState};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let state = AppState::from_config(GatewayConfig::default())?;
//! server::serve(state).await
//! # }
//! ```

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::handlers;
use crate::health;
use crate::state::AppState;

/// Build the gateway router
///
/// Routes:
/// - `GET /api/test-connection`
/// - `POST /api/send-email`
/// - `POST /api/send-email-with-attachments`
/// - `POST /api/send-test-pdf`
/// - `GET /health`, `GET /health/live`
///
/// Request bodies are capped at room for the maximum number of maximum-size
/// attachments. The cap is applied by the extractors, so an oversized body is
/// reported in the usual JSON error shape; per-file limits are enforced by the
/// multipart extractor.
pub fn router(state: AppState) -> Router {
    let config = state.config();
    let body_limit = config.attachments.body_limit();
    let timeout = config.server.request_timeout();
    let cors_enabled = config.server.cors_enabled;

    let router = Router::new()
        .route("/api/test-connection", get(handlers::test_connection))
        .route("/api/send-email", post(handlers::send_email))
        .route(
            "/api/send-email-with-attachments",
            post(handlers::send_email_with_attachments),
        )
        .route("/api/send-test-pdf", post(handlers::send_test_pdf))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Bind the configured address and serve until ctrl-c or SIGTERM
///
/// When `[server] verify_on_startup` is set, the SMTP relay is probed in the
/// background; a failure is logged and the gateway keeps serving.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let address = state.config().server.bind_address();

    if state.config().server.verify_on_startup {
        let probe = state.clone();
        tokio::spawn(async move {
            if probe.transport().verify_connection().await {
                info!("SMTP server is ready to take our messages");
            } else {
                warn!("SMTP connection could not be verified; sends may fail");
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(address = %address, "Email gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Email gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::email::MockMailTransport;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(transport: MockMailTransport) -> Router {
        router(AppState::new(GatewayConfig::default(), Arc::new(transport)))
    }

    #[tokio::test]
    async fn test_routes_exist() {
        let mut transport = MockMailTransport::new();
        transport.expect_verify_connection().returning(|| true);
        let app = app(transport);

        let response = app
            .clone()
            .oneshot(Request::get("/api/test-connection").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_send_email_requires_post() {
        let response = app(MockMailTransport::new())
            .oneshot(Request::get("/api/send-email").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_shape() {
        let response = app(MockMailTransport::new())
            .oneshot(
                Request::post("/api/send-email")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{oops"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Invalid request");
    }

    #[tokio::test]
    async fn test_cors_preflight_allowed() {
        let response = app(MockMailTransport::new())
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/send-email")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
