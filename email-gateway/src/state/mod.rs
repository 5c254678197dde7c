//! Application state shared by every handler

use std::sync::Arc;

use crate::config::{GatewayConfig, TransportBackend};
use crate::email::{ConsoleTransport, MailTransport, SmtpTransport};

/// Application state for the gateway
///
/// Holds the configuration and the single long-lived transport. Cloning is
/// cheap; both live behind `Arc`.
///
/// # Example
///
/// ```rust,no_run
/// use email_gateway::{config::GatewayConfig, state::AppState};
///
/// # fn example() -> anyhow::Result<()> {
/// let state = AppState::from_config(GatewayConfig::load_for_service("email-gateway")?)?;
///
/// let app: axum::Router = axum::Router::new()
///     .route("/", axum::routing::get(|| async { "Hello!" }))
///     .with_state(state);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AppState {
    config: Arc<GatewayConfig>,
    transport: Arc<dyn MailTransport>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State around an existing transport
    #[must_use]
    pub fn new(config: GatewayConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Build the transport selected by `[smtp] backend`
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport cannot be constructed.
    pub fn from_config(config: GatewayConfig) -> anyhow::Result<Self> {
        let transport: Arc<dyn MailTransport> = match config.smtp.backend {
            TransportBackend::Smtp => Arc::new(SmtpTransport::new(&config.smtp)?),
            TransportBackend::Console => {
                let console = ConsoleTransport::new();
                Arc::new(match config.smtp.sender() {
                    Some(sender) => console.with_sender(sender),
                    None => console,
                })
            }
        };

        Ok(Self::new(config, transport))
    }

    /// Get the application configuration
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get the shared mail transport
    #[must_use]
    pub fn transport(&self) -> &dyn MailTransport {
        self.transport.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_backend_from_config() {
        let mut config = GatewayConfig::default();
        config.smtp.backend = TransportBackend::Console;

        let state = AppState::from_config(config).unwrap();
        assert!(state.transport().verify_connection().await);
        assert_eq!(state.config().server.port, 3000);
    }

    #[tokio::test]
    async fn test_smtp_backend_from_config() {
        let state = AppState::from_config(GatewayConfig::default());
        assert!(state.is_ok());
    }
}
