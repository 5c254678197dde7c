//! email-gateway server

#![forbid(unsafe_code)]

use email_gateway::{config::GatewayConfig, observability, server, state::AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init()?;

    let config = GatewayConfig::load_for_service("email-gateway")?;
    info!(
        smtp_host = %config.smtp.host,
        smtp_port = config.smtp.port,
        secure = config.smtp.secure,
        backend = ?config.smtp.backend,
        "Configuration loaded"
    );

    let state = AppState::from_config(config)?;
    server::serve(state).await
}
