//! email-gateway: HTTP front door for outbound SMTP mail
//!
//! Accepts send requests as JSON or multipart forms, stages uploaded
//! attachments to a scratch directory, hands a fully assembled envelope to an
//! SMTP transport and reports the provider message id back to the caller.
//!
//! Components, leaf-first:
//! - [`email`]: envelope model and the [`email::MailTransport`] adapter backed by `lettre`
//! - [`staging`]: scoped temporary storage for uploaded attachments
//! - [`extractors`] and [`handlers`]: request parsing, validation and the HTTP endpoints
//! - [`server`]: router assembly and graceful serving
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use email_gateway::{config::GatewayConfig, observability, server, state::AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     observability::init()?;
//!
//!     let config = GatewayConfig::load_for_service("email-gateway")?;
//!     let state = AppState::from_config(config)?;
//!
//!     server::serve(state).await
//! }
//! ```

#![allow(clippy::missing_errors_doc)] // TODO: Add error docs to the handler-facing APIs

pub mod config;
pub mod email;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod health;
pub mod observability;
pub mod server;
pub mod staging;
pub mod state;
pub mod testing;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! ```rust
    //! use email_gateway::prelude::*;
    //! ```

    pub use crate::config::GatewayConfig;
    pub use crate::email::{
        AttachmentRef, AttachmentSource, EmailError, MailEnvelope, MailTransport, SendResult,
        SmtpTransport,
    };
    pub use crate::error::GatewayError;
    pub use crate::staging::{StagedAttachments, StagedFile};
    pub use crate::state::AppState;
}
