//! HTTP handlers for the gateway API
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /api/test-connection` | [`test_connection`] |
//! | `POST /api/send-email` | [`send_email`] |
//! | `POST /api/send-email-with-attachments` | [`send_email_with_attachments`] |
//! | `POST /api/send-test-pdf` | [`send_test_pdf`] |
//!
//! Successful sends answer `200` with a [`SendResponse`]; failures go through
//! [`GatewayError`](crate::error::GatewayError) and share its JSON shape.

mod connection;
mod send;

pub use connection::{test_connection, ConnectionResponse};
pub use send::{send_email, send_email_with_attachments, send_test_pdf, SendResponse};
