//! Form client for the email gateway
//!
//! Collects message fields and files, picks the send mode and talks to the
//! gateway HTTP API. Validation and delivery happen server-side; this crate
//! only shapes requests and presents the outcome.
//!
//! - [`EmailForm`] / [`SendMode`]: what to send and how
//! - [`ApiClient`]: HTTP calls against the gateway
//! - [`Notice`]: the transient status line shown after a request

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

pub mod client;
pub mod form;
pub mod notice;

pub use client::{ApiClient, ApiResponse, ClientError, ConnectionStatus, DEFAULT_SERVER_URL};
pub use form::{EmailForm, SendMode};
pub use notice::{Notice, NoticeKind, NOTICE_TIMEOUT};
