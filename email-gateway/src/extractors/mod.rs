//! Request extractors
//!
//! - [`ApiJson`]: JSON bodies with uniform error responses
//! - [`AttachmentForm`]: multipart forms with streamed attachment staging
//! - [`SendEmailRequest`] / [`TestPdfRequest`]: payloads and their validation

mod attachments;
mod json;
mod request;

pub use attachments::{AttachmentForm, ATTACHMENTS_FIELD};
pub use json::ApiJson;
pub use request::{format_validation_errors, split_addresses, SendEmailRequest, TestPdfRequest};
