//! Form model and send-mode selection

use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use serde_json::{json, Map, Value};

use crate::client::ClientError;

/// Form field the gateway reads uploaded files from
pub const ATTACHMENTS_FIELD: &str = "attachments";

/// How a form is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    /// `multipart/form-data` to `/api/send-email-with-attachments`
    WithAttachments,
    /// JSON to `/api/send-email`
    FieldsOnly,
}

impl SendMode {
    /// Gateway path for this mode
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::WithAttachments => "/api/send-email-with-attachments",
            Self::FieldsOnly => "/api/send-email",
        }
    }
}

/// Message fields as entered by the user
///
/// Blank fields are omitted from the request and left for the gateway to
/// reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailForm {
    /// Primary recipients
    pub to: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text: String,
    /// HTML body
    pub html: String,
    /// Carbon-copy recipients
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients
    pub bcc: Vec<String>,
    /// Files selected for upload
    pub files: Vec<PathBuf>,
    /// Send selected files along with the message
    pub auto_attach: bool,
}

impl Default for EmailForm {
    fn default() -> Self {
        Self {
            to: Vec::new(),
            subject: String::new(),
            text: String::new(),
            html: String::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            files: Vec::new(),
            auto_attach: true,
        }
    }
}

impl EmailForm {
    /// Multipart when files are selected and auto-attach is on, JSON otherwise
    #[must_use]
    pub fn mode(&self) -> SendMode {
        if self.auto_attach && !self.files.is_empty() {
            SendMode::WithAttachments
        } else {
            SendMode::FieldsOnly
        }
    }

    /// Text fields with blank values dropped, in request order
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        [
            ("to", self.to.join(", ")),
            ("subject", self.subject.clone()),
            ("text", self.text.clone()),
            ("html", self.html.clone()),
            ("cc", self.cc.join(", ")),
            ("bcc", self.bcc.join(", ")),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect()
    }

    /// Body for the JSON endpoint
    #[must_use]
    pub fn json_body(&self) -> Value {
        let map: Map<String, Value> = self
            .fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), json!(value)))
            .collect();
        Value::Object(map)
    }

    /// Body for the multipart endpoint, reading every selected file
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::File`] if a selected file cannot be read.
    pub async fn multipart_body(&self) -> Result<Form, ClientError> {
        let mut form = Form::new();
        for (name, value) in self.fields() {
            form = form.text(name, value);
        }

        for path in &self.files {
            let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::File {
                path: path.clone(),
                source,
            })?;
            let file_name = path
                .file_name()
                .map_or_else(|| "attachment".to_string(), |n| n.to_string_lossy().into_owned());
            form = form.part(ATTACHMENTS_FIELD, Part::bytes(bytes).file_name(file_name));
        }

        Ok(form)
    }
}

/// Split a comma-separated address list, dropping blanks
#[must_use]
pub fn split_addresses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect()
}
