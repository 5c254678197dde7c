//! Email template trait for Askama integration

use askama::Template;

use super::EmailError;

/// Trait for email templates
///
/// Implementors render an HTML and a plain text version of the same message.
pub trait EmailTemplate {
    /// Render the email template
    ///
    /// Returns a tuple of `(html, text)` where either can be `None`.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::TemplateError` if the template fails to render
    fn render_email(&self) -> Result<(Option<String>, Option<String>), EmailError>;
}

#[derive(Template)]
#[template(path = "test_attachment.html")]
struct TestAttachmentHtml<'a> {
    file_name: &'a str,
}

#[derive(Template)]
#[template(path = "test_attachment.txt")]
struct TestAttachmentText<'a> {
    file_name: &'a str,
}

/// Message confirming that a file arrived as an attachment
#[derive(Debug, Clone)]
pub struct TestAttachmentEmail {
    file_name: String,
}

impl TestAttachmentEmail {
    /// Message for the given attachment filename
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Subject line naming the attachment
    #[must_use]
    pub fn subject(&self) -> String {
        format!("📎 Test Email with Attachment - {}", self.file_name)
    }
}

impl EmailTemplate for TestAttachmentEmail {
    fn render_email(&self) -> Result<(Option<String>, Option<String>), EmailError> {
        let html = TestAttachmentHtml {
            file_name: &self.file_name,
        }
        .render()?;
        let text = TestAttachmentText {
            file_name: &self.file_name,
        }
        .render()?;
        Ok((Some(html), Some(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_both_versions() {
        let (html, text) = TestAttachmentEmail::new("invoice.pdf").render_email().unwrap();

        let html = html.unwrap();
        assert!(html.contains("<strong>invoice.pdf</strong>"));
        assert!(html.contains("Attachment Test Results"));

        let text = text.unwrap();
        assert!(text.contains("This is a test email with an attached file: invoice.pdf"));
    }

    #[test]
    fn test_html_escapes_file_name() {
        let (html, _) = TestAttachmentEmail::new("<script>.pdf").render_email().unwrap();
        assert!(!html.unwrap().contains("<script>"));
    }
}
