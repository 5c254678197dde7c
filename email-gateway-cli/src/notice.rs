//! Transient status line shown after a request

use std::time::Duration;

use console::{style, Emoji, Term};

use crate::client::{ApiResponse, ClientError, ConnectionStatus};

static SUCCESS: Emoji = Emoji("✓ ", "√ ");
static FAILURE: Emoji = Emoji("✗ ", "x ");

/// How long a notice stays on screen
pub const NOTICE_TIMEOUT: Duration = Duration::from_secs(5);

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The request did what was asked
    Success,
    /// The gateway or the network refused
    Error,
}

/// Outcome message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub kind: NoticeKind,
    /// Text shown
    pub text: String,
}

impl Notice {
    /// Successful outcome
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    /// Failed outcome
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    /// Notice for a gateway answer
    ///
    /// Successes carry the message id; failures carry the detail.
    #[must_use]
    pub fn from_response(response: &ApiResponse) -> Self {
        if response.success {
            match &response.message_id {
                Some(id) => Self::success(format!("{} ({id})", response.message)),
                None => Self::success(response.message.clone()),
            }
        } else {
            match &response.error {
                Some(detail) => Self::error(format!("{}: {detail}", response.message)),
                None => Self::error(response.message.clone()),
            }
        }
    }

    /// Notice for a request that never got a gateway answer
    #[must_use]
    pub fn from_error(err: &ClientError) -> Self {
        Self::error(err.to_string())
    }

    /// Notice for a connection probe
    #[must_use]
    pub fn from_connection(result: &Result<ConnectionStatus, ClientError>) -> Self {
        match result {
            Ok(ConnectionStatus::Connected) => Self::success("SMTP Connected"),
            Ok(ConnectionStatus::Failed) => Self::error("SMTP Failed"),
            Err(err) => Self::error(format!("Connection Error: {err}")),
        }
    }

    /// Whether this notice reports success
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.kind, NoticeKind::Success)
    }

    /// Styled single-line rendering
    #[must_use]
    pub fn render(&self) -> String {
        match self.kind {
            NoticeKind::Success => format!("{SUCCESS}{}", style(&self.text).green()),
            NoticeKind::Error => format!("{FAILURE}{}", style(&self.text).red()),
        }
    }

    /// Print the notice and keep it
    pub fn print(&self) {
        println!("{}", self.render());
    }

    /// Print the notice, then erase it after `timeout`
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be written.
    pub async fn show_transient(&self, term: &Term, timeout: Duration) -> std::io::Result<()> {
        term.write_line(&self.render())?;
        tokio::time::sleep(timeout).await;
        term.clear_last_lines(1)
    }
}
