//! `send-test-pdf` command

use anyhow::Result;
use clap::Args;
use email_gateway_cli_lib::ApiClient;

use super::{send_notice, with_spinner};

/// Send the gateway's fixed test PDF
#[derive(Debug, Args)]
pub struct SendTestPdfCommand {
    /// Recipient addresses (repeat or separate with commas)
    #[arg(long, required = true, value_delimiter = ',')]
    to: Vec<String>,

    /// Replace the canned subject
    #[arg(short, long)]
    subject: Option<String>,

    /// Replace the canned plain text body
    #[arg(short, long)]
    text: Option<String>,
}

impl SendTestPdfCommand {
    /// Execute the command, returning whether the gateway accepted the message
    pub async fn execute(&self, client: &ApiClient) -> Result<bool> {
        let request = client.send_test_pdf(&self.to, self.subject.as_deref(), self.text.as_deref());
        let result = with_spinner("Sending test PDF...", request).await?;
        let notice = send_notice(&result);
        notice.print();
        Ok(notice.is_success())
    }
}
