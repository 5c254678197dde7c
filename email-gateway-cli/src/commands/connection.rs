//! `test-connection` command

use anyhow::Result;
use email_gateway_cli_lib::{ApiClient, Notice};

use super::with_spinner;

/// Ask the gateway to verify its SMTP relay
pub struct TestConnectionCommand;

impl TestConnectionCommand {
    /// Execute the command, returning whether the relay is reachable
    pub async fn execute(client: &ApiClient) -> Result<bool> {
        let result = with_spinner("Testing SMTP connection...", client.test_connection()).await?;
        let notice = Notice::from_connection(&result);
        notice.print();
        Ok(notice.is_success())
    }
}
