//! `send` command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;
use email_gateway_cli_lib::{ApiClient, EmailForm, SendMode};

use super::{send_notice, with_spinner};

/// Send a message, with attachments when files are given
#[derive(Debug, Args)]
pub struct SendCommand {
    /// Recipient addresses (repeat or separate with commas)
    #[arg(long, required = true, value_delimiter = ',')]
    to: Vec<String>,

    /// Subject line
    #[arg(short, long)]
    subject: String,

    /// Plain text body
    #[arg(short, long, default_value = "")]
    text: String,

    /// HTML body
    #[arg(long, default_value = "")]
    html: String,

    /// Carbon-copy addresses
    #[arg(long, value_delimiter = ',')]
    cc: Vec<String>,

    /// Blind carbon-copy addresses
    #[arg(long, value_delimiter = ',')]
    bcc: Vec<String>,

    /// File to attach (repeatable)
    #[arg(short, long = "attach", value_name = "FILE")]
    attachments: Vec<PathBuf>,

    /// Send as plain JSON even when files are given
    #[arg(long)]
    no_auto_attach: bool,
}

impl SendCommand {
    /// Form described by the arguments
    #[must_use]
    pub fn form(&self) -> EmailForm {
        EmailForm {
            to: self.to.clone(),
            subject: self.subject.clone(),
            text: self.text.clone(),
            html: self.html.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            files: self.attachments.clone(),
            auto_attach: !self.no_auto_attach,
        }
    }

    /// Execute the command, returning whether the gateway accepted the message
    pub async fn execute(&self, client: &ApiClient) -> Result<bool> {
        let form = self.form();
        if form.mode() == SendMode::WithAttachments {
            println!(
                "{} {} file(s)",
                style("Attaching").cyan().bold(),
                form.files.len()
            );
        }

        let result = with_spinner("Sending email...", client.send(&form)).await?;
        let notice = send_notice(&result);
        notice.print();
        Ok(notice.is_success())
    }
}
