//! `form` command: interactive session

use std::path::PathBuf;

use anyhow::Result;
use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use email_gateway_cli_lib::{form::split_addresses, ApiClient, EmailForm, Notice, NOTICE_TIMEOUT};

use super::{send_notice, with_spinner};

const ACTIONS: [&str; 4] = [
    "Compose email",
    "Send test PDF",
    "Test SMTP connection",
    "Quit",
];

/// Prompt for messages and send them until the user quits
pub struct FormCommand;

impl FormCommand {
    /// Execute the command, returning whether the last request succeeded
    pub async fn execute(client: &ApiClient) -> Result<bool> {
        let theme = ColorfulTheme::default();
        let term = Term::stdout();
        let mut last_ok = true;

        println!(
            "{} {}",
            style("Email gateway").bold(),
            style(client.base_url()).cyan()
        );

        loop {
            let action = Select::with_theme(&theme)
                .with_prompt("What would you like to do?")
                .items(&ACTIONS)
                .default(0)
                .interact()?;

            let notice = match action {
                0 => {
                    let form = prompt_form(&theme)?;
                    let result = with_spinner("Sending email...", client.send(&form)).await?;
                    send_notice(&result)
                }
                1 => {
                    let to = prompt_addresses(&theme, "To", false)?;
                    let request = client.send_test_pdf(&to, None, None);
                    let result = with_spinner("Sending test PDF...", request).await?;
                    send_notice(&result)
                }
                2 => {
                    let result =
                        with_spinner("Testing SMTP connection...", client.test_connection()).await?;
                    Notice::from_connection(&result)
                }
                _ => break,
            };

            last_ok = notice.is_success();
            notice.show_transient(&term, NOTICE_TIMEOUT).await?;
        }

        Ok(last_ok)
    }
}

fn prompt_form(theme: &ColorfulTheme) -> Result<EmailForm> {
    let to = prompt_addresses(theme, "To", false)?;
    let subject = prompt_text(theme, "Subject")?;
    let text = prompt_text(theme, "Message (plain text)")?;
    let html = prompt_text(theme, "Message (HTML, optional)")?;
    let cc = prompt_addresses(theme, "Cc (optional)", true)?;
    let bcc = prompt_addresses(theme, "Bcc (optional)", true)?;

    let files: Vec<PathBuf> = prompt_text(theme, "Files to attach (comma separated, optional)")?
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect();

    let auto_attach = if files.is_empty() {
        true
    } else {
        Confirm::with_theme(theme)
            .with_prompt("Attach the selected files?")
            .default(true)
            .interact()?
    };

    Ok(EmailForm {
        to,
        subject,
        text,
        html,
        cc,
        bcc,
        files,
        auto_attach,
    })
}

fn prompt_text(theme: &ColorfulTheme, prompt: &str) -> Result<String> {
    let value = Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(value)
}

fn prompt_addresses(theme: &ColorfulTheme, prompt: &str, optional: bool) -> Result<Vec<String>> {
    let value = Input::<String>::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty(optional)
        .interact_text()?;
    Ok(split_addresses(&value))
}
