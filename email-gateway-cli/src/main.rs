//! email-gateway form client

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{FormCommand, SendCommand, SendTestPdfCommand, TestConnectionCommand};
use email_gateway_cli_lib::{ApiClient, DEFAULT_SERVER_URL};

#[derive(Parser)]
#[command(name = "email-gateway-cli")]
#[command(version)]
#[command(about = "Send email through the email gateway", long_about = None)]
struct Cli {
    /// Gateway base URL
    #[arg(long, global = true, env = "EMAIL_GATEWAY_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gateway can reach its SMTP relay
    TestConnection,
    /// Send a message, with attachments when files are given
    Send(SendCommand),
    /// Send the gateway's fixed test PDF
    SendTestPdf(SendTestPdfCommand),
    /// Compose and send messages interactively
    Form,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let client = ApiClient::new(cli.server);

    let ok = match cli.command {
        Commands::TestConnection => TestConnectionCommand::execute(&client).await?,
        Commands::Send(command) => command.execute(&client).await?,
        Commands::SendTestPdf(command) => command.execute(&client).await?,
        Commands::Form => FormCommand::execute(&client).await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
