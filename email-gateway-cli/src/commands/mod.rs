//! CLI command implementations

pub mod connection;
pub mod form;
pub mod send;
pub mod test_pdf;

pub use connection::TestConnectionCommand;
pub use form::FormCommand;
pub use send::SendCommand;
pub use test_pdf::SendTestPdfCommand;

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use email_gateway_cli_lib::{ApiResponse, ClientError, Notice};
use indicatif::{ProgressBar, ProgressStyle};

/// Run `request` behind a spinner showing `message`
async fn with_spinner<T: Send>(
    message: &'static str,
    request: impl Future<Output = T> + Send,
) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Failed to set progress style")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message);

    let output = request.await;
    spinner.finish_and_clear();
    Ok(output)
}

/// Notice for a send attempt, whichever way it ended
fn send_notice(result: &Result<ApiResponse, ClientError>) -> Notice {
    match result {
        Ok(response) => Notice::from_response(response),
        Err(err) => Notice::from_error(err),
    }
}
