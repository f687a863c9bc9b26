// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! galaxy-console: terminal operator console for an openGalaxy SIA receiver.

pub mod address;
pub mod app;
pub mod channel;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod poll;
pub mod protocol;
pub mod session;
pub mod state;
pub mod status;
pub mod tls;
pub mod view;
pub mod web;

#[doc(hidden)]
pub mod test_support;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::channel::WsDialer;
use crate::config::{Command, Config};
use crate::view::TerminalView;
use crate::web::WebClient;

/// Initialize tracing on stderr so log lines never interleave with console output.
///
/// Uses `try_init` so it's safe to call multiple times (e.g. from tests).
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init(),
    };
    drop(result);
}

/// Forward stdin lines until EOF or shutdown.
fn spawn_stdin_reader(shutdown: CancellationToken) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(err = %e, "stdin read failed");
                    break;
                }
            }
        }
    });
    rx
}

/// Run the selected subcommand until it finishes or `shutdown` fires.
pub async fn run(config: Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    match config.command() {
        Command::Console => {
            let tls = tls::client_config(
                config.ca_cert.as_deref(),
                config.client_cert.as_deref(),
                config.client_key.as_deref(),
            )?;
            let url = config.socket_url();
            info!(%url, "galaxy-console starting");
            let dialer = Arc::new(WsDialer::new(url, tls));
            let lines = spawn_stdin_reader(shutdown.clone());
            app::run_console(&config, dialer, lines, TerminalView::stdout, shutdown).await
        }
        Command::Alarms => {
            let client = Arc::new(WebClient::new(&config.url)?);
            info!(url = %config.url, "following alarms");
            app::run_alarms(&config, client, TerminalView::stdout(), shutdown).await
        }
        Command::Theme { name } => {
            WebClient::new(&config.url)?.set_theme(&name).await?;
            println!("theme set to {name}");
            Ok(())
        }
    }
}
