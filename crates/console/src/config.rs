// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::channel::socket_url;
use crate::session::Credentials;

/// Terminal operator console for an openGalaxy SIA receiver.
#[derive(Debug, Parser)]
#[command(name = "galaxy-console", version, about)]
pub struct Config {
    /// Address of the openGalaxy web server (the page the console lives on).
    #[arg(long, env = "GALAXY_URL", default_value = "http://127.0.0.1")]
    pub url: String,

    /// Username sent when the server asks for a login.
    #[arg(long, env = "GALAXY_USERNAME")]
    pub username: Option<String>,

    /// Password sent when the server asks for a login.
    #[arg(long, env = "GALAXY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// PEM bundle of the CA that signed the server certificate.
    #[arg(long, env = "GALAXY_CA_CERT")]
    pub ca_cert: Option<PathBuf>,

    /// PEM client certificate for servers that require one.
    #[arg(long, env = "GALAXY_CLIENT_CERT")]
    pub client_cert: Option<PathBuf>,

    /// PEM private key for --client-cert.
    #[arg(long, env = "GALAXY_CLIENT_KEY")]
    pub client_key: Option<PathBuf>,

    /// Log format (json or text).
    #[arg(long, env = "GALAXY_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "GALAXY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,

    // -- Duration overrides (skip from CLI; set in Config::test()) --------
    #[clap(skip)]
    pub reconnect_ms: Option<u64>,
    #[clap(skip)]
    pub status_reset_ms: Option<u64>,
    #[clap(skip)]
    pub poll_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Interactive command console (default).
    Console,
    /// Follow pending alarms from the web server.
    Alarms,
    /// Change the web interface theme.
    Theme {
        /// Theme name.
        name: String,
    },
}

fn env_duration_ms(var: &str, default: u64) -> Duration {
    let ms = std::env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default);
    Duration::from_millis(ms)
}

macro_rules! duration_field {
    ($method:ident, $field:ident, $env:literal, $default:expr) => {
        pub fn $method(&self) -> Duration {
            match self.$field {
                Some(ms) => Duration::from_millis(ms),
                None => env_duration_ms($env, $default),
            }
        }
    };
}

impl Config {
    /// Validate option combinations.
    pub fn validate(&self) -> anyhow::Result<()> {
        let scheme = self.url.split_once("://").map(|(scheme, _)| scheme);
        if !matches!(scheme, Some("http" | "https")) {
            anyhow::bail!("--url must start with http:// or https://, got {:?}", self.url);
        }

        match (&self.client_cert, &self.client_key) {
            (Some(_), None) => anyhow::bail!("--client-cert requires --client-key"),
            (None, Some(_)) => anyhow::bail!("--client-key requires --client-cert"),
            (Some(_), Some(_)) if self.ca_cert.is_none() => {
                anyhow::bail!("--client-cert requires --ca-cert")
            }
            _ => {}
        }

        if self.password.is_some() && self.username.is_none() {
            anyhow::bail!("--password requires --username");
        }

        if let Some(Command::Theme { name }) = &self.command {
            if name.trim().is_empty() {
                anyhow::bail!("theme name must not be empty");
            }
        }

        match self.log_format.as_str() {
            "json" | "text" => Ok(()),
            other => anyhow::bail!("invalid log format: {other}"),
        }
    }

    /// The selected subcommand, defaulting to the interactive console.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Console)
    }

    pub fn socket_url(&self) -> String {
        socket_url(&self.url)
    }

    /// Stored credentials, if a username was configured.
    pub fn credentials(&self) -> Option<Credentials> {
        let username = self.username.clone()?;
        Some(Credentials { username, password: self.password.clone().unwrap_or_default() })
    }

    duration_field!(reconnect_delay, reconnect_ms, "GALAXY_RECONNECT_MS", 5_000);
    duration_field!(status_reset, status_reset_ms, "GALAXY_STATUS_RESET_MS", 2_000);
    duration_field!(poll_interval, poll_ms, "GALAXY_POLL_MS", 2_000);

    /// Build a minimal `Config` for tests.
    #[doc(hidden)]
    pub fn test(url: &str) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            ca_cert: None,
            client_cert: None,
            client_key: None,
            log_format: "text".into(),
            log_level: "debug".into(),
            command: None,
            reconnect_ms: Some(50),
            status_reset_ms: Some(50),
            poll_ms: Some(20),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
