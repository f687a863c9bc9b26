// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The console shell: wires operator input, the command channel and the
//! dispatcher together, and rebuilds everything when the server's session
//! changes underneath us.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::channel::{CommandChannel, ConnectionState, Dialer};
use crate::command::{Directive, DIRECTIVE_HELP};
use crate::config::Config;
use crate::dispatch::{Dispatcher, Flow};
use crate::poll::{AlarmPoller, AlarmSource};
use crate::session::Credentials;
use crate::status::{CommandStatus, StatusIndicator};
use crate::view::{Notice, View};

/// Why a console instance stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Quit,
    Reload,
}

/// What the next operator line means.
enum Input {
    Command,
    Username,
    Password { username: String },
}

/// One console instance: a channel, a dispatcher and everything they share.
///
/// Dropping it closes the socket and stops the retry task.
pub struct Console<V> {
    channel: CommandChannel,
    inbound: mpsc::Receiver<String>,
    dispatcher: Dispatcher<V>,
    status: watch::Receiver<CommandStatus>,
    connection: watch::Receiver<ConnectionState>,
    credentials: Option<Credentials>,
    /// Stored credentials are offered once per login request streak.
    auto_login_spent: bool,
    input: Input,
}

impl<V: View> Console<V> {
    pub fn start(
        config: &Config,
        dialer: Arc<dyn Dialer>,
        view: V,
        cancel: &CancellationToken,
    ) -> Self {
        let status = StatusIndicator::new(config.status_reset());
        let (channel, inbound) = CommandChannel::connect(
            dialer,
            status.clone(),
            config.reconnect_delay(),
            cancel.clone(),
        );
        Self {
            connection: channel.subscribe_state(),
            status: status.subscribe(),
            dispatcher: Dispatcher::new(status, view),
            channel,
            inbound,
            credentials: config.credentials(),
            auto_login_spent: false,
            input: Input::Command,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<V> {
        &self.dispatcher
    }

    /// Run until the operator quits, `cancel` fires, or the server's session changes.
    pub async fn run(
        &mut self,
        lines: &mut mpsc::Receiver<String>,
        cancel: &CancellationToken,
    ) -> Outcome {
        let mut lines_open = true;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Outcome::Quit,
                frame = self.inbound.recv() => {
                    let Some(frame) = frame else { return Outcome::Quit };
                    match self.dispatcher.handle_frame(&frame) {
                        Flow::Continue => {
                            if self.dispatcher.gate().is_authorized() {
                                self.auto_login_spent = false;
                            }
                        }
                        Flow::Login => self.login_required(),
                        Flow::Reload => return Outcome::Reload,
                    }
                }
                Ok(()) = self.connection.changed() => {
                    let state = *self.connection.borrow_and_update();
                    self.dispatcher.notify(Notice::Connection(state));
                }
                Ok(()) = self.status.changed() => {
                    let status = self.status.borrow_and_update().clone();
                    self.dispatcher.notify(Notice::Status(status));
                }
                line = lines.recv(), if lines_open => match line {
                    Some(line) => {
                        if let Some(outcome) = self.operator_line(line) {
                            return outcome;
                        }
                    }
                    // Input closed: keep monitoring until cancelled.
                    None => lines_open = false,
                },
            }
        }
    }

    fn operator_line(&mut self, line: String) -> Option<Outcome> {
        match std::mem::replace(&mut self.input, Input::Command) {
            Input::Username => {
                let username = line.trim().to_owned();
                self.input = Input::Password { username };
                self.dispatcher.notify(Notice::Prompt("password".to_owned()));
            }
            Input::Password { username } => {
                self.login(&Credentials { username, password: line });
            }
            Input::Command => match Directive::parse(line.trim()) {
                Ok(Directive::Quit) => return Some(Outcome::Quit),
                Ok(Directive::Help) => {
                    self.dispatcher.notify(Notice::Help(DIRECTIVE_HELP.to_owned()));
                }
                Ok(Directive::Login) => self.prompt_credentials(),
                Ok(Directive::Send { commands, focus }) => {
                    self.dispatcher.set_focus(focus);
                    for command in commands {
                        if let Err(e) = self.channel.send(&command) {
                            self.dispatcher.notify(Notice::Error(format!("{command}: {e}")));
                            break;
                        }
                    }
                }
                Err(e) => self.dispatcher.notify(Notice::Error(format!("{e:#}"))),
            },
        }
        None
    }

    fn login_required(&mut self) {
        match self.credentials.clone() {
            Some(credentials) if !self.auto_login_spent => {
                self.auto_login_spent = true;
                self.login(&credentials);
            }
            _ => self.prompt_credentials(),
        }
    }

    fn prompt_credentials(&mut self) {
        self.input = Input::Username;
        self.dispatcher.notify(Notice::Prompt("username".to_owned()));
    }

    fn login(&mut self, credentials: &Credentials) {
        let Some(frame) = self.dispatcher.gate().login_frame(credentials) else {
            self.dispatcher.notify(Notice::Error(
                "no session yet, wait for the server to ask for a login".to_owned(),
            ));
            return;
        };
        match self.channel.send_login(frame) {
            Ok(()) => info!(user = %credentials.username, "login sent"),
            Err(e) => self.dispatcher.notify(Notice::Error(e.to_string())),
        }
    }
}

/// Run console instances back to back until the operator quits.
///
/// A session change tears the current instance down and starts a fresh one
/// with a new socket and no session id.
pub async fn run_console<V, F>(
    config: &Config,
    dialer: Arc<dyn Dialer>,
    mut lines: mpsc::Receiver<String>,
    mut make_view: F,
    cancel: CancellationToken,
) -> anyhow::Result<()>
where
    V: View,
    F: FnMut() -> V,
{
    loop {
        let mut console = Console::start(config, Arc::clone(&dialer), make_view(), &cancel);
        match console.run(&mut lines, &cancel).await {
            Outcome::Quit => break,
            Outcome::Reload => info!("server session changed, restarting console"),
        }
    }
    cancel.cancel();
    Ok(())
}

/// Show pending alarms from `source` until cancelled.
pub async fn run_alarms<V: View>(
    config: &Config,
    source: Arc<dyn AlarmSource>,
    mut view: V,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel(128);
    let poller = AlarmPoller::new(source, tx);
    tokio::spawn(poller.run(config.poll_interval(), cancel.clone()));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            notice = rx.recv() => match notice {
                Some(notice) => view.show(notice),
                None => break,
            },
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
