// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator-facing output.
//!
//! The dispatcher and poller describe what happened as [`Notice`]s; a
//! [`View`] decides how to show them. [`TerminalView`] prints one line per
//! notice.

use std::fmt;
use std::io::Write;

use crate::address::{OutputAddress, RioAddress, ZoneAddress};
use crate::channel::ConnectionState;
use crate::poll::AlarmRecord;
use crate::protocol::{AreaStateKind, SiaMessage, ZoneBitmapKind, ZoneCondition};
use crate::session::SessionId;
use crate::status::{CommandStatus, Tone};

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Connection(ConnectionState),
    Status(CommandStatus),
    Sia(SiaMessage),
    Alarm(AlarmRecord),
    CommandFailed { command: String, reply: String },
    Help(String),
    Areas { kind: AreaStateKind, states: Vec<u8> },
    Area { kind: AreaStateKind, state: u8 },
    Zone { zone: ZoneAddress, condition: ZoneCondition },
    ZoneOmit { zone: ZoneAddress, omitted: bool },
    ZoneBitmap { kind: ZoneBitmapKind, rio: Option<RioAddress>, zones: Vec<ZoneAddress> },
    Outputs { rio: Option<RioAddress>, on: Vec<OutputAddress> },
    PanelOnline(bool),
    LoginRequired { user: Option<String> },
    LoginAccepted,
    SessionChanged { local: SessionId, remote: SessionId },
    Unknown { type_id: i64, raw: String },
    /// The console is waiting for the operator to type something specific.
    Prompt(String),
    Error(String),
}

pub trait View: Send {
    fn show(&mut self, notice: Notice);
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn write_sia(f: &mut fmt::Formatter<'_>, sia: &SiaMessage) -> fmt::Result {
    write!(
        f,
        "{} {} {} | {}",
        or_dash(&sia.account_id),
        or_dash(&sia.event_code),
        or_dash(&sia.event_name),
        or_dash(&sia.event_desc),
    )?;
    if let Some(kind) = &sia.address_type {
        write!(f, " | {kind} {}", or_dash(&sia.address_number))?;
    }
    if let Some(area) = &sia.area_id {
        write!(f, " | area {area}")?;
    }
    if let Some(ascii) = sia.ascii.as_deref().filter(|s| !s.is_empty() && *s != "null") {
        write!(f, " | {ascii}")?;
    }
    Ok(())
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "none".to_owned();
    }
    items.iter().map(T::to_string).collect::<Vec<_>>().join(" ")
}

fn scope(rio: &Option<RioAddress>) -> String {
    rio.map(|rio| format!(" rio {rio}")).unwrap_or_default()
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(state) => write!(f, "-- connection {}", state.as_str()),
            Self::Status(status) => write!(f, "-- {}", status.text),
            Self::Sia(sia) => {
                write!(f, "{} {} ", or_dash(&sia.date), or_dash(&sia.time))?;
                write_sia(f, sia)
            }
            Self::Alarm(record) => {
                write!(f, "#{} {} ", record.id, or_dash(&record.timeindex))?;
                write_sia(f, &record.sia)
            }
            Self::CommandFailed { command, reply } => write!(f, "error: {command}: {reply}"),
            Self::Help(text) => f.write_str(text.trim_end()),
            Self::Areas { kind, states } => {
                write!(f, "areas {}:", kind.keyword().to_lowercase())?;
                for (i, state) in states.iter().enumerate() {
                    write!(f, " {}={}", i + 1, kind.describe(*state))?;
                }
                Ok(())
            }
            Self::Area { kind, state } => {
                write!(f, "area {}: {}", kind.keyword().to_lowercase(), kind.describe(*state))
            }
            Self::Zone { zone, condition } => write!(f, "zone {zone}: {}", condition.as_str()),
            Self::ZoneOmit { zone, omitted } => {
                write!(f, "zone {zone}: {}", if *omitted { "omitted" } else { "not omitted" })
            }
            Self::ZoneBitmap { kind, rio, zones } => write!(
                f,
                "zones {}{}: {}",
                kind.set_label(),
                scope(rio),
                join(zones)
            ),
            Self::Outputs { rio, on } => write!(f, "outputs on{}: {}", scope(rio), join(on)),
            Self::PanelOnline(true) => f.write_str("-- panel online"),
            Self::PanelOnline(false) => f.write_str("-- panel offline"),
            Self::LoginRequired { user: Some(user) } => write!(f, "login required ({user})"),
            Self::LoginRequired { user: None } => f.write_str("login required"),
            Self::LoginAccepted => f.write_str("login accepted"),
            Self::SessionChanged { local, remote } => write!(
                f,
                "server session changed ({local} -> {remote}), restarting console"
            ),
            Self::Unknown { type_id, raw } => write!(f, "unhandled typeId {type_id}: {raw}"),
            Self::Prompt(label) => write!(f, "{label}:"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Line-per-notice renderer.
///
/// Idle and offline status updates are suppressed; the connection notices
/// already say the same thing.
pub struct TerminalView<W> {
    out: W,
}

impl TerminalView<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: std::io::stdout() }
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> View for TerminalView<W> {
    fn show(&mut self, notice: Notice) {
        if let Notice::Status(CommandStatus { tone: Tone::Idle | Tone::Offline, .. }) = notice {
            return;
        }
        if let Err(e) = writeln!(self.out, "{notice}").and_then(|()| self.out.flush()) {
            tracing::debug!(err = %e, "terminal write failed");
        }
    }
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
