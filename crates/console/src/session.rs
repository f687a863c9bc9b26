// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session/auth gate.
//!
//! The server assigns a session id with its first `AUTHORIZATION_REQUIRED`
//! envelope. A later envelope carrying a different id means the server
//! restarted and everything we hold is stale.

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::error::ConsoleError;

/// Server-assigned session identifier. Zero means "not assigned yet".
///
/// The wire form is always hexadecimal: a `typeDesc` given as a JSON number
/// is read as hex digits, so the login frame echoes the same digits back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub const UNSET: Self = Self(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn is_unset(&self) -> bool {
        self.0 == 0
    }

    /// Parse the hex form the server prints into `typeDesc`.
    pub fn parse_hex(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| anyhow::anyhow!("invalid session id {s:?}: {e}"))
    }
}

/// Upper-case hex, matching what the server parses back with base 16.
impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            // The digits are the session as the server would print it, so a
            // numeric 10 is session 0x10 and is echoed back as "10".
            Raw::Number(n) => Self::parse_hex(&n.to_string()).map_err(serde::de::Error::custom),
            Raw::Text(s) => Self::parse_hex(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// What the console should do after an `AUTHORIZATION_REQUIRED` envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Ask the operator for credentials.
    Prompt,
    /// The server restarted; discard this console instance.
    Reload,
}

/// Operator credentials.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Tracks the session id and whether the server last told us we are logged in.
#[derive(Debug, Default)]
pub struct SessionGate {
    id: SessionId,
    authorized: bool,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Informational only; the server enforces authorization.
    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// Handle an `AUTHORIZATION_REQUIRED` envelope carrying `remote`.
    pub fn on_authorization_required(&mut self, remote: SessionId) -> GateAction {
        self.authorized = false;
        if self.id.is_unset() {
            self.id = remote;
            return GateAction::Prompt;
        }
        if self.id != remote {
            tracing::warn!(local = %self.id, %remote, "session mismatch, server restarted");
            return GateAction::Reload;
        }
        GateAction::Prompt
    }

    /// Like [`Self::on_authorization_required`], with a session change reported
    /// as the fatal [`ConsoleError::SessionMismatch`].
    pub fn check(&mut self, remote: SessionId) -> Result<(), ConsoleError> {
        match self.on_authorization_required(remote) {
            GateAction::Prompt => Ok(()),
            GateAction::Reload => Err(ConsoleError::SessionMismatch { local: self.id, remote }),
        }
    }

    pub fn on_authentication_accepted(&mut self) {
        self.authorized = true;
    }

    /// The login frame: session id, username and password, newline separated.
    ///
    /// Returns `None` until a session id has been assigned.
    pub fn login_frame(&self, credentials: &Credentials) -> Option<String> {
        if self.id.is_unset() {
            return None;
        }
        Some(format!("{}\n{}\n{}", self.id, credentials.username, credentials.password))
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
