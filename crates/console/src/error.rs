// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use crate::session::SessionId;

/// Errors the console branches on. Everything else travels as `anyhow::Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// A command was issued while the socket was not open.
    NotConnected,
    /// The server announced a session other than the one we hold.
    SessionMismatch { local: SessionId, remote: SessionId },
    /// An HTTP endpoint answered with a non-success status.
    Endpoint { status: u16, body: String },
    /// A received frame could not be decoded into an envelope.
    InvalidFrame(String),
}

impl ConsoleError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConnected => "NOT_CONNECTED",
            Self::SessionMismatch { .. } => "SESSION_MISMATCH",
            Self::Endpoint { .. } => "ENDPOINT",
            Self::InvalidFrame(_) => "INVALID_FRAME",
        }
    }

    /// Whether the current console instance must be discarded.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionMismatch { .. })
    }
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => f.write_str("not connected to server"),
            Self::SessionMismatch { local, remote } => {
                write!(f, "session mismatch: holding {local}, server sent {remote}")
            }
            Self::Endpoint { status, body } => write!(f, "endpoint returned {status}: {body}"),
            Self::InvalidFrame(reason) => write!(f, "invalid frame: {reason}"),
        }
    }
}

impl std::error::Error for ConsoleError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
