// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-command indicator.
//!
//! Purely cosmetic: a line of text with a tone that flips back to `Idle`
//! a couple of seconds after each update. Reset timers are fire-and-forget;
//! a newer update racing an older timer only affects what is displayed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Visual weight of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Idle,
    /// A command is in flight or just succeeded.
    Active,
    /// Something needs the operator (login prompt).
    Notice,
    Error,
    /// Socket is down.
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStatus {
    pub text: String,
    pub tone: Tone,
}

impl CommandStatus {
    pub fn idle() -> Self {
        Self { text: "Idle".to_owned(), tone: Tone::Idle }
    }

    pub fn offline() -> Self {
        Self { text: "---".to_owned(), tone: Tone::Offline }
    }
}

/// Shared handle to the status line.
#[derive(Clone)]
pub struct StatusIndicator {
    tx: Arc<watch::Sender<CommandStatus>>,
    reset_after: Duration,
}

impl StatusIndicator {
    pub fn new(reset_after: Duration) -> Self {
        let (tx, _) = watch::channel(CommandStatus::offline());
        Self { tx: Arc::new(tx), reset_after }
    }

    pub fn subscribe(&self) -> watch::Receiver<CommandStatus> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> CommandStatus {
        self.tx.borrow().clone()
    }

    /// Set the status without scheduling a reset.
    pub fn set(&self, text: impl Into<String>, tone: Tone) {
        self.tx.send_replace(CommandStatus { text: text.into(), tone });
    }

    /// Set the status and schedule a one-shot reset to idle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn flash(&self, text: impl Into<String>, tone: Tone) {
        self.set(text, tone);
        let tx = Arc::clone(&self.tx);
        let delay = self.reset_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tx.send_replace(CommandStatus::idle());
        });
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
