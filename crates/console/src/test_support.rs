// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: in-memory links, scripted dialers, and assertion helpers.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::channel::{Dialer, Link};
use crate::view::{Notice, View};

/// Server side of an in-memory [`Link`].
pub struct Peer {
    /// Frames the console sent.
    pub received: mpsc::UnboundedReceiver<String>,
    /// Push frames to the console. Dropping it closes the link.
    pub push: mpsc::UnboundedSender<String>,
}

/// A connected pair: the console's [`Link`] and the server's [`Peer`].
pub fn memory_link() -> (Link, Peer) {
    let (to_server, received) = mpsc::unbounded_channel::<String>();
    let (push, to_client) = mpsc::unbounded_channel::<String>();
    let sink = futures_util::sink::unfold(to_server, |tx, frame: String| async move {
        tx.send(frame).map_err(|e| anyhow::anyhow!("{e}"))?;
        Ok::<_, anyhow::Error>(tx)
    });
    let stream = futures_util::stream::unfold(to_client, |mut rx| async move {
        rx.recv().await.map(|frame| (Ok(frame), rx))
    });
    (Link { sink: Box::pin(sink), stream: Box::pin(stream) }, Peer { received, push })
}

/// Hands out queued links in order, then refuses. Reports the time of every attempt.
pub struct ScriptedDialer {
    links: Mutex<VecDeque<Link>>,
    attempts: mpsc::UnboundedSender<Instant>,
}

impl ScriptedDialer {
    pub fn new(links: Vec<Link>) -> (Arc<Self>, mpsc::UnboundedReceiver<Instant>) {
        let (attempts, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { links: Mutex::new(links.into()), attempts }), rx)
    }
}

impl Dialer for ScriptedDialer {
    fn dial(&self) -> Pin<Box<dyn Future<Output = anyhow::Result<Link>> + Send + '_>> {
        let _ = self.attempts.send(Instant::now());
        let link = self.links.lock().ok().and_then(|mut links| links.pop_front());
        Box::pin(async move { link.ok_or_else(|| anyhow::anyhow!("connection refused")) })
    }
}

/// A [`View`] that keeps every notice, shareable with the test body.
#[derive(Clone, Default)]
pub struct Recorder {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl Recorder {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().ok().and_then(|n| n.last().cloned())
    }
}

impl View for Recorder {
    fn show(&mut self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
