// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command channel: one websocket to the server's `/cli` endpoint.
//!
//! A background task owns the socket. It dials, pumps frames in both
//! directions until the socket closes, then waits a fixed delay and dials
//! again, forever, until cancelled. Inbound text frames are forwarded to the
//! receiver returned from [`CommandChannel::connect`]; commands travel the
//! other way through a bounded queue that is discarded on every disconnect.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::Connector;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ConsoleError;
use crate::protocol::{SOCKET_PATH, SUBPROTOCOL};
use crate::status::{CommandStatus, StatusIndicator, Tone};

/// Lifecycle of the command socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

pub type FrameSink = Pin<Box<dyn Sink<String, Error = anyhow::Error> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = anyhow::Result<String>> + Send>>;

/// An established text-frame link.
pub struct Link {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens links to the server. The production implementation is
/// [`WsDialer`]; tests substitute in-memory links.
pub trait Dialer: Send + Sync + 'static {
    fn dial(&self) -> Pin<Box<dyn Future<Output = anyhow::Result<Link>> + Send + '_>>;
}

/// Dials the command socket with tokio-tungstenite.
pub struct WsDialer {
    url: String,
    tls: Option<Arc<rustls::ClientConfig>>,
}

impl WsDialer {
    pub fn new(url: impl Into<String>, tls: Option<Arc<rustls::ClientConfig>>) -> Self {
        Self { url: url.into(), tls }
    }
}

impl Dialer for WsDialer {
    fn dial(&self) -> Pin<Box<dyn Future<Output = anyhow::Result<Link>> + Send + '_>> {
        Box::pin(async move {
            let mut request = self.url.as_str().into_client_request()?;
            request
                .headers_mut()
                .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));
            let connector = self.tls.clone().map(Connector::Rustls);
            let (ws, _) =
                tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector)
                    .await?;

            let (write, read) = ws.split();
            let sink = write
                .sink_map_err(anyhow::Error::from)
                .with(|frame: String| async move { Ok::<_, anyhow::Error>(Message::text(frame)) });
            let stream = read.filter_map(|msg| async move {
                match msg {
                    Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                    Ok(_) => None, // ping/pong/binary/close
                    Err(e) => Some(Err(anyhow::Error::from(e))),
                }
            });
            Ok(Link { sink: Box::pin(sink), stream: Box::pin(stream) })
        })
    }
}

/// Derive the command socket URL from the page (server) URL.
///
/// `https` maps to `wss`, anything else to `ws`. Any path on the page URL is
/// dropped; the socket always lives at `/cli` on the same host.
pub fn socket_url(page_url: &str) -> String {
    let (scheme, rest) = if let Some(rest) = page_url.strip_prefix("https://") {
        ("wss://", rest)
    } else if let Some(rest) = page_url.strip_prefix("http://") {
        ("ws://", rest)
    } else {
        ("ws://", page_url)
    };
    let host = rest.split('/').next().unwrap_or(rest);
    format!("{scheme}{host}{SOCKET_PATH}")
}

const OUTBOUND_CAPACITY: usize = 64;
const INBOUND_CAPACITY: usize = 256;
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Handle to the command socket. Dropping it stops the background task.
pub struct CommandChannel {
    outbound: mpsc::Sender<String>,
    state: watch::Receiver<ConnectionState>,
    status: StatusIndicator,
    cancel: CancellationToken,
}

impl CommandChannel {
    /// Start the connection task.
    ///
    /// Returns the handle and the receiver of inbound text frames. The task
    /// exits when `cancel` fires, the handle is dropped, or the receiver is
    /// dropped.
    pub fn connect(
        dialer: Arc<dyn Dialer>,
        status: StatusIndicator,
        reconnect_delay: Duration,
        cancel: CancellationToken,
    ) -> (Self, mpsc::Receiver<String>) {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Closed);
        let cancel = cancel.child_token();

        let task = ConnectionTask {
            dialer,
            inbound: inbound_tx,
            outbound: outbound_rx,
            state: state_tx,
            status: status.clone(),
            reconnect_delay,
            cancel: cancel.clone(),
        };
        tokio::spawn(task.run());

        (Self { outbound: outbound_tx, state: state_rx, status, cancel }, inbound_rx)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Send a user command.
    ///
    /// An empty command is ignored (`Ok(false)`). Anything else is sent
    /// verbatim and flashes the status line.
    pub fn send(&self, command: &str) -> Result<bool, ConsoleError> {
        if command.is_empty() {
            return Ok(false);
        }
        self.transmit(command.to_owned())?;
        self.status.flash(command, Tone::Active);
        Ok(true)
    }

    /// Send a prepared login frame. Never echoed to the status line.
    pub fn send_login(&self, frame: String) -> Result<(), ConsoleError> {
        self.transmit(frame)
    }

    fn transmit(&self, frame: String) -> Result<(), ConsoleError> {
        if self.state() != ConnectionState::Open {
            return Err(ConsoleError::NotConnected);
        }
        self.outbound.try_send(frame).map_err(|_| ConsoleError::NotConnected)
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Why a pump over one link ended.
enum PumpEnd {
    /// Socket closed or failed; reconnect.
    Disconnected,
    /// Console is going away; stop for good.
    Stopped,
}

struct ConnectionTask {
    dialer: Arc<dyn Dialer>,
    inbound: mpsc::Sender<String>,
    outbound: mpsc::Receiver<String>,
    state: watch::Sender<ConnectionState>,
    status: StatusIndicator,
    reconnect_delay: Duration,
    cancel: CancellationToken,
}

impl ConnectionTask {
    async fn run(mut self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.state.send_replace(ConnectionState::Connecting);
            let dialed = tokio::select! {
                _ = self.cancel.cancelled() => break,
                dialed = self.dialer.dial() => dialed,
            };

            let mut stopped = false;
            match dialed {
                Ok(mut link) => {
                    info!("command socket open");
                    self.status.set(CommandStatus::idle().text, Tone::Idle);
                    self.state.send_replace(ConnectionState::Open);

                    stopped = matches!(self.pump(&mut link).await, PumpEnd::Stopped);

                    self.state.send_replace(ConnectionState::Closing);
                    let _ = tokio::time::timeout(CLOSE_GRACE, link.sink.close()).await;
                    info!("command socket closed");
                }
                Err(e) => {
                    warn!(err = %e, "command socket connect failed");
                }
            }

            self.discard_queued();
            self.status.set(CommandStatus::offline().text, Tone::Offline);
            self.state.send_replace(ConnectionState::Closed);

            if stopped {
                break;
            }
            debug!(delay_ms = self.reconnect_delay.as_millis() as u64, "reconnect scheduled");
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
        self.state.send_replace(ConnectionState::Closed);
    }

    async fn pump(&mut self, link: &mut Link) -> PumpEnd {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return PumpEnd::Stopped,
                frame = self.outbound.recv() => {
                    let Some(frame) = frame else { return PumpEnd::Stopped };
                    if let Err(e) = link.sink.send(frame).await {
                        debug!(err = %e, "command socket write failed");
                        return PumpEnd::Disconnected;
                    }
                }
                msg = link.stream.next() => match msg {
                    Some(Ok(text)) => {
                        if self.inbound.send(text).await.is_err() {
                            return PumpEnd::Stopped;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(err = %e, "command socket read failed");
                        return PumpEnd::Disconnected;
                    }
                    None => return PumpEnd::Disconnected,
                },
            }
        }
    }

    /// Commands queued for a dead socket are never replayed.
    fn discard_queued(&mut self) {
        let mut dropped = 0usize;
        while self.outbound.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "discarded unsent commands");
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
