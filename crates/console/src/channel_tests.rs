// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio::time::Instant;

use super::*;
use crate::test_support::{memory_link, ScriptedDialer};

const DELAY: Duration = Duration::from_millis(5000);

fn status() -> StatusIndicator {
    StatusIndicator::new(Duration::from_secs(2))
}

async fn wait_open(channel: &CommandChannel) -> anyhow::Result<()> {
    channel.subscribe_state().wait_for(|s| *s == ConnectionState::Open).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_connect_retries_after_exactly_the_delay() -> anyhow::Result<()> {
    let (dialer, mut attempts) = ScriptedDialer::new(vec![]);
    let (_channel, _inbound) =
        CommandChannel::connect(dialer, status(), DELAY, CancellationToken::new());

    let first = attempts.recv().await.ok_or_else(|| anyhow::anyhow!("no attempt"))?;
    let second = attempts.recv().await.ok_or_else(|| anyhow::anyhow!("no retry"))?;
    let third = attempts.recv().await.ok_or_else(|| anyhow::anyhow!("no retry"))?;
    assert_eq!(second - first, DELAY);
    assert_eq!(third - second, DELAY);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn closed_socket_redials_after_exactly_the_delay() -> anyhow::Result<()> {
    let (link, peer) = memory_link();
    let (dialer, mut attempts) = ScriptedDialer::new(vec![link]);
    let (channel, _inbound) =
        CommandChannel::connect(dialer, status(), DELAY, CancellationToken::new());
    wait_open(&channel).await?;
    attempts.recv().await;

    let closed_at = Instant::now();
    drop(peer);
    channel.subscribe_state().wait_for(|s| *s == ConnectionState::Closed).await?;

    let redial = attempts.recv().await.ok_or_else(|| anyhow::anyhow!("no redial"))?;
    assert_eq!(redial - closed_at, DELAY);
    Ok(())
}

#[tokio::test]
async fn empty_command_sends_nothing() -> anyhow::Result<()> {
    let (link, mut peer) = memory_link();
    let (dialer, _attempts) = ScriptedDialer::new(vec![link]);
    let status = status();
    let (channel, _inbound) =
        CommandChannel::connect(dialer, status.clone(), DELAY, CancellationToken::new());
    wait_open(&channel).await?;

    assert_eq!(channel.send(""), Ok(false));
    tokio::task::yield_now().await;
    assert!(peer.received.try_recv().is_err());
    assert_eq!(status.current(), CommandStatus::idle());
    Ok(())
}

#[tokio::test]
async fn command_is_sent_once_verbatim_and_marks_status() -> anyhow::Result<()> {
    let (link, mut peer) = memory_link();
    let (dialer, _attempts) = ScriptedDialer::new(vec![link]);
    let status = status();
    let (channel, _inbound) =
        CommandChannel::connect(dialer, status.clone(), DELAY, CancellationToken::new());
    wait_open(&channel).await?;

    assert_eq!(channel.send("AREA 0 STATE"), Ok(true));
    assert_eq!(
        status.current(),
        CommandStatus { text: "AREA 0 STATE".to_owned(), tone: Tone::Active }
    );
    assert_eq!(peer.received.recv().await.as_deref(), Some("AREA 0 STATE"));
    tokio::task::yield_now().await;
    assert!(peer.received.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn send_while_closed_is_rejected() {
    let (dialer, _attempts) = ScriptedDialer::new(vec![]);
    let status = status();
    let (channel, _inbound) =
        CommandChannel::connect(dialer, status.clone(), DELAY, CancellationToken::new());

    assert_eq!(channel.send("AREA 1 SET"), Err(ConsoleError::NotConnected));
    assert_eq!(channel.send_login("1\nu\np".to_owned()), Err(ConsoleError::NotConnected));
    assert_ne!(status.current().text, "AREA 1 SET");
}

#[tokio::test]
async fn inbound_frames_are_forwarded_in_order() -> anyhow::Result<()> {
    let (link, peer) = memory_link();
    let (dialer, _attempts) = ScriptedDialer::new(vec![link]);
    let (channel, mut inbound) =
        CommandChannel::connect(dialer, status(), DELAY, CancellationToken::new());
    wait_open(&channel).await?;

    peer.push.send(r#"{"typeId":20}"#.to_owned())?;
    peer.push.send(r#"{"typeId":1}"#.to_owned())?;
    assert_eq!(inbound.recv().await.as_deref(), Some(r#"{"typeId":20}"#));
    assert_eq!(inbound.recv().await.as_deref(), Some(r#"{"typeId":1}"#));
    Ok(())
}

#[tokio::test]
async fn login_frame_is_not_echoed() -> anyhow::Result<()> {
    let (link, mut peer) = memory_link();
    let (dialer, _attempts) = ScriptedDialer::new(vec![link]);
    let status = status();
    let (channel, _inbound) =
        CommandChannel::connect(dialer, status.clone(), DELAY, CancellationToken::new());
    wait_open(&channel).await?;

    channel.send_login("5EED\noperator\n1234".to_owned())?;
    assert_eq!(peer.received.recv().await.as_deref(), Some("5EED\noperator\n1234"));
    assert_eq!(status.current(), CommandStatus::idle());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_reconnecting() -> anyhow::Result<()> {
    let (dialer, mut attempts) = ScriptedDialer::new(vec![]);
    let cancel = CancellationToken::new();
    let (channel, _inbound) = CommandChannel::connect(dialer, status(), DELAY, cancel.clone());
    attempts.recv().await;

    cancel.cancel();
    tokio::time::sleep(DELAY * 3).await;
    assert!(attempts.try_recv().is_err());
    assert_eq!(channel.state(), ConnectionState::Closed);
    Ok(())
}

#[yare::parameterized(
    http = { "http://panel.local/gms/index.html", "ws://panel.local/cli" },
    https = { "https://panel.local:1500/", "wss://panel.local:1500/cli" },
    bare_host = { "panel.local", "ws://panel.local/cli" },
    no_path = { "http://10.0.0.5:1500", "ws://10.0.0.5:1500/cli" },
)]
fn socket_url_from_page(page: &str, expected: &str) {
    assert_eq!(socket_url(page), expected);
}

#[tokio::test]
async fn shutdown_closes_an_open_link() -> anyhow::Result<()> {
    let (link, mut peer) = memory_link();
    let (dialer, _attempts) = ScriptedDialer::new(vec![link]);
    let (channel, _inbound) =
        CommandChannel::connect(dialer, status(), DELAY, CancellationToken::new());
    wait_open(&channel).await?;

    channel.shutdown();
    channel.subscribe_state().wait_for(|s| *s == ConnectionState::Closed).await?;
    assert_eq!(channel.send("AREA 1 SET"), Err(ConsoleError::NotConnected));
    assert!(peer.received.recv().await.is_none());
    Ok(())
}
