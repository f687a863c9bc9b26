// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-alarm poller: fetches new SIA rows from the web server every tick.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::protocol::{lenient, SiaMessage};
use crate::view::Notice;

/// One row of the `SIA-Messages` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlarmRecord {
    #[serde(deserialize_with = "lenient::integer")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub timeindex: Option<String>,
    #[serde(flatten)]
    pub sia: SiaMessage,
}

/// Where alarm rows come from. [`crate::web::WebClient`] in production.
pub trait AlarmSource: Send + Sync + 'static {
    /// Up to 100 rows with `id >= from`, ascending.
    fn fetch(
        &self,
        from: i64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<AlarmRecord>>> + Send + '_>>;
}

pub enum Trigger {
    Started(JoinHandle<()>),
    /// A request was already in flight.
    Skipped,
}

struct Shared {
    busy: AtomicBool,
    cursor: AtomicI64,
}

/// Clears the in-flight flag however the request ends.
struct BusyGuard(Arc<Shared>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::Release);
    }
}

/// Polls an [`AlarmSource`] without ever overlapping requests.
pub struct AlarmPoller {
    source: Arc<dyn AlarmSource>,
    shared: Arc<Shared>,
    notices: mpsc::Sender<Notice>,
}

impl AlarmPoller {
    pub fn new(source: Arc<dyn AlarmSource>, notices: mpsc::Sender<Notice>) -> Self {
        let shared = Arc::new(Shared { busy: AtomicBool::new(false), cursor: AtomicI64::new(-1) });
        Self { source, shared, notices }
    }

    /// Highest alarm id shown so far, -1 before the first row.
    pub fn cursor(&self) -> i64 {
        self.shared.cursor.load(Ordering::Acquire)
    }

    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    /// Start a request for rows after the cursor unless one is in flight.
    pub fn trigger(&self) -> Trigger {
        if self.shared.busy.swap(true, Ordering::AcqRel) {
            return Trigger::Skipped;
        }
        let guard = BusyGuard(Arc::clone(&self.shared));
        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.shared);
        let notices = self.notices.clone();
        let from = self.cursor() + 1;

        Trigger::Started(tokio::spawn(async move {
            let _guard = guard;
            match source.fetch(from).await {
                Ok(rows) => {
                    if !rows.is_empty() {
                        tracing::debug!(from, count = rows.len(), "alarm rows fetched");
                    }
                    for row in rows {
                        shared.cursor.fetch_max(row.id, Ordering::AcqRel);
                        if notices.send(Notice::Alarm(row)).await.is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(from, err = %e, "alarm poll failed");
                    let _ = notices.send(Notice::Error(format!("{e:#}"))).await;
                }
            }
        }))
    }

    /// Trigger on every tick until cancelled. Ticks that land while a request
    /// is in flight are skipped.
    pub async fn run(self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if let Trigger::Skipped = self.trigger() {
                tracing::trace!("alarm poll still in flight, tick skipped");
            }
        }
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
