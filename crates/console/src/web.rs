// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the PHP endpoints served next to the console page.

use std::future::Future;
use std::pin::Pin;

use reqwest::{Client, Response, Url};

use crate::error::ConsoleError;
use crate::poll::{AlarmRecord, AlarmSource};

pub struct WebClient {
    base_url: String,
    client: Client,
}

impl WebClient {
    /// `base_url` is the page URL; endpoints are resolved next to it.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        crate::tls::ensure_crypto();
        let client = Client::builder().timeout(std::time::Duration::from_secs(10)).build()?;
        Ok(Self { base_url: base_url.to_owned(), client })
    }

    /// Resolve `path` against the page URL. A last segment without a dot is
    /// taken as a directory.
    fn url(&self, path: &str) -> anyhow::Result<Url> {
        let mut base = Url::parse(&self.base_url)?;
        let last = base.path_segments().and_then(|mut s| s.next_back()).unwrap_or_default();
        if !last.is_empty() && !last.contains('.') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        Ok(base.join(path)?)
    }

    /// `GET get-sia-messages.php?id=<from>`.
    pub async fn sia_messages(&self, from: i64) -> anyhow::Result<Vec<AlarmRecord>> {
        let mut url = self.url("get-sia-messages.php")?;
        url.query_pairs_mut().append_pair("id", &from.to_string());
        let resp = check(self.client.get(url).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// `POST settings.php?theme=<name>`. The endpoint answers with an empty body.
    pub async fn set_theme(&self, theme: &str) -> anyhow::Result<()> {
        let mut url = self.url("settings.php")?;
        url.query_pairs_mut().append_pair("theme", theme);
        check(self.client.post(url).send().await?).await?;
        Ok(())
    }
}

/// The PHP scripts report failures as a status line plus plain-text body.
async fn check(resp: Response) -> anyhow::Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ConsoleError::Endpoint { status: status.as_u16(), body }.into())
}

impl AlarmSource for WebClient {
    fn fetch(
        &self,
        from: i64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<AlarmRecord>>> + Send + '_>> {
        Box::pin(self.sia_messages(from))
    }
}

#[cfg(test)]
#[path = "web_tests.rs"]
mod tests;
