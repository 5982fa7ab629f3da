// src/ingest/fetch.rs
use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use metrics::counter;

/// Chrome-on-Windows UA; several outlets answer 403 to obvious bots.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Fetches the body of a URL as text. `None` means "no data": every network, timeout
/// or HTTP status problem is logged and swallowed here.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Option<String>;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(timeout_secs.clamp(1, 4)))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_text(&self, url: &str) -> Option<String> {
        let resp = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = ?e, %url, "http get failed");
                counter!("ingest_fetch_errors_total").increment(1);
                return None;
            }
        };
        let resp = match resp.error_for_status() {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = ?e, %url, "http status error");
                counter!("ingest_fetch_errors_total").increment(1);
                return None;
            }
        };
        match resp.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::warn!(error = ?e, %url, "reading http body failed");
                counter!("ingest_fetch_errors_total").increment(1);
                None
            }
        }
    }
}

// --- Test helper ---
/// In-memory fetcher keyed by exact URL. Unknown URLs behave like a failed fetch.
#[derive(Default, Clone)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }
}

#[async_trait::async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch_text(&self, url: &str) -> Option<String> {
        self.pages.get(url).cloned()
    }
}
