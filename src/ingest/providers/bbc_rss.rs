// src/ingest/providers/bbc_rss.rs
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use metrics::counter;

use crate::ingest::extract::{extract, SiteStrategy};
use crate::ingest::feed::parse_rss;
use crate::ingest::fetch::PageFetcher;
use crate::ingest::types::{NewsRecord, SourceAdapter};

pub const BBC_RSS_URL: &str = "https://feeds.bbci.co.uk/news/rss.xml";

/// BBC top stories. The feed summary is already clean text, so by default no page is
/// fetched; `with_full_text(true)` pulls the article body instead (summary as fallback).
pub struct BbcRssProvider {
    feed_url: String,
    fetcher: Arc<dyn PageFetcher>,
    full_text: bool,
}

impl BbcRssProvider {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::from_url(BBC_RSS_URL, fetcher)
    }

    pub fn from_url(feed_url: impl Into<String>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            feed_url: feed_url.into(),
            fetcher,
            full_text: false,
        }
    }

    pub fn with_full_text(mut self, on: bool) -> Self {
        self.full_text = on;
        self
    }

    async fn article_body(&self, link: &str) -> String {
        if link.is_empty() {
            return String::new();
        }
        match self.fetcher.fetch_text(link).await {
            Some(html) => extract(&html, SiteStrategy::ArticleParagraphs),
            None => String::new(),
        }
    }
}

#[async_trait]
impl SourceAdapter for BbcRssProvider {
    async fn fetch(&self, limit: usize) -> Result<Vec<NewsRecord>> {
        let Some(body) = self.fetcher.fetch_text(&self.feed_url).await else {
            return Err(anyhow!("bbc feed unavailable: {}", self.feed_url));
        };
        let entries = parse_rss(&body)?;

        let mut out = Vec::with_capacity(limit.min(entries.len()));
        for entry in entries.into_iter().take(limit) {
            let mut content = entry.summary;
            if self.full_text {
                let body = self.article_body(&entry.link).await;
                if !body.is_empty() {
                    content = body;
                }
            }
            let mut rec = NewsRecord::new("BBC", entry.title, content);
            if !entry.link.is_empty() {
                rec = rec.with_url(entry.link);
            }
            out.push(rec);
        }

        counter!("ingest_records_total").increment(out.len() as u64);
        tracing::debug!(provider = "BBC", count = out.len(), "bbc feed parsed");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "BBC"
    }
}
