// src/ingest/providers/cnn_rss.rs
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use metrics::counter;

use crate::ingest::extract::{extract, SiteStrategy};
use crate::ingest::feed::{parse_rss, FeedEntry};
use crate::ingest::fetch::PageFetcher;
use crate::ingest::types::{NewsRecord, SourceAdapter};

pub const CNN_RSS_URL: &str = "http://rss.cnn.com/rss/edition_world.rss";

/// CNN world news. Feed summaries are unreliable, so every kept entry is fetched
/// and its body extracted; a failed fetch keeps the entry with empty content.
pub struct CnnRssProvider {
    feed_url: String,
    fetcher: Arc<dyn PageFetcher>,
}

impl CnnRssProvider {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::from_url(CNN_RSS_URL, fetcher)
    }

    pub fn from_url(feed_url: impl Into<String>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            feed_url: feed_url.into(),
            fetcher,
        }
    }
}

/// Video pages and entries without a title or link carry no article text.
pub fn is_junk_entry(entry: &FeedEntry) -> bool {
    entry.title.is_empty()
        || entry.link.is_empty()
        || entry.title.to_lowercase().contains("video")
        || entry.link.contains("/videos")
}

#[async_trait]
impl SourceAdapter for CnnRssProvider {
    async fn fetch(&self, limit: usize) -> Result<Vec<NewsRecord>> {
        let Some(body) = self.fetcher.fetch_text(&self.feed_url).await else {
            return Err(anyhow!("cnn feed unavailable: {}", self.feed_url));
        };
        let entries = parse_rss(&body)?;

        let mut out = Vec::new();
        let mut skipped = 0usize;
        for entry in entries {
            if out.len() >= limit {
                break;
            }
            if is_junk_entry(&entry) {
                skipped += 1;
                continue;
            }

            let content = match self.fetcher.fetch_text(&entry.link).await {
                Some(html) => extract(&html, SiteStrategy::ComponentParagraphs),
                None => String::new(),
            };
            if content.is_empty() {
                tracing::warn!(provider = "CNN", url = %entry.link, "no article text extracted");
            }

            out.push(NewsRecord::new("CNN", entry.title, content).with_url(entry.link));
        }

        counter!("ingest_records_total").increment(out.len() as u64);
        tracing::debug!(provider = "CNN", count = out.len(), skipped, "cnn feed parsed");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "CNN"
    }
}
