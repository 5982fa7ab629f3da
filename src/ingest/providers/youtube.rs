// src/ingest/providers/youtube.rs
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::ingest::feed::parse_atom;
use crate::ingest::fetch::PageFetcher;
use crate::ingest::transcript::TranscriptSource;
use crate::ingest::types::{NewsRecord, SourceAdapter};

pub const YOUTUBE_FEED_TEMPLATE: &str =
    "https://www.youtube.com/feeds/videos.xml?channel_id={channel_id}";

/// Entries examined per channel before giving up (a channel feed lists 15).
pub const DEFAULT_SEARCH_WINDOW: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoChannel {
    pub name: String,
    pub id: String,
}

impl VideoChannel {
    pub fn new(name: &str, id: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
        }
    }
}

pub fn default_channels() -> Vec<VideoChannel> {
    vec![
        VideoChannel::new("BBC News", "UC16niRr50-MSBwiO3YDb3RA"),
        VideoChannel::new("CNN", "UCupvZG-5ko_eiXAupbDfxWw"),
        VideoChannel::new("Al Jazeera English", "UCNye-wNBqNL5ZzHSJj3l8Bg"),
    ]
}

/// Transcripts of recent channel uploads. `limit` is per channel: each channel's feed
/// is walked in order until `limit` videos with a transcript were accepted.
pub struct YoutubeTranscriptProvider {
    channels: Vec<VideoChannel>,
    feed_template: String,
    search_window: usize,
    fetcher: Arc<dyn PageFetcher>,
    transcripts: Arc<dyn TranscriptSource>,
}

impl YoutubeTranscriptProvider {
    pub fn new(
        channels: Vec<VideoChannel>,
        fetcher: Arc<dyn PageFetcher>,
        transcripts: Arc<dyn TranscriptSource>,
    ) -> Self {
        Self {
            channels,
            feed_template: YOUTUBE_FEED_TEMPLATE.to_string(),
            search_window: DEFAULT_SEARCH_WINDOW,
            fetcher,
            transcripts,
        }
    }

    pub fn with_feed_template(mut self, template: impl Into<String>) -> Self {
        self.feed_template = template.into();
        self
    }

    pub fn with_search_window(mut self, window: usize) -> Self {
        self.search_window = window;
        self
    }

    pub fn feed_url(&self, channel: &VideoChannel) -> String {
        self.feed_template.replace("{channel_id}", &channel.id)
    }

    /// `None` when the channel feed itself could not be read.
    async fn search_channel(&self, channel: &VideoChannel, limit: usize) -> Option<Vec<NewsRecord>> {
        let url = self.feed_url(channel);
        let body = self.fetcher.fetch_text(&url).await?;
        let entries = match parse_atom(&body) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = ?e, channel = %channel.name, "video feed parse error");
                return None;
            }
        };

        let source = format!("YouTube - {}", channel.name);
        let mut accepted = Vec::new();
        for entry in entries.into_iter().take(self.search_window) {
            if accepted.len() >= limit {
                break;
            }
            let Some(video_id) = entry.video_id.as_deref() else {
                continue;
            };
            match self.transcripts.transcript(video_id).await {
                Ok(text) => {
                    let mut rec = NewsRecord::new(source.clone(), entry.title, text);
                    if !entry.link.is_empty() {
                        rec = rec.with_url(entry.link);
                    }
                    accepted.push(rec);
                }
                Err(e) => {
                    counter!("ingest_transcript_misses_total").increment(1);
                    tracing::debug!(channel = %channel.name, %video_id, reason = %e, "no transcript, trying next video");
                }
            }
        }

        if accepted.is_empty() {
            tracing::info!(channel = %channel.name, "no transcript in recent uploads");
        }
        Some(accepted)
    }
}

#[async_trait]
impl SourceAdapter for YoutubeTranscriptProvider {
    async fn fetch(&self, limit: usize) -> Result<Vec<NewsRecord>> {
        let mut out = Vec::new();
        let mut failed_feeds = 0usize;
        for channel in &self.channels {
            match self.search_channel(channel, limit).await {
                Some(mut recs) => out.append(&mut recs),
                None => {
                    failed_feeds += 1;
                    tracing::warn!(channel = %channel.name, "video feed unavailable");
                }
            }
        }

        if !self.channels.is_empty() && failed_feeds == self.channels.len() {
            return Err(anyhow!("no video channel feed reachable"));
        }
        counter!("ingest_records_total").increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "YouTube"
    }
}
