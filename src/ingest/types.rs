// src/ingest/types.rs
use anyhow::Result;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct NewsRecord {
    pub source: String, // e.g., "BBC", "CNN", "YouTube - Al Jazeera English"
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl NewsRecord {
    pub fn new(source: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            url: None,
            content: content.into(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One origin of news items (a feed, a set of channels...).
///
/// `fetch` collects up to `limit` records. Per-entry problems are absorbed inside the
/// adapter; `Err` is reserved for "this whole source is unreachable" and is absorbed
/// by the aggregator.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, limit: usize) -> Result<Vec<NewsRecord>>;
    fn name(&self) -> &'static str;
}

/// An adapter together with the limit it is invoked with.
pub struct PlannedSource {
    pub adapter: Box<dyn SourceAdapter>,
    pub limit: usize,
}

impl PlannedSource {
    pub fn new(adapter: impl SourceAdapter + 'static, limit: usize) -> Self {
        Self {
            adapter: Box::new(adapter),
            limit,
        }
    }
}
