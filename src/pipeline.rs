//! One full run: ingest → summarize → snapshot → (optional) email.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::ingest::config::NewsConfig;
use crate::ingest::types::{NewsRecord, PlannedSource};
use crate::ingest::{build_http_sources, produce_normalized_news, AggregateError};
use crate::notify::{Deliverer, EmailDeliverer};
use crate::summarize::{summarize_all, ChatSummarizer, DynSummarizer, SummarizedItem};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PipelineReport {
    pub fetched: usize,
    pub summarized: usize,
    pub delivered: bool,
}

pub struct NewsPipeline {
    sources: Vec<PlannedSource>,
    summarizer: DynSummarizer,
    deliverer: Option<Arc<dyn Deliverer>>,
    snapshot_path: PathBuf,
}

impl NewsPipeline {
    pub fn new(sources: Vec<PlannedSource>, summarizer: DynSummarizer, snapshot_path: PathBuf) -> Self {
        Self {
            sources,
            summarizer,
            deliverer: None,
            snapshot_path,
        }
    }

    pub fn with_deliverer(mut self, deliverer: Arc<dyn Deliverer>) -> Self {
        self.deliverer = Some(deliverer);
        self
    }

    /// Production wiring from config + environment. Email is attached only when
    /// SMTP credentials are present.
    pub fn from_config(cfg: &NewsConfig) -> Result<Self> {
        let sources = build_http_sources(cfg)?;
        let summarizer: DynSummarizer = Arc::new(ChatSummarizer::from_env()?);
        let mut pipeline = Self::new(sources, summarizer, cfg.snapshot_path.clone());
        match EmailDeliverer::from_env() {
            Ok(mailer) => pipeline = pipeline.with_deliverer(Arc::new(mailer)),
            Err(e) => tracing::warn!(error = %e, "email delivery not configured"),
        }
        Ok(pipeline)
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Normalized records, no summarization.
    pub async fn raw_news(&self) -> Result<Vec<NewsRecord>, AggregateError> {
        produce_normalized_news(&self.sources).await
    }

    pub async fn run(&self, send_email: bool) -> Result<PipelineReport> {
        let records = self.raw_news().await?;
        let mut report = PipelineReport {
            fetched: records.len(),
            ..Default::default()
        };
        if records.is_empty() {
            tracing::info!("no articles found to summarize");
            return Ok(report);
        }

        let summaries = summarize_all(&records, self.summarizer.as_ref()).await;
        report.summarized = summaries.len();
        write_snapshot(&self.snapshot_path, &summaries).await?;
        tracing::info!(
            summarized = summaries.len(),
            path = %self.snapshot_path.display(),
            "snapshot written"
        );

        if send_email {
            match &self.deliverer {
                Some(d) => {
                    d.deliver(&summaries).await.context("delivering brief")?;
                    report.delivered = true;
                }
                None => tracing::warn!("email requested but no deliverer configured"),
            }
        }
        Ok(report)
    }
}

/// Atomic replace: each write goes to its own temp file, then is renamed over `path`.
pub async fn write_snapshot(path: &Path, items: &[SummarizedItem]) -> Result<()> {
    static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

    let json = serde_json::to_string_pretty(items).context("serializing snapshot")?;
    let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp = path.with_extension(format!("json.{}.{seq}.tmp", std::process::id()));
    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("renaming snapshot to {}", path.display()))?;
    Ok(())
}

/// `Ok(None)` when no snapshot was written yet.
pub async fn read_snapshot(path: &Path) -> Result<Option<Vec<SummarizedItem>>> {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    let items = serde_json::from_str(&data).context("parsing snapshot")?;
    Ok(Some(items))
}
