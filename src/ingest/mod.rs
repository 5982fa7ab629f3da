// src/ingest/mod.rs
pub mod config;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod providers;
pub mod transcript;
pub mod types;

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::config::NewsConfig;
use crate::ingest::fetch::{HttpPageFetcher, PageFetcher};
use crate::ingest::providers::{
    bbc_rss::BbcRssProvider, cnn_rss::CnnRssProvider, youtube::YoutubeTranscriptProvider,
};
use crate::ingest::transcript::{TranscriptSource, YoutubeTranscriptClient};
use crate::ingest::types::{NewsRecord, PlannedSource};

/// Content cap in characters (Unicode scalar values).
pub const MAX_CONTENT_CHARS: usize = 3000;
pub const TRUNCATION_MARKER: &str = "...";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_records_total", "Records emitted by source adapters.");
        describe_counter!("ingest_feed_entries_total", "Entries parsed from feeds.");
        describe_counter!("ingest_kept_total", "Records kept after normalization.");
        describe_counter!(
            "ingest_dedup_total",
            "Records dropped as duplicate or empty titles."
        );
        describe_counter!(
            "ingest_truncated_total",
            "Records whose content hit the length cap."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Source-level failures (feed unreachable, adapter error or panic)."
        );
        describe_counter!("ingest_fetch_errors_total", "Failed HTTP fetches.");
        describe_counter!(
            "ingest_transcript_misses_total",
            "Video entries skipped for lack of a transcript."
        );
        describe_counter!(
            "summarize_failures_total",
            "Items dropped because summarization failed."
        );
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when ingest pipeline last ran."
        );
    });
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("no news source could be reached ({0} configured)")]
    NoSourceAvailable(usize),
}

/// Output of one aggregation pass.
#[derive(Debug, Default)]
pub struct Aggregated {
    /// Adapter order, then emission order within each adapter.
    pub records: Vec<NewsRecord>,
    /// Names of sources that errored or panicked.
    pub failed: Vec<&'static str>,
}

/// Run every source in order and concatenate their records. An adapter that returns
/// an error or panics contributes nothing; the others are unaffected.
pub async fn aggregate(sources: &[PlannedSource]) -> Aggregated {
    ensure_metrics_described();

    let mut agg = Aggregated::default();
    for src in sources {
        let name = src.adapter.name();
        let outcome = AssertUnwindSafe(src.adapter.fetch(src.limit))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(mut v)) => {
                tracing::info!(provider = name, count = v.len(), "source fetched");
                agg.records.append(&mut v);
            }
            Ok(Err(e)) => {
                tracing::warn!(error = ?e, provider = name, "provider error");
                counter!("ingest_provider_errors_total").increment(1);
                agg.failed.push(name);
            }
            Err(_) => {
                tracing::error!(provider = name, "provider panicked");
                counter!("ingest_provider_errors_total").increment(1);
                agg.failed.push(name);
            }
        }
    }
    agg
}

/// Counts from one normalization pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Empty or repeated titles.
    pub dropped: usize,
    pub truncated: usize,
}

/// Trim, drop empty and already-seen titles, cap content length. Order-preserving.
pub fn normalize_records(records: Vec<NewsRecord>) -> Vec<NewsRecord> {
    normalize_with_stats(records).0
}

pub fn normalize_with_stats(records: Vec<NewsRecord>) -> (Vec<NewsRecord>, NormalizeStats) {
    // Fresh per call: titles from an earlier run never suppress this one.
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut stats = NormalizeStats::default();
    let mut out = Vec::with_capacity(records.len());

    for rec in records {
        let title = rec.title.trim();
        if title.is_empty() || !seen_titles.insert(title.to_string()) {
            stats.dropped += 1;
            continue;
        }
        let content = rec.content.trim();
        let capped = truncate_content(content);
        if capped.len() != content.len() {
            stats.truncated += 1;
        }
        out.push(NewsRecord {
            title: title.to_string(),
            content: capped,
            source: rec.source,
            url: rec.url,
        });
    }
    (out, stats)
}

/// First `MAX_CONTENT_CHARS` characters plus the marker, or the input unchanged.
pub fn truncate_content(content: &str) -> String {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((cut, _)) => {
            let mut s = String::with_capacity(cut + TRUNCATION_MARKER.len());
            s.push_str(&content[..cut]);
            s.push_str(TRUNCATION_MARKER);
            s
        }
        None => content.to_string(),
    }
}

/// Aggregate + normalize. Fails only when every configured source failed.
pub async fn produce_normalized_news(
    sources: &[PlannedSource],
) -> Result<Vec<NewsRecord>, AggregateError> {
    let agg = aggregate(sources).await;
    if !sources.is_empty() && agg.failed.len() == sources.len() {
        return Err(AggregateError::NoSourceAvailable(sources.len()));
    }

    let raw = agg.records.len();
    let (kept, stats) = normalize_with_stats(agg.records);

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    counter!("ingest_kept_total").increment(kept.len() as u64);
    counter!("ingest_dedup_total").increment(stats.dropped as u64);
    counter!("ingest_truncated_total").increment(stats.truncated as u64);
    gauge!("ingest_pipeline_last_run_ts").set(now as f64);

    tracing::info!(
        target: "ingest",
        raw,
        kept = kept.len(),
        truncated = stats.truncated,
        failed_sources = ?agg.failed,
        "ingest run complete"
    );
    Ok(kept)
}

/// Sources in their fixed order: text feeds first, transcripts last.
pub fn build_sources(
    cfg: &NewsConfig,
    fetcher: Arc<dyn PageFetcher>,
    transcripts: Arc<dyn TranscriptSource>,
) -> Vec<PlannedSource> {
    let bbc = BbcRssProvider::from_url(cfg.feeds.bbc.clone(), fetcher.clone())
        .with_full_text(cfg.bbc_full_text);
    let cnn = CnnRssProvider::from_url(cfg.feeds.cnn.clone(), fetcher.clone());
    let videos = YoutubeTranscriptProvider::new(cfg.channels.clone(), fetcher, transcripts)
        .with_feed_template(cfg.feeds.video_template.clone())
        .with_search_window(cfg.search_window);

    vec![
        PlannedSource::new(bbc, cfg.limits.bbc),
        PlannedSource::new(cnn, cfg.limits.cnn),
        PlannedSource::new(videos, cfg.limits.per_channel),
    ]
}

/// Production wiring: HTTP fetcher with browser UA + YouTube transcript client.
pub fn build_http_sources(cfg: &NewsConfig) -> anyhow::Result<Vec<PlannedSource>> {
    let fetcher = Arc::new(HttpPageFetcher::new(
        &cfg.http.user_agent,
        cfg.http.timeout_secs,
    )?);
    let transcripts = Arc::new(YoutubeTranscriptClient::new(cfg.http.timeout_secs)?);
    Ok(build_sources(cfg, fetcher, transcripts))
}
