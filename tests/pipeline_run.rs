// tests/pipeline_run.rs
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use newslens::notify::MockDeliverer;
use newslens::pipeline::read_snapshot;
use newslens::summarize::{MockSummarizer, Summarizer};
use newslens::{NewsPipeline, NewsRecord, PlannedSource, SourceAdapter};

struct StaticAdapter(&'static str, Vec<NewsRecord>);

#[async_trait]
impl SourceAdapter for StaticAdapter {
    async fn fetch(&self, limit: usize) -> Result<Vec<NewsRecord>> {
        Ok(self.1.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        self.0
    }
}

/// Refuses anything mentioning markets.
struct PickySummarizer;

#[async_trait]
impl Summarizer for PickySummarizer {
    async fn summarize(&self, title: &str, _content: &str) -> Result<String> {
        if title.contains("Markets") {
            bail!("rate limited");
        }
        Ok(format!("Summary: {title}"))
    }

    fn provider_name(&self) -> &'static str {
        "picky"
    }
}

fn sources() -> Vec<PlannedSource> {
    vec![
        PlannedSource::new(
            StaticAdapter(
                "BBC",
                vec![NewsRecord::new("BBC", "Leaders meet", "Leaders gather in London. Talks follow.")],
            ),
            3,
        ),
        PlannedSource::new(
            StaticAdapter(
                "CNN",
                vec![NewsRecord::new("CNN", "Markets rally", "Stocks climbed. Bonds fell.")],
            ),
            3,
        ),
    ]
}

#[tokio::test]
async fn run_summarizes_snapshots_and_delivers() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("summaries.json");
    let deliverer = Arc::new(MockDeliverer::new());
    let pipeline = NewsPipeline::new(sources(), Arc::new(MockSummarizer), snapshot.clone())
        .with_deliverer(deliverer.clone());

    let report = pipeline.run(true).await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.summarized, 2);
    assert!(report.delivered);

    let stored = read_snapshot(&snapshot).await.unwrap().expect("snapshot written");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].source, "BBC");
    assert_eq!(stored[0].summary, "Leaders gather in London");

    let calls = deliverer.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], stored);
}

#[tokio::test]
async fn run_without_email_does_not_deliver() {
    let dir = tempfile::tempdir().unwrap();
    let deliverer = Arc::new(MockDeliverer::new());
    let pipeline = NewsPipeline::new(sources(), Arc::new(MockSummarizer), dir.path().join("s.json"))
        .with_deliverer(deliverer.clone());

    let report = pipeline.run(false).await.unwrap();
    assert!(!report.delivered);
    assert!(deliverer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_summaries_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("s.json");
    let pipeline = NewsPipeline::new(sources(), Arc::new(PickySummarizer), snapshot.clone());

    let report = pipeline.run(false).await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.summarized, 1);

    let stored = read_snapshot(&snapshot).await.unwrap().unwrap();
    assert_eq!(stored[0].title, "Leaders meet");
    assert_eq!(stored[0].summary, "Leaders meet");
}

#[tokio::test]
async fn empty_ingest_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("s.json");
    let pipeline = NewsPipeline::new(
        vec![PlannedSource::new(StaticAdapter("Empty", vec![]), 3)],
        Arc::new(MockSummarizer),
        snapshot.clone(),
    );

    let report = pipeline.run(true).await.unwrap();
    assert_eq!(report.fetched, 0);
    assert!(read_snapshot(&snapshot).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_snapshot_writes_leave_a_valid_file() {
    use newslens::pipeline::write_snapshot;
    use newslens::SummarizedItem;

    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("s.json");
    let batch = |tag: &str, n: usize| -> Vec<SummarizedItem> {
        (0..n)
            .map(|i| SummarizedItem {
                source: tag.to_string(),
                title: format!("{tag} {i}"),
                summary: "x".repeat(2000),
            })
            .collect()
    };
    let a = batch("A", 200);
    let b = batch("B", 150);

    let (ra, rb) = tokio::join!(write_snapshot(&snapshot, &a), write_snapshot(&snapshot, &b));
    ra.unwrap();
    rb.unwrap();

    let stored = read_snapshot(&snapshot).await.unwrap().expect("snapshot present");
    assert!(stored == a || stored == b);
    let leftovers = std::fs::read_dir(dir.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .is_ok_and(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        })
        .count();
    assert_eq!(leftovers, 0);
}
