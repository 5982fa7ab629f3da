// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    body::{self, Body},
    Router,
};
use http::{Request, StatusCode};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use newslens::api::AppState;
use newslens::pipeline::write_snapshot;
use newslens::summarize::MockSummarizer;
use newslens::{NewsPipeline, NewsRecord, PlannedSource, SourceAdapter, SummarizedItem};

const BODY_LIMIT: usize = 1024 * 1024;

struct StaticAdapter(Vec<NewsRecord>);

#[async_trait]
impl SourceAdapter for StaticAdapter {
    async fn fetch(&self, limit: usize) -> Result<Vec<NewsRecord>> {
        Ok(self.0.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "Static"
    }
}

/// Takes long enough for a second request to arrive mid-run.
struct SlowAdapter;

#[async_trait]
impl SourceAdapter for SlowAdapter {
    async fn fetch(&self, _limit: usize) -> Result<Vec<NewsRecord>> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(sample_records())
    }

    fn name(&self) -> &'static str {
        "Slow"
    }
}

struct DownAdapter;

#[async_trait]
impl SourceAdapter for DownAdapter {
    async fn fetch(&self, _limit: usize) -> Result<Vec<NewsRecord>> {
        Err(anyhow!("connection refused"))
    }

    fn name(&self) -> &'static str {
        "Down"
    }
}

fn sample_records() -> Vec<NewsRecord> {
    vec![
        NewsRecord::new("BBC", "Leaders meet", "European leaders gather. More later.")
            .with_url("https://www.bbc.com/news/articles/c1"),
        NewsRecord::new("CNN", "Leaders meet", "duplicate title"),
        NewsRecord::new("CNN", "Markets rally", "Stocks climbed. Bonds fell."),
    ]
}

fn pipeline_with(sources: Vec<PlannedSource>, snapshot: &Path) -> NewsPipeline {
    NewsPipeline::new(sources, Arc::new(MockSummarizer), snapshot.to_path_buf())
}

fn test_router(snapshot: &Path) -> Router {
    let sources = vec![PlannedSource::new(StaticAdapter(sample_records()), 10)];
    newslens::router(AppState::new(pipeline_with(sources, snapshot)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let dir = tempfile::tempdir().unwrap();
    let (status, bytes) = get(test_router(&dir.path().join("s.json")), "/health").await;
    assert_eq!(status, StatusCode::OK, "health should be 200");
    assert_eq!(String::from_utf8(bytes).unwrap().trim(), "OK");
}

#[tokio::test]
async fn api_root_reports_online() {
    let dir = tempfile::tempdir().unwrap();
    let (status, bytes) = get(test_router(&dir.path().join("s.json")), "/").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["status"], "online");
}

#[tokio::test]
async fn api_raw_news_is_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let (status, bytes) = get(test_router(&dir.path().join("s.json")), "/news/raw").await;
    assert_eq!(status, StatusCode::OK);

    let v: Json = serde_json::from_slice(&bytes).expect("parse raw json");
    assert_eq!(v["count"], 2, "duplicate title must be dropped");
    let articles = v["articles"].as_array().expect("articles array");
    assert_eq!(articles[0]["source"], "BBC");
    assert_eq!(articles[0]["url"], "https://www.bbc.com/news/articles/c1");
    assert_eq!(articles[1]["title"], "Markets rally");
    assert!(articles[1].get("url").is_none(), "absent url is omitted");
}

#[tokio::test]
async fn api_raw_news_is_503_when_every_source_is_down() {
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![PlannedSource::new(DownAdapter, 3)];
    let app = newslens::router(AppState::new(pipeline_with(sources, &dir.path().join("s.json"))));

    let (status, bytes) = get(app, "/news/raw").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let v: Json = serde_json::from_slice(&bytes).unwrap();
    assert!(v["detail"].as_str().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn api_summaries_before_and_after_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("summaries.json");

    let (status, bytes) = get(test_router(&snapshot), "/news/summaries").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["message"], "No summaries found. Run /pipeline/run first.");

    let items = vec![SummarizedItem {
        source: "BBC".into(),
        title: "Leaders meet".into(),
        summary: "European leaders gather".into(),
    }];
    write_snapshot(&snapshot, &items).await.unwrap();

    let (status, bytes) = get(test_router(&snapshot), "/news/summaries").await;
    assert_eq!(status, StatusCode::OK);
    let back: Vec<SummarizedItem> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(back, items);
}

#[tokio::test]
async fn api_pipeline_run_starts_in_background_and_writes_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("summaries.json");

    let req = Request::builder()
        .method("POST")
        .uri("/pipeline/run?send_email=false")
        .body(Body::empty())
        .expect("build POST /pipeline/run");
    let resp = test_router(&snapshot).oneshot(req).await.expect("oneshot run");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let v: Json = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["status"], "started");

    let mut found = false;
    for _ in 0..100 {
        if snapshot.exists() {
            found = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(found, "background run should write the snapshot");
}

async fn post_run(app: Router) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri("/pipeline/run?send_email=false")
        .body(Body::empty())
        .expect("build POST /pipeline/run");
    let resp = app.oneshot(req).await.expect("oneshot run");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn api_pipeline_run_rejects_overlapping_runs() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("summaries.json");
    let sources = vec![PlannedSource::new(SlowAdapter, 10)];
    let app = newslens::router(AppState::new(pipeline_with(sources, &snapshot)));

    let (status, v) = post_run(app.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "started");

    let (status, v) = post_run(app.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(v["status"], "busy");

    // once the first run finishes, a new one is accepted again
    let mut accepted = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if snapshot.exists() && post_run(app.clone()).await.0 == StatusCode::OK {
            accepted = true;
            break;
        }
    }
    assert!(accepted, "run lock should be released after the run");
}
