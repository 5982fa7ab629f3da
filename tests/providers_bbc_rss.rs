// tests/providers_bbc_rss.rs
use std::sync::Arc;

use newslens::ingest::fetch::FixtureFetcher;
use newslens::ingest::providers::bbc_rss::{BbcRssProvider, BBC_RSS_URL};
use newslens::SourceAdapter;

const BBC_XML: &str = include_str!("fixtures/bbc_rss.xml");

#[tokio::test]
async fn summaries_are_used_verbatim_in_feed_order() {
    let fetcher = FixtureFetcher::new().with_page(BBC_RSS_URL, BBC_XML);
    let provider = BbcRssProvider::new(Arc::new(fetcher));

    let items = provider.fetch(2).await.expect("bbc parse ok");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Leaders meet for emergency summit on ceasefire");
    assert_eq!(items[0].content, "European leaders gather in London to agree a plan.");
    assert_eq!(
        items[0].url.as_deref(),
        Some("https://www.bbc.com/news/articles/c1111111111o")
    );
    assert_eq!(items[1].title, "Storm warning issued for northern coast");
    assert!(items.iter().all(|r| r.source == "BBC"));
}

#[tokio::test]
async fn limit_larger_than_feed_returns_everything() {
    let fetcher = FixtureFetcher::new().with_page(BBC_RSS_URL, BBC_XML);
    let provider = BbcRssProvider::new(Arc::new(fetcher));
    assert_eq!(provider.fetch(50).await.unwrap().len(), 3);
}

#[tokio::test]
async fn full_text_mode_prefers_article_body_and_falls_back_to_summary() {
    let page = r#"<html><body><article><p>Full first paragraph.</p><p>Second one.</p></article></body></html>"#;
    let fetcher = FixtureFetcher::new()
        .with_page(BBC_RSS_URL, BBC_XML)
        .with_page("https://www.bbc.com/news/articles/c1111111111o", page);
    let provider = BbcRssProvider::new(Arc::new(fetcher)).with_full_text(true);

    let items = provider.fetch(2).await.unwrap();
    assert_eq!(items[0].content, "Full first paragraph.\nSecond one.");
    // second page is not reachable: summary stays
    assert_eq!(items[1].content, "Gusts of up to 80mph are expected overnight.");
}

#[tokio::test]
async fn unreachable_feed_is_a_source_error() {
    let provider = BbcRssProvider::new(Arc::new(FixtureFetcher::new()));
    assert!(provider.fetch(3).await.is_err());
}
