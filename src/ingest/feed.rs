// src/ingest/feed.rs
//! RSS 2.0 and Atom feed parsing into one entry shape.

use anyhow::{Context, Result};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
    /// Only set for video feeds (`yt:videoId`).
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

/// Parse an RSS 2.0 document. Entries keep feed order; fields are trimmed.
pub fn parse_rss(xml: &str) -> Result<Vec<FeedEntry>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

    let out: Vec<FeedEntry> = rss
        .channel
        .item
        .into_iter()
        .map(|it| FeedEntry {
            title: it.title.unwrap_or_default().trim().to_string(),
            link: it.link.unwrap_or_default().trim().to_string(),
            summary: it.description.unwrap_or_default().trim().to_string(),
            video_id: None,
        })
        .collect();

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("ingest_feed_entries_total").increment(out.len() as u64);
    Ok(out)
}

#[derive(Clone, Copy)]
enum AtomField {
    Title,
    Summary,
    VideoId,
}

/// Parse an Atom document (YouTube channel feeds). Namespace prefixes are ignored,
/// so `yt:videoId` and `media:description` are matched by local name.
pub fn parse_atom(xml: &str) -> Result<Vec<FeedEntry>> {
    let t0 = std::time::Instant::now();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut out = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<AtomField> = None;

    loop {
        match reader.read_event().context("parsing atom xml")? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"entry" {
                    current = Some(FeedEntry::default());
                    continue;
                }
                if let Some(entry) = current.as_mut() {
                    field = match e.local_name().as_ref() {
                        b"title" => Some(AtomField::Title),
                        b"summary" | b"description" => Some(AtomField::Summary),
                        b"videoId" => Some(AtomField::VideoId),
                        b"link" => {
                            take_link(entry, &e)?;
                            None
                        }
                        _ => None,
                    };
                }
            }
            Event::Empty(e) => {
                if let Some(entry) = current.as_mut() {
                    if e.local_name().as_ref() == b"link" {
                        take_link(entry, &e)?;
                    }
                }
            }
            Event::Text(t) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let text = t.unescape().context("unescaping atom text")?;
                    set_field(entry, f, text.trim());
                }
            }
            Event::CData(c) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let raw = c.into_inner();
                    set_field(entry, f, String::from_utf8_lossy(&raw).trim());
                }
            }
            Event::End(e) => {
                field = None;
                if e.local_name().as_ref() == b"entry" {
                    if let Some(mut entry) = current.take() {
                        if entry.video_id.is_none() {
                            entry.video_id = video_id_from_link(&entry.link);
                        }
                        out.push(entry);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("ingest_feed_entries_total").increment(out.len() as u64);
    Ok(out)
}

// First value wins: an entry's own <title> precedes <media:title>.
fn set_field(entry: &mut FeedEntry, field: AtomField, text: &str) {
    match field {
        AtomField::Title if entry.title.is_empty() => entry.title = text.to_string(),
        AtomField::Summary if entry.summary.is_empty() => entry.summary = text.to_string(),
        AtomField::VideoId if entry.video_id.is_none() && !text.is_empty() => {
            entry.video_id = Some(text.to_string())
        }
        _ => {}
    }
}

fn take_link(entry: &mut FeedEntry, e: &BytesStart<'_>) -> Result<()> {
    let mut href = None;
    let mut rel = None;
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().context("unescaping link attribute")?;
        match attr.key.local_name().as_ref() {
            b"href" => href = Some(value.into_owned()),
            b"rel" => rel = Some(value.into_owned()),
            _ => {}
        }
    }
    let is_alternate = rel.as_deref().map_or(true, |r| r == "alternate");
    if let (Some(h), true) = (href, is_alternate) {
        if entry.link.is_empty() {
            entry.link = h.trim().to_string();
        }
    }
    Ok(())
}

fn video_id_from_link(link: &str) -> Option<String> {
    let id = url_query_value(link, "v")?;
    (!id.is_empty()).then_some(id)
}

fn url_query_value(link: &str, key: &str) -> Option<String> {
    let (_, query) = link.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
