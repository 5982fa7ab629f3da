// src/ingest/transcript.rs
//! Transcript retrieval for video entries.
//!
//! The YouTube client reads the caption track list embedded in the watch page
//! (`"captionTracks":[...]`), picks a track and downloads its timed-text XML.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::ingest::fetch::BROWSER_USER_AGENT;

/// Why a video yielded no transcript. Every variant means "skip this entry".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("video unavailable")]
    VideoUnavailable,
    #[error("transcripts are disabled for this video")]
    TranscriptsDisabled,
    #[error("no transcript found")]
    NoTranscriptFound,
    #[error("request blocked by the video host")]
    Blocked,
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed transcript data: {0}")]
    Parse(String),
}

#[async_trait::async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn transcript(&self, video_id: &str) -> Result<String, TranscriptError>;
}

#[derive(Debug, Clone, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode", default)]
    language_code: String,
    /// "asr" for auto-generated tracks.
    #[serde(default)]
    kind: Option<String>,
}

pub struct YoutubeTranscriptClient {
    http: reqwest::Client,
    preferred_language: String,
}

impl YoutubeTranscriptClient {
    pub fn new(timeout_secs: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("building transcript http client")?;
        Ok(Self {
            http,
            preferred_language: "en".to_string(),
        })
    }

    pub fn with_language(mut self, code: &str) -> Self {
        self.preferred_language = code.to_string();
        self
    }

    async fn get_text(&self, url: &str) -> Result<String, TranscriptError> {
        let resp = self
            .http
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| TranscriptError::Network(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscriptError::Blocked);
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| TranscriptError::Network(e.to_string()))?;
        resp.text()
            .await
            .map_err(|e| TranscriptError::Network(e.to_string()))
    }
}

#[async_trait::async_trait]
impl TranscriptSource for YoutubeTranscriptClient {
    async fn transcript(&self, video_id: &str) -> Result<String, TranscriptError> {
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        let page = self.get_text(&watch_url).await?;
        let tracks = caption_tracks_from_watch_page(&page)?;
        let track = pick_track(&tracks, &self.preferred_language)
            .ok_or(TranscriptError::NoTranscriptFound)?;
        let xml = self.get_text(&track.base_url).await?;
        let text = parse_timedtext(&xml)?;
        if text.is_empty() {
            return Err(TranscriptError::NoTranscriptFound);
        }
        Ok(text)
    }
}

fn caption_tracks_from_watch_page(page: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    const MARKER: &str = "\"captionTracks\":";
    let Some(start) = page.find(MARKER) else {
        if page.contains("class=\"g-recaptcha\"") {
            return Err(TranscriptError::Blocked);
        }
        if page.contains("\"playabilityStatus\":{\"status\":\"ERROR\"") {
            return Err(TranscriptError::VideoUnavailable);
        }
        return Err(TranscriptError::TranscriptsDisabled);
    };
    // The array is followed by the rest of the player JSON; read exactly one value.
    let rest = &page[start + MARKER.len()..];
    let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Vec<CaptionTrack>>();
    match stream.next() {
        Some(Ok(tracks)) if !tracks.is_empty() => Ok(tracks),
        Some(Ok(_)) => Err(TranscriptError::TranscriptsDisabled),
        Some(Err(e)) => Err(TranscriptError::Parse(e.to_string())),
        None => Err(TranscriptError::Parse("empty caption track list".into())),
    }
}

/// Manual track in the preferred language, then any track in it, then the first one.
fn pick_track<'a>(tracks: &'a [CaptionTrack], lang: &str) -> Option<&'a CaptionTrack> {
    let in_lang = |t: &&CaptionTrack| t.language_code == lang || t.language_code.starts_with(&format!("{lang}-"));
    tracks
        .iter()
        .filter(in_lang)
        .find(|t| t.kind.as_deref() != Some("asr"))
        .or_else(|| tracks.iter().find(in_lang))
        .or_else(|| tracks.first())
}

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// `<transcript><text start=".." dur="..">snippet</text>...</transcript>` → snippets joined
/// with single spaces. Snippets are HTML-escaped a second time inside the XML.
fn parse_timedtext(xml: &str) -> Result<String, TranscriptError> {
    let mut reader = Reader::from_str(xml);
    let mut snippets: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"text" => {
                in_text = true;
                buf.clear();
            }
            Ok(Event::Text(t)) if in_text => {
                let raw = t.unescape().map_err(|e| TranscriptError::Parse(e.to_string()))?;
                buf.push_str(&raw);
            }
            Ok(Event::CData(c)) if in_text => {
                buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"text" => {
                in_text = false;
                let decoded = html_escape::decode_html_entities(&buf);
                let clean = RE_WS.replace_all(decoded.trim(), " ");
                if !clean.is_empty() {
                    snippets.push(clean.into_owned());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(TranscriptError::Parse(e.to_string())),
        }
    }

    Ok(snippets.join(" "))
}

// --- Test helper ---
/// Canned transcript outcomes keyed by video id. Unknown ids and blank transcripts are
/// `NoTranscriptFound`, as with the real client.
#[derive(Default, Clone)]
pub struct FixtureTranscripts {
    outcomes: HashMap<String, Result<String, TranscriptError>>,
}

impl FixtureTranscripts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcript(mut self, video_id: &str, text: &str) -> Self {
        self.outcomes.insert(video_id.to_string(), Ok(text.to_string()));
        self
    }

    pub fn with_error(mut self, video_id: &str, err: TranscriptError) -> Self {
        self.outcomes.insert(video_id.to_string(), Err(err));
        self
    }
}

#[async_trait::async_trait]
impl TranscriptSource for FixtureTranscripts {
    async fn transcript(&self, video_id: &str) -> Result<String, TranscriptError> {
        match self.outcomes.get(video_id) {
            Some(Ok(text)) if !text.trim().is_empty() => Ok(text.clone()),
            Some(Err(e)) => Err(e.clone()),
            _ => Err(TranscriptError::NoTranscriptFound),
        }
    }
}
