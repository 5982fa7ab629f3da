// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::fetch::{BROWSER_USER_AGENT, DEFAULT_TIMEOUT_SECS};
use crate::ingest::providers::bbc_rss::BBC_RSS_URL;
use crate::ingest::providers::cnn_rss::CNN_RSS_URL;
use crate::ingest::providers::youtube::{
    default_channels, VideoChannel, DEFAULT_SEARCH_WINDOW, YOUTUBE_FEED_TEMPLATE,
};

pub const ENV_PATH: &str = "NEWSLENS_CONFIG_PATH";

/// How many records each source contributes per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchLimits {
    pub bbc: usize,
    pub cnn: usize,
    /// Accepted videos per channel.
    pub per_channel: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            bbc: 3,
            cnn: 3,
            per_channel: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedUrls {
    pub bbc: String,
    pub cnn: String,
    pub video_template: String,
}

impl Default for FeedUrls {
    fn default() -> Self {
        Self {
            bbc: BBC_RSS_URL.to_string(),
            cnn: CNN_RSS_URL.to_string(),
            video_template: YOUTUBE_FEED_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub limits: FetchLimits,
    pub feeds: FeedUrls,
    pub channels: Vec<VideoChannel>,
    pub search_window: usize,
    pub bbc_full_text: bool,
    pub http: HttpSettings,
    pub snapshot_path: PathBuf,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            limits: FetchLimits::default(),
            feeds: FeedUrls::default(),
            channels: default_channels(),
            search_window: DEFAULT_SEARCH_WINDOW,
            bbc_full_text: false,
            http: HttpSettings::default(),
            snapshot_path: PathBuf::from("summarized_news.json"),
        }
    }
}

impl NewsConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.feeds.video_template.contains("{channel_id}") {
            bail!("feeds.video_template must contain {{channel_id}}");
        }
        if let Some(ch) = self.channels.iter().find(|c| c.id.trim().is_empty()) {
            bail!("channel '{}' has an empty id", ch.name);
        }
        if self.http.timeout_secs == 0 {
            bail!("http.timeout_secs must be > 0");
        }
        Ok(())
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<NewsConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load config using env var + fallbacks:
/// 1) $NEWSLENS_CONFIG_PATH
/// 2) config/newslens.toml
/// 3) config/newslens.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<NewsConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/newslens.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/newslens.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(NewsConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<NewsConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        // Unknown extension: JSON documents start with '{'.
        _ if s.trim_start().starts_with('{') => Ok(serde_json::from_str(s)?),
        _ => Ok(toml::from_str(s)?),
    }
}
