//! Summarization: provider abstraction + batch helper.
//! The production client talks to any OpenAI-compatible chat completions endpoint (Groq by default).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::ingest::types::NewsRecord;

pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Post-summarization artifact (snapshot + email).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummarizedItem {
    pub source: String,
    pub title: String,
    pub summary: String,
}

#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, title: &str, content: &str) -> Result<String>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynSummarizer = Arc<dyn Summarizer>;

pub struct ChatSummarizer {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatSummarizer {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("newslens/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building chat http client")?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Reads `GROQ_API_KEY` (+ optional `GROQ_MODEL`). A missing key is only warned about:
    /// every call then fails and the item is skipped.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("GROQ_API_KEY not set; summarization calls will fail");
        }
        let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(GROQ_CHAT_URL, &api_key, &model)
    }
}

fn build_prompt(title: &str, content: &str) -> String {
    format!(
        "You are a helpful news assistant.\n\
         Summarize the following news content into strictly 3-4 lines.\n\
         Capture the key points clearly.\n\n\
         IMPORTANT: Return ONLY the summary text. Do not start with \"Here is a summary\" or similar phrases.\n\n\
         Title: {title}\n\
         Content: {content}\n\n\
         Summary:"
    )
}

#[async_trait::async_trait]
impl Summarizer for ChatSummarizer {
    async fn summarize(&self, title: &str, content: &str) -> Result<String> {
        if self.api_key.is_empty() {
            bail!("no API key configured");
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let prompt = build_prompt(title, content);
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: &prompt,
            }],
            temperature: 0.0,
        };

        let body: Resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("chat completion request")?
            .error_for_status()
            .context("chat completion non-2xx")?
            .json()
            .await
            .context("chat completion body")?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("chat completion returned no choices"))
    }

    fn provider_name(&self) -> &'static str {
        "chat-completions"
    }
}

const CHATTY_PREFIXES: [&str; 4] = [
    "Here is a summary",
    "Here's a summary",
    "The following is a summary",
    "Summary:",
];

/// Strip chatty lead-ins the model adds despite the prompt.
pub fn clean_summary(raw: &str) -> String {
    let mut out = raw.trim().to_string();
    for prefix in CHATTY_PREFIXES {
        let starts = out
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if starts {
            out = out[prefix.len()..]
                .trim()
                .trim_start_matches(':')
                .trim()
                .to_string();
        }
    }
    out
}

/// Summarize each record in order. Failures are logged and the item skipped.
pub async fn summarize_all(records: &[NewsRecord], summarizer: &dyn Summarizer) -> Vec<SummarizedItem> {
    let total = records.len();
    let mut out = Vec::with_capacity(total);
    for (idx, rec) in records.iter().enumerate() {
        tracing::info!(item = idx + 1, total, title = %rec.title, "summarizing");
        match summarizer.summarize(&rec.title, &rec.content).await {
            Ok(raw) => {
                let summary = clean_summary(&raw);
                if summary.is_empty() {
                    tracing::warn!(title = %rec.title, "empty summary; skipping item");
                    counter!("summarize_failures_total").increment(1);
                    continue;
                }
                out.push(SummarizedItem {
                    source: rec.source.clone(),
                    title: rec.title.clone(),
                    summary,
                });
            }
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    provider = summarizer.provider_name(),
                    title = %rec.title,
                    "could not summarize item"
                );
                counter!("summarize_failures_total").increment(1);
            }
        }
    }
    out
}

/// Deterministic summarizer for tests/local runs: first sentence of the content.
pub struct MockSummarizer;

#[async_trait::async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, title: &str, content: &str) -> Result<String> {
        let first = content.split_terminator(". ").next().unwrap_or_default().trim();
        if first.is_empty() {
            Ok(title.to_string())
        } else {
            Ok(first.to_string())
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
