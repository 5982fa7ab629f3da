use anyhow::{Context, Result};
use chrono::NaiveDate;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::Deliverer;
use crate::summarize::SummarizedItem;

pub struct EmailDeliverer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} missing"))
}

impl EmailDeliverer {
    /// `SMTP_HOST` (default smtp.gmail.com), `GMAIL_USER`, `GMAIL_APP_PASSWORD`,
    /// `NEWS_EMAIL_TO` (defaults to the sender).
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string());
        let user = required_env("GMAIL_USER")?;
        let pass = required_env("GMAIL_APP_PASSWORD")?;
        let to_addr = std::env::var("NEWS_EMAIL_TO").unwrap_or_else(|_| user.clone());

        let from: Mailbox = user.parse().context("invalid GMAIL_USER")?;
        let to: Mailbox = to_addr.parse().context("invalid NEWS_EMAIL_TO")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();

        Ok(Self { mailer, from, to })
    }
}

/// Plain-text brief: one numbered block per item.
pub fn render_brief(items: &[SummarizedItem], date: NaiveDate) -> String {
    let mut body = format!("NewsLens AI Daily Brief - {}\n\n", date.format("%Y-%m-%d"));
    for (idx, it) in items.iter().enumerate() {
        body.push_str(&format!("{}. [{}] {}\n{}\n\n", idx + 1, it.source, it.title, it.summary));
    }
    body.push_str(&format!("{} stories.\n", items.len()));
    body
}

#[async_trait::async_trait]
impl Deliverer for EmailDeliverer {
    async fn deliver(&self, items: &[SummarizedItem]) -> Result<()> {
        if items.is_empty() {
            tracing::info!("nothing to deliver");
            return Ok(());
        }
        let today = chrono::Local::now().date_naive();
        let subject = format!("NewsLens AI Daily Brief - {}", today.format("%Y-%m-%d"));

        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(render_brief(items, today))
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        tracing::info!(count = items.len(), to = %self.to, "brief emailed");
        Ok(())
    }
}
