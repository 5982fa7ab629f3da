//! One-shot runner: print today's normalized news, or run the full pipeline once.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use newslens::ingest::config::{load_config_default, load_config_from};
use newslens::ingest::{build_http_sources, produce_normalized_news};
use newslens::NewsPipeline;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "news_run", version, about = "Fetch, normalize and summarize the news")]
struct Cli {
    /// Config file (TOML or JSON); defaults to $NEWSLENS_CONFIG_PATH or config/newslens.*
    #[arg(long, short, env = "NEWSLENS_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized articles as JSON.
    Raw,
    /// Fetch, summarize, write the snapshot and email the brief.
    Run {
        /// Skip the email step.
        #[arg(long)]
        no_email: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config_default()?,
    };

    match cli.command {
        Command::Raw => {
            let sources = build_http_sources(&cfg)?;
            let articles = produce_normalized_news(&sources).await?;
            println!("{}", serde_json::to_string_pretty(&articles)?);
        }
        Command::Run { no_email } => {
            let pipeline = NewsPipeline::from_config(&cfg)?;
            let report = pipeline.run(!no_email).await?;
            tracing::info!(
                fetched = report.fetched,
                summarized = report.summarized,
                delivered = report.delivered,
                "pipeline completed"
            );
        }
    }
    Ok(())
}
