//! NewsLens service: binary entrypoint.
//! Boots the Axum HTTP server with the ingest pipeline and Prometheus metrics wired in.

use newslens::api::{router_with_metrics, AppState};
use newslens::ingest::config::load_config_default;
use newslens::metrics::Metrics;
use newslens::NewsPipeline;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs; `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Shuttle may already have installed a subscriber; keep that one.
    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init()
    {
        tracing::debug!(error = %e, "tracing subscriber already set, not replacing it");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default()?;
    tracing::info!(
        channels = cfg.channels.len(),
        bbc = cfg.limits.bbc,
        cnn = cfg.limits.cnn,
        per_channel = cfg.limits.per_channel,
        "config loaded"
    );

    let pipeline = NewsPipeline::from_config(&cfg)?;
    let metrics = Metrics::init()?;
    let router = router_with_metrics(AppState::new(pipeline), &metrics);

    Ok(router.into())
}
