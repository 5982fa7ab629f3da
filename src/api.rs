use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::metrics::Metrics;
use crate::pipeline::{read_snapshot, NewsPipeline};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<NewsPipeline>,
    /// Held by the background run for its whole duration; at most one run at a time.
    run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pipeline: NewsPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "OK" }))
        .route("/news/raw", get(news_raw))
        .route("/news/summaries", get(news_summaries))
        .route("/pipeline/run", post(run_pipeline))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Same as `create_router`, plus `/metrics` from the installed Prometheus recorder.
pub fn router_with_metrics(state: AppState, metrics: &Metrics) -> Router {
    create_router(state).merge(metrics.router())
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, detail: impl ToString) -> ApiError {
    (status, Json(json!({ "detail": detail.to_string() })))
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": "online",
        "message": "NewsLens AI API. GET /news/raw for fresh articles, POST /pipeline/run to summarize and email.",
    }))
}

async fn news_raw(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let articles = state
        .pipeline
        .raw_news()
        .await
        .map_err(|e| api_error(StatusCode::SERVICE_UNAVAILABLE, e))?;
    Ok(Json(json!({ "count": articles.len(), "articles": articles })))
}

async fn news_summaries(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    match read_snapshot(state.pipeline.snapshot_path()).await {
        Ok(Some(items)) => Ok(Json(json!(items))),
        Ok(None) => Ok(Json(json!({
            "message": "No summaries found. Run /pipeline/run first."
        }))),
        Err(e) => {
            tracing::error!(error = ?e, "reading snapshot failed");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e))
        }
    }
}

fn default_send_email() -> bool {
    true
}

#[derive(serde::Deserialize)]
struct RunParams {
    #[serde(default = "default_send_email")]
    send_email: bool,
}

async fn run_pipeline(
    State(state): State<AppState>,
    Query(params): Query<RunParams>,
) -> (StatusCode, Json<Value>) {
    let Ok(guard) = state.run_lock.clone().try_lock_owned() else {
        tracing::info!("pipeline run requested while another is in progress");
        return (
            StatusCode::CONFLICT,
            Json(json!({
                "status": "busy",
                "message": "A pipeline run is already in progress.",
            })),
        );
    };

    let pipeline = state.pipeline.clone();
    let send_email = params.send_email;
    tokio::spawn(async move {
        let _guard = guard;
        tracing::info!(send_email, "background pipeline starting");
        match pipeline.run(send_email).await {
            Ok(report) => tracing::info!(?report, "background pipeline complete"),
            Err(e) => tracing::error!(error = ?e, "background pipeline failed"),
        }
    });
    (
        StatusCode::OK,
        Json(json!({
            "status": "started",
            "message": "The news pipeline is running in the background.",
        })),
    )
}
