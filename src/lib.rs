// src/lib.rs
// Public library surface for integration tests (and the binaries).

pub mod api;
pub mod metrics;
pub mod pipeline;
pub mod summarize;

// Multi-source ingest: adapters, extractor, aggregator, normalizer
pub mod ingest;

// Delivery of the finished brief
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router as router;
pub use crate::ingest::types::{NewsRecord, PlannedSource, SourceAdapter};
pub use crate::ingest::{produce_normalized_news, AggregateError};
pub use crate::pipeline::{NewsPipeline, PipelineReport};
pub use crate::summarize::SummarizedItem;
