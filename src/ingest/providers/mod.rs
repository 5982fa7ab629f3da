// src/ingest/providers/mod.rs
pub mod bbc_rss;
pub mod cnn_rss;
pub mod youtube;
