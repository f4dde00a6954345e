//! News ingestion pipeline: fetch from the external source, dedupe, persist,
//! page/search, and sweep out stale articles.
//!
//! - **client**: reqwest adapter for the NewsAPI-compatible endpoint.
//! - **ingest**: `refresh` and `cleanup`, the two timed sweeps.

pub mod client;
pub mod ingest;

use thiserror::Error;

pub use client::NewsClient;
pub use ingest::{CleanupReport, RefreshReport, cleanup, refresh};

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("NEWS_API_KEY is not set")]
    MissingKey,
    #[error("news request failed: {0}")]
    Request(String),
    #[error("news provider returned HTTP {status}: {message}")]
    Upstream {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("failed to decode news response: {0}")]
    Decode(String),
}
