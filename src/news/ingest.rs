//! The two timed sweeps of the news pipeline.
//!
//! `refresh`: fetch every configured category → dedupe by URL → upsert.
//! `cleanup`: delete articles older than the retention window.
//!
//! Neither sweep is transactional across the fetch and the store write, and
//! two overlapping refreshes are not coordinated beyond the store's unique
//! URL constraint.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::store::{NewArticle, Store};

use super::{NewsClient, NewsError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Articles returned by the source across all categories (after normalisation).
    pub fetched: usize,
    /// Articles left after dropping in-batch duplicate URLs.
    pub unique: usize,
    pub inserted: usize,
    /// Unique articles already present in the store.
    pub skipped: usize,
    pub failed_categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: usize,
    /// Articles published before this instant were removed.
    pub cutoff: String,
}

/// Keep the first occurrence of every URL, preserving order.
pub fn dedupe_by_url(articles: Vec<NewArticle>) -> Vec<NewArticle> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|a| seen.insert(a.url.clone()))
        .collect()
}

/// Pull every category and persist the new articles.
///
/// A failing category is logged and reported; the rest still run. If every
/// category fails, the last error is returned.
pub async fn refresh(
    client: &NewsClient,
    store: &Store,
    categories: &[String],
    fetch_limit: usize,
) -> Result<RefreshReport, AppError> {
    if !client.has_key() {
        return Err(NewsError::MissingKey.into());
    }
    if categories.is_empty() {
        warn!("news refresh: no categories configured");
        return Ok(RefreshReport::default());
    }

    let mut batch = Vec::new();
    let mut failed_categories = Vec::new();
    let mut last_error = None;

    for category in categories {
        match client.top_headlines(category, fetch_limit).await {
            Ok(articles) => batch.extend(articles),
            Err(e) => {
                warn!(%category, error = %e, "news refresh: category fetch failed");
                failed_categories.push(category.clone());
                last_error = Some(e);
            }
        }
    }

    if failed_categories.len() == categories.len() {
        if let Some(e) = last_error {
            return Err(e.into());
        }
    }

    let fetched = batch.len();
    let unique_articles = dedupe_by_url(batch);
    let unique = unique_articles.len();

    let upsert = store.run(move |s| s.upsert_articles(&unique_articles)).await?;

    let report = RefreshReport {
        fetched,
        unique,
        inserted: upsert.inserted,
        skipped: upsert.skipped,
        failed_categories,
    };
    info!(
        fetched = report.fetched,
        unique = report.unique,
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failed_categories.len(),
        "news refresh complete"
    );
    Ok(report)
}

/// Delete articles whose `published_at` is older than `now - retention_days`.
pub async fn cleanup(
    store: &Store,
    retention_days: u32,
    now: DateTime<Utc>,
) -> Result<CleanupReport, AppError> {
    let cutoff = now - Duration::days(i64::from(retention_days));
    let deleted = store.run(move |s| s.delete_articles_older_than(cutoff)).await?;
    let cutoff = crate::store::format_ts(cutoff);
    info!(deleted, %cutoff, "news cleanup complete");
    Ok(CleanupReport { deleted, cutoff })
}
