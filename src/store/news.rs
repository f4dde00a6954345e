//! `news_articles` collection: insert-or-ignore upserts, filtered paging,
//! stats and the retention sweep.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::pagination::{Page, PageRequest};

use super::{Store, format_ts, sha256_hex};

// ── Types ─────────────────────────────────────────────────────────────────────

/// A normalised article ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub source_name: Option<String>,
    pub image_url: Option<String>,
    pub category: String,
    pub published_at: DateTime<Utc>,
}

/// An article as read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredArticle {
    pub id: String,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub source_name: Option<String>,
    pub image_url: Option<String>,
    pub category: String,
    pub published_at: String,
    pub fetched_at: String,
}

/// Outcome of [`Store::upsert_articles`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertReport {
    pub inserted: usize,
    /// Articles whose URL was already stored.
    pub skipped: usize,
}

/// Optional listing filters. Both combine with AND.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring over title, description and source name.
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct NewsStats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub latest_published_at: Option<String>,
    pub latest_fetched_at: Option<String>,
}

const ARTICLE_COLUMNS: &str = "id, url, title, description, content, author, source_name, \
     image_url, category, published_at, fetched_at";

/// Shared WHERE clause: `?1` category (nullable), `?2` lowercase LIKE pattern
/// (nullable). Columns go through `fold_case` so non-ASCII letters match too.
const ARTICLE_WHERE: &str = "(?1 IS NULL OR category = ?1) AND \
     (?2 IS NULL OR fold_case(title) LIKE ?2 ESCAPE '\\' \
      OR fold_case(description) LIKE ?2 ESCAPE '\\' \
      OR fold_case(source_name) LIKE ?2 ESCAPE '\\')";

fn row_to_article(row: &Row<'_>) -> rusqlite::Result<StoredArticle> {
    Ok(StoredArticle {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        content: row.get(4)?,
        author: row.get(5)?,
        source_name: row.get(6)?,
        image_url: row.get(7)?,
        category: row.get(8)?,
        published_at: row.get(9)?,
        fetched_at: row.get(10)?,
    })
}

/// Turn a free-text query into a lowercase `LIKE` pattern, escaping `%`, `_`
/// and `\`. Blank queries yield `None` (no filter).
pub(crate) fn like_pattern(q: &str) -> Option<String> {
    let q = q.trim().to_lowercase();
    if q.is_empty() {
        return None;
    }
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for ch in q.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    Some(escaped)
}

// ── Operations ────────────────────────────────────────────────────────────────

impl Store {
    /// Insert every article whose URL is not stored yet. Existing rows are
    /// left untouched. Runs in one transaction.
    pub fn upsert_articles(&self, articles: &[NewArticle]) -> Result<UpsertReport, AppError> {
        let fetched_at = format_ts(Utc::now());
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut report = UpsertReport::default();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO news_articles (
                    id, url, title, description, content, author, source_name,
                    image_url, category, published_at, fetched_at, content_hash
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for article in articles {
                let changed = stmt.execute(params![
                    Uuid::now_v7().to_string(),
                    article.url,
                    article.title,
                    article.description,
                    article.content,
                    article.author,
                    article.source_name,
                    article.image_url,
                    article.category,
                    format_ts(article.published_at),
                    fetched_at,
                    sha256_hex(&article.url),
                ])?;
                if changed == 0 {
                    report.skipped += 1;
                } else {
                    report.inserted += 1;
                }
            }
        }
        tx.commit()?;
        debug!(inserted = report.inserted, skipped = report.skipped, "articles upserted");
        Ok(report)
    }

    /// Newest `published_at` first.
    pub fn list_articles(
        &self,
        filter: &ArticleFilter,
        req: PageRequest,
    ) -> Result<Page<StoredArticle>, AppError> {
        let category = filter.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let pattern = filter.q.as_deref().and_then(like_pattern);
        let conn = self.lock()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM news_articles WHERE {ARTICLE_WHERE}"),
            params![category, pattern],
            |row| row.get(0),
        )?;

        let total = total as usize;
        let offset = match i64::try_from(req.offset()) {
            Ok(offset) if req.offset() < total => offset,
            _ => return Ok(Page::new(Vec::new(), req, total)),
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM news_articles WHERE {ARTICLE_WHERE}
             ORDER BY published_at DESC, fetched_at DESC, id DESC
             LIMIT ?3 OFFSET ?4"
        ))?;
        let items = stmt
            .query_map(
                params![category, pattern, req.limit as i64, offset],
                row_to_article,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, req, total))
    }

    pub fn get_article(&self, id: &str) -> Result<Option<StoredArticle>, AppError> {
        let conn = self.lock()?;
        let article = conn
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM news_articles WHERE id = ?1"),
                params![id],
                row_to_article,
            )
            .optional()?;
        Ok(article)
    }

    pub fn count_articles(&self) -> Result<usize, AppError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM news_articles", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn article_stats(&self) -> Result<NewsStats, AppError> {
        let conn = self.lock()?;
        let (total, latest_published_at, latest_fetched_at): (i64, Option<String>, Option<String>) =
            conn.query_row(
                "SELECT COUNT(*), MAX(published_at), MAX(fetched_at) FROM news_articles",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let mut stmt =
            conn.prepare("SELECT category, COUNT(*) FROM news_articles GROUP BY category")?;
        let by_category = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(NewsStats {
            total: total as usize,
            by_category,
            latest_published_at,
            latest_fetched_at,
        })
    }

    /// Delete every article published strictly before `cutoff`.
    pub fn delete_articles_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, AppError> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM news_articles WHERE published_at < ?1",
            params![format_ts(cutoff)],
        )?;
        Ok(deleted)
    }
}
