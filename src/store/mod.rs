//! Document store: SQLite-backed persistence for news articles and contact
//! submissions.
//!
//! ## Storage layout
//! ```text
//! {work_dir}/
//! └── portfolio.db     # news_articles + contact_submissions
//! ```
//!
//! One connection, guarded by a mutex. All methods are synchronous; async
//! callers go through [`Store::run`], which hops onto the blocking pool.

pub mod news;
pub mod submissions;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::AppError;

pub use news::{ArticleFilter, NewArticle, NewsStats, StoredArticle, UpsertReport};
pub use submissions::{NewSubmission, SubmissionKind, SubmissionStats};

/// SQLite database file name inside `work_dir`.
pub const DB_FILENAME: &str = "portfolio.db";

/// Schema version stored in `PRAGMA user_version`.
/// Increment when the DDL changes; add a migration path in `init_db`.
const SCHEMA_VERSION: i64 = 1;

/// Cheap to clone: the connection is shared.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) `{work_dir}/portfolio.db`, creating `work_dir` if needed.
    pub fn open(work_dir: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(work_dir).map_err(|e| {
            AppError::Store(format!("cannot create work dir {}: {e}", work_dir.display()))
        })?;
        let db_path = work_dir.join(DB_FILENAME);
        let conn = Connection::open(&db_path)
            .map_err(|e| AppError::Store(format!("open {}: {e}", db_path.display())))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| AppError::Store(format!("set journal_mode WAL: {e}")))?;
        apply_pragmas(&conn)?;
        let store = Self::from_conn(conn)?;
        info!(path = %db_path.display(), "document store opened");
        Ok(store)
    }

    /// Private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Store(format!("open in-memory db: {e}")))?;
        apply_pragmas(&conn)?;
        Self::from_conn(conn)
    }

    fn from_conn(conn: Connection) -> Result<Self, AppError> {
        init_db(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::Store("connection lock poisoned".into()))
    }

    /// Run a synchronous store operation on the blocking thread pool.
    pub async fn run<F, R>(&self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&Store) -> Result<R, AppError> + Send + 'static,
        R: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| AppError::Store(format!("blocking task failed: {e}")))?
    }
}

/// Pragmas applied to every connection:
/// - `foreign_keys = ON`
/// - `busy_timeout = 5000`: wait up to 5 s before returning `SQLITE_BUSY`.
fn apply_pragmas(conn: &Connection) -> Result<(), AppError> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| AppError::Store(format!("set foreign_keys ON: {e}")))?;
    conn.pragma_update(None, "busy_timeout", 5000)
        .map_err(|e| AppError::Store(format!("set busy_timeout: {e}")))?;
    register_functions(conn)
}

/// `fold_case(text)`: Unicode lowercase. The built-in `lower()` and `LIKE`
/// only fold ASCII. NULL stays NULL.
fn register_functions(conn: &Connection) -> Result<(), AppError> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )
    .map_err(|e| AppError::Store(format!("register fold_case: {e}")))
}

fn init_db(conn: &Connection) -> Result<(), AppError> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| AppError::Store(format!("read user_version: {e}")))?;

    match version {
        0 => {
            init_schema(conn)?;
            debug!(version = SCHEMA_VERSION, "store schema created");
            Ok(())
        }
        SCHEMA_VERSION => Ok(()),
        other => Err(AppError::Store(format!(
            "unsupported schema version {other} (expected {SCHEMA_VERSION})"
        ))),
    }
}

/// v1 schema.
///
/// - `news_articles`: one row per article URL; `url` is UNIQUE so repeated
///   fetches of the same story are ignored on insert.
/// - `contact_submissions`: one row per accepted form post; `details` is a
///   JSON object holding the variant-specific fields.
fn init_schema(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS news_articles (
            id TEXT PRIMARY KEY,
            url TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            description TEXT,
            content TEXT,
            author TEXT,
            source_name TEXT,
            image_url TEXT,
            category TEXT NOT NULL,
            published_at TEXT NOT NULL,
            fetched_at TEXT NOT NULL,
            content_hash TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_news_published ON news_articles(published_at);
        CREATE INDEX IF NOT EXISTS idx_news_category ON news_articles(category);

        CREATE TABLE IF NOT EXISTS contact_submissions (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            subject TEXT,
            message TEXT NOT NULL,
            details TEXT NOT NULL,
            created_at TEXT NOT NULL,
            ack_sent INTEGER NOT NULL DEFAULT 0,
            notify_sent INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_submissions_created ON contact_submissions(created_at);

        PRAGMA user_version = 1;
        ",
    )
    .map_err(|e| AppError::Store(format!("initialize schema: {e}")))
}

// ── Utility functions ─────────────────────────────────────────────────────────

/// Lowercase hex SHA-256 of `content`.
pub(crate) fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Canonical timestamp format for every stored time: RFC 3339, UTC, second
/// precision, `Z` suffix. Lexicographic order equals chronological order.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
