//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs that the server consumes.
//! Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;

// ── Server ──────────────────────────────────────────────────────────────────

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the axum listener to.
    pub bind: String,
}

// ── Blog ────────────────────────────────────────────────────────────────────

/// Static blog dataset configuration.
#[derive(Debug, Clone)]
pub struct BlogConfig {
    /// Path to the JSON post array.
    pub data_path: PathBuf,
    /// Default page size for `/api/blog`.
    pub page_size: usize,
}

// ── News ────────────────────────────────────────────────────────────────────

/// News ingestion configuration (`[news]`).
#[derive(Debug, Clone)]
pub struct NewsConfig {
    /// Base URL of the NewsAPI-compatible endpoint, without a trailing path.
    pub api_base_url: String,
    /// Categories fetched on every refresh, in order.
    pub categories: Vec<String>,
    pub country: String,
    /// Default page size for `/api/news`.
    pub page_size: usize,
    /// Articles requested per category per refresh (1..=100).
    pub fetch_limit: usize,
    /// Refresh timer period; `0` disables the timer.
    pub refresh_every_secs: u64,
    /// Cleanup timer period; `0` disables the timer.
    pub cleanup_every_secs: u64,
    pub retention_days: u32,
    pub timeout_seconds: u64,
}

// ── Email ───────────────────────────────────────────────────────────────────

/// Transactional email configuration (`[email]`).
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// `"dummy"` or `"http"`.
    pub provider: String,
    /// Send endpoint for the `http` provider.
    pub api_base_url: String,
    /// `From:` header for every outgoing message.
    pub from: String,
    /// Recipient of submission notifications.
    pub owner_address: String,
    pub timeout_seconds: u64,
}

// ── Secrets ─────────────────────────────────────────────────────────────────

/// Env-only secrets. Never sourced from TOML.
#[derive(Clone, Default)]
pub struct Secrets {
    /// `NEWS_API_KEY`
    pub news_api_key: Option<String>,
    /// `EMAIL_API_KEY`
    pub email_api_key: Option<String>,
    /// `CRON_SECRET`: guards the refresh/cleanup hooks.
    pub cron_secret: Option<String>,
    /// `ADMIN_TOKEN`: guards stats and schedule listing.
    pub admin_token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("news_api_key", &mark(&self.news_api_key))
            .field("email_api_key", &mark(&self.email_api_key))
            .field("cron_secret", &mark(&self.cron_secret))
            .field("admin_token", &mark(&self.admin_token))
            .finish()
    }
}

// ── Top-level ───────────────────────────────────────────────────────────────

/// Fully-resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    /// Working directory for persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    /// Append logs here instead of stderr. `--log-file` takes precedence.
    pub log_file: Option<PathBuf>,
    pub server: ServerConfig,
    pub blog: BlogConfig,
    pub news: NewsConfig,
    pub email: EmailConfig,
    pub secrets: Secrets,
}
