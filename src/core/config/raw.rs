//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape: serde target before resolution.
#[derive(Deserialize)]
pub(super) struct RawConfig {
    pub server: RawServer,
    #[serde(default)]
    pub blog: RawBlog,
    #[serde(default)]
    pub news: RawNews,
    #[serde(default)]
    pub email: RawEmail,
}

#[derive(Deserialize)]
pub(super) struct RawServer {
    pub name: String,
    pub work_dir: String,
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default = "default_bind")]
    pub bind: String,
}

// ── Blog ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawBlog {
    #[serde(default = "default_blog_data_path")]
    pub data_path: String,
    #[serde(default = "default_blog_page_size")]
    pub page_size: usize,
}

impl Default for RawBlog {
    fn default() -> Self {
        Self {
            data_path: default_blog_data_path(),
            page_size: default_blog_page_size(),
        }
    }
}

// ── News ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawNews {
    #[serde(default = "default_news_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_news_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_news_country")]
    pub country: String,
    #[serde(default = "default_news_page_size")]
    pub page_size: usize,
    #[serde(default = "default_news_fetch_limit")]
    pub fetch_limit: usize,
    #[serde(default = "default_news_refresh_every_secs")]
    pub refresh_every_secs: u64,
    #[serde(default = "default_news_cleanup_every_secs")]
    pub cleanup_every_secs: u64,
    #[serde(default = "default_news_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawNews {
    fn default() -> Self {
        Self {
            api_base_url: default_news_api_base_url(),
            categories: default_news_categories(),
            country: default_news_country(),
            page_size: default_news_page_size(),
            fetch_limit: default_news_fetch_limit(),
            refresh_every_secs: default_news_refresh_every_secs(),
            cleanup_every_secs: default_news_cleanup_every_secs(),
            retention_days: default_news_retention_days(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

// ── Email ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawEmail {
    #[serde(default = "default_email_provider")]
    pub provider: String,
    #[serde(default = "default_email_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_email_from")]
    pub from: String,
    #[serde(default = "default_email_owner_address")]
    pub owner_address: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawEmail {
    fn default() -> Self {
        Self {
            provider: default_email_provider(),
            api_base_url: default_email_api_base_url(),
            from: default_email_from(),
            owner_address: default_email_owner_address(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

// ── Defaults ────────────────────────────────────────────────────────────────

pub(super) fn default_bind() -> String { "127.0.0.1:8080".to_string() }
pub(super) fn default_blog_data_path() -> String { "data/blog.json".to_string() }
pub(super) fn default_blog_page_size() -> usize { 9 }
pub(super) fn default_news_api_base_url() -> String { "https://newsapi.org/v2".to_string() }
pub(super) fn default_news_categories() -> Vec<String> { vec!["technology".to_string()] }
pub(super) fn default_news_country() -> String { "us".to_string() }
pub(super) fn default_news_page_size() -> usize { 12 }
pub(super) fn default_news_fetch_limit() -> usize { 50 }
pub(super) fn default_news_refresh_every_secs() -> u64 { 3600 }
pub(super) fn default_news_cleanup_every_secs() -> u64 { 86_400 }
pub(super) fn default_news_retention_days() -> u32 { 7 }
pub(super) fn default_email_provider() -> String { "dummy".to_string() }
pub(super) fn default_email_api_base_url() -> String { "https://api.resend.com/emails".to_string() }
pub(super) fn default_email_from() -> String { "Portfolio <noreply@localhost>".to_string() }
pub(super) fn default_email_owner_address() -> String { "owner@localhost".to_string() }
pub(super) fn default_timeout_seconds() -> u64 { 15 }
