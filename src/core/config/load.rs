//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `PORTFOLIO_WORK_DIR`, `PORTFOLIO_LOG_LEVEL` and
//! `PORTFOLIO_BIND` env overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

use super::raw::{self, RawBlog, RawConfig, RawEmail, RawNews, RawServer};
use super::types::*;

/// Values that take precedence over the TOML file.
/// Tests pass these directly instead of mutating env vars.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides<'a> {
    pub work_dir: Option<&'a str>,
    pub log_level: Option<&'a str>,
    pub bind: Option<&'a str>,
}

/// Deep-merge two TOML values.
/// Tables are merged recursively: the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and `config/default.toml` does not exist, returns a built-in minimal default.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let work_dir_override = env::var("PORTFOLIO_WORK_DIR").ok();
    let log_level_override = env::var("PORTFOLIO_LOG_LEVEL").ok();
    let bind_override = env::var("PORTFOLIO_BIND").ok();
    let overrides = Overrides {
        work_dir: work_dir_override.as_deref(),
        log_level: log_level_override.as_deref(),
        bind: bind_override.as_deref(),
    };

    if let Some(path) = config_path {
        return load_from(Path::new(path), overrides);
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(default_path, overrides)
    } else {
        let builtin = RawConfig {
            server: RawServer {
                name: "portfolio".to_string(),
                work_dir: "~/.portfolio".to_string(),
                log_level: "info".to_string(),
                log_file: None,
                bind: raw::default_bind(),
            },
            blog: RawBlog::default(),
            news: RawNews::default(),
            email: RawEmail::default(),
        };
        Ok(resolve(builtin, overrides, secrets_from_env()))
    }
}

/// Load from an explicit path. Follows `[meta] base = "..."` inheritance
/// chains before resolving.
pub fn load_from(path: &Path, overrides: Overrides<'_>) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    Ok(resolve(parsed, overrides, secrets_from_env()))
}

fn secrets_from_env() -> Secrets {
    let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());
    Secrets {
        news_api_key: non_empty("NEWS_API_KEY"),
        email_api_key: non_empty("EMAIL_API_KEY"),
        cron_secret: non_empty("CRON_SECRET"),
        admin_token: non_empty("ADMIN_TOKEN"),
    }
}

fn resolve(parsed: RawConfig, overrides: Overrides<'_>, secrets: Secrets) -> Config {
    let s = parsed.server;

    let work_dir = expand_home(overrides.work_dir.unwrap_or(&s.work_dir));
    let log_level = overrides.log_level.unwrap_or(&s.log_level).to_string();
    let bind = overrides.bind.unwrap_or(&s.bind).to_string();
    let log_file = s
        .log_file
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(expand_home);

    let categories = parsed
        .news
        .categories
        .into_iter()
        .map(|c| c.trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty())
        .collect();

    Config {
        name: s.name,
        work_dir,
        log_level,
        log_file,
        server: ServerConfig { bind },
        blog: BlogConfig {
            data_path: expand_home(&parsed.blog.data_path),
            page_size: parsed.blog.page_size.max(1),
        },
        news: NewsConfig {
            api_base_url: parsed.news.api_base_url.trim_end_matches('/').to_string(),
            categories,
            country: parsed.news.country,
            page_size: parsed.news.page_size.max(1),
            fetch_limit: parsed.news.fetch_limit.clamp(1, 100),
            refresh_every_secs: parsed.news.refresh_every_secs,
            cleanup_every_secs: parsed.news.cleanup_every_secs,
            retention_days: parsed.news.retention_days.max(1),
            timeout_seconds: parsed.news.timeout_seconds.max(1),
        },
        email: EmailConfig {
            provider: parsed.email.provider,
            api_base_url: parsed.email.api_base_url,
            from: parsed.email.from,
            owner_address: parsed.email.owner_address,
            timeout_seconds: parsed.email.timeout_seconds.max(1),
        },
        secrets,
    }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
