//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `PORTFOLIO_WORK_DIR`, `PORTFOLIO_LOG_LEVEL` and
//! `PORTFOLIO_BIND` env overrides. Secrets (`NEWS_API_KEY`, `EMAIL_API_KEY`,
//! `CRON_SECRET`, `ADMIN_TOKEN`) come from the environment only.
//!
//! # Module layout
//!
//! - **types**: Public configuration structs (`Config`, `NewsConfig`, …).
//! - **raw**: Raw TOML deserialization types. These mirror the file shape
//!   and use serde defaults; kept private.
//! - **load**: Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{Overrides, expand_home, load, load_from};
pub use types::*;

#[cfg(test)]
impl Config {
    /// Safe `Config` for unit tests: dummy email, no API keys, no external calls.
    pub fn test_default(work_dir: &std::path::Path) -> Self {
        Self {
            name: "test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            log_file: None,
            server: ServerConfig { bind: raw::default_bind() },
            blog: BlogConfig {
                data_path: work_dir.join("blog.json"),
                page_size: raw::default_blog_page_size(),
            },
            news: NewsConfig {
                api_base_url: "http://localhost:0".into(),
                categories: vec!["technology".into()],
                country: "us".into(),
                page_size: raw::default_news_page_size(),
                fetch_limit: 10,
                refresh_every_secs: 0,
                cleanup_every_secs: 0,
                retention_days: 7,
                timeout_seconds: 1,
            },
            email: EmailConfig {
                provider: "dummy".into(),
                api_base_url: "http://localhost:0/emails".into(),
                from: "Test <noreply@example.com>".into(),
                owner_address: "owner@example.com".into(),
                timeout_seconds: 1,
            },
            secrets: Secrets::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::{NamedTempFile, TempDir};

    const MINIMAL_TOML: &str = r#"
[server]
name = "test-site"
work_dir = "~/.portfolio"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn write_named(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Overrides::default()).unwrap();
        assert_eq!(cfg.name, "test-site");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn log_file_is_optional_and_expanded() {
        let f = write_toml(MINIMAL_TOML);
        assert_eq!(load_from(f.path(), Overrides::default()).unwrap().log_file, None);

        let toml = format!("{MINIMAL_TOML}log_file = \"~/logs/portfolio.log\"\n");
        let f = write_toml(&toml);
        let cfg = load_from(f.path(), Overrides::default()).unwrap();
        let path = cfg.log_file.unwrap();
        assert!(!path.starts_with("~"));
        assert!(path.ends_with("logs/portfolio.log"));
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Overrides::default()).unwrap();
        assert_eq!(cfg.blog.page_size, 9);
        assert_eq!(cfg.news.categories, vec!["technology".to_string()]);
        assert_eq!(cfg.news.fetch_limit, 50);
        assert_eq!(cfg.news.retention_days, 7);
        assert_eq!(cfg.email.provider, "dummy");
    }

    #[test]
    fn news_section_is_normalised() {
        let toml = r#"
[server]
name = "x"
work_dir = "/tmp"
log_level = "info"

[news]
api_base_url = "https://news.example.com/v2/"
categories = [" Technology ", "", "science"]
fetch_limit = 500
"#;
        let f = write_toml(toml);
        let cfg = load_from(f.path(), Overrides::default()).unwrap();
        assert_eq!(cfg.news.api_base_url, "https://news.example.com/v2");
        assert_eq!(cfg.news.categories, vec!["technology", "science"]);
        assert_eq!(cfg.news.fetch_limit, 100);
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.portfolio");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".portfolio"));
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn relative_path_unchanged() {
        assert_eq!(expand_home("relative/path"), PathBuf::from("relative/path"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), Overrides::default());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn overrides_win() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = Overrides {
            work_dir: Some("/tmp/test-override"),
            log_level: Some("debug"),
            bind: Some("0.0.0.0:3000"),
        };
        let cfg = load_from(f.path(), overrides).unwrap();
        assert_eq!(cfg.work_dir, PathBuf::from("/tmp/test-override"));
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.server.bind, "0.0.0.0:3000");
    }

    #[test]
    fn overlay_keeps_base_fields() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", MINIMAL_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[server]
log_level = "debug"

[news]
retention_days = 3
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, Overrides::default()).unwrap();
        assert_eq!(cfg.name, "test-site");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.news.retention_days, 3);
    }

    #[test]
    fn missing_base_errors() {
        let dir = TempDir::new().unwrap();
        let overlay = r#"
[meta]
base = "nonexistent.toml"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let msg = load_from(&overlay_path, Overrides::default()).unwrap_err().to_string();
        assert!(msg.contains("cannot read"));
    }

    #[test]
    fn cycle_detection() {
        let dir = TempDir::new().unwrap();
        let self_path = dir.path().join("self.toml");
        let content = format!("[meta]\nbase = \"{}\"\n{MINIMAL_TOML}", self_path.display());
        std::fs::write(&self_path, content).unwrap();
        let msg = load_from(&self_path, Overrides::default()).unwrap_err().to_string();
        assert!(msg.contains("circular"));
    }

    #[test]
    fn secrets_debug_hides_values() {
        let secrets = Secrets {
            news_api_key: Some("super-secret".into()),
            ..Secrets::default()
        };
        let shown = format!("{secrets:?}");
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("<set>"));
    }
}
