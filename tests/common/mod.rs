#![allow(dead_code)]

use std::path::Path;

use portfolio_server::blog::BlogCatalog;
use portfolio_server::config::{self, Config, Overrides};
use portfolio_server::cron::{self, CronJob};
use portfolio_server::mail::EmailProvider;
use portfolio_server::mail::providers::dummy::DummyMailer;
use portfolio_server::news::NewsClient;
use portfolio_server::state::AppState;
use portfolio_server::store::Store;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const CRON_SECRET: &str = "cron-secret";
pub const ADMIN_TOKEN: &str = "admin-token";

pub const BLOG_JSON: &str = r#"[
  {"slug":"newest","title":"Newest post","excerpt":"About Rust","content":"full body","author":"Me",
   "category":"Engineering","tags":["rust"],"publishedAt":"2024-05-01","featured":true,"readTimeMinutes":5},
  {"slug":"middle","title":"Middle post","excerpt":"About SQLite","content":"full body","author":"Me",
   "category":"Engineering","tags":["sqlite","rust"],"publishedAt":"2024-03-01","featured":false,"readTimeMinutes":3},
  {"slug":"oldest","title":"Oldest post","excerpt":"Hello","content":"full body","author":"Me",
   "category":"Life","tags":["meta"],"publishedAt":"2023-12-01","featured":false,"readTimeMinutes":1}
]"#;

/// Write a config and blog file into `dir` and load them the way `main` does.
pub fn config(dir: &Path, news_base_url: &str) -> Config {
    std::fs::write(dir.join("blog.json"), BLOG_JSON).unwrap();
    let toml = format!(
        r#"
[server]
name = "test-site"
work_dir = "{work}"
log_level = "info"

[blog]
data_path = "{blog}"

[news]
api_base_url = "{news_base_url}"
categories = ["technology", "science"]
fetch_limit = 10
refresh_every_secs = 0
cleanup_every_secs = 0
retention_days = 7
timeout_seconds = 5
"#,
        work = dir.join("data").display(),
        blog = dir.join("blog.json").display(),
    );
    let path = dir.join("config.toml");
    std::fs::write(&path, toml).unwrap();

    let mut cfg = config::load_from(&path, Overrides::default()).unwrap();
    cfg.secrets.news_api_key = Some("news-key".into());
    cfg.secrets.email_api_key = None;
    cfg.secrets.cron_secret = Some(CRON_SECRET.into());
    cfg.secrets.admin_token = Some(ADMIN_TOKEN.into());
    cfg
}

pub struct Harness {
    pub state: AppState,
    pub mailer: DummyMailer,
    pub jobs: mpsc::Receiver<CronJob>,
    pub shutdown: CancellationToken,
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Full application state over a real on-disk store and a dummy mailer.
pub fn harness(cfg: &Config) -> Harness {
    let store = Store::open(&cfg.work_dir).unwrap();
    let blog = BlogCatalog::load(&cfg.blog.data_path, cfg.blog.page_size).unwrap();
    let news = NewsClient::new(&cfg.news, cfg.secrets.news_api_key.clone()).unwrap();
    let mailer = DummyMailer::default();
    let shutdown = CancellationToken::new();
    let (job_tx, jobs) = mpsc::channel(8);
    let cron = cron::spawn(job_tx, shutdown.clone());
    let state = AppState::new(cfg, store, blog, news, EmailProvider::Dummy(mailer.clone()), cron);
    Harness { state, mailer, jobs, shutdown }
}

/// NewsAPI-shaped body with one article per `(url, title, published_at)`.
pub fn headlines(articles: &[(&str, &str, &str)]) -> String {
    let items: Vec<serde_json::Value> = articles
        .iter()
        .map(|(url, title, published)| {
            serde_json::json!({
                "source": {"id": null, "name": "Wire"},
                "author": "Reporter",
                "title": title,
                "description": format!("About {title}"),
                "url": url,
                "urlToImage": null,
                "publishedAt": published,
                "content": null
            })
        })
        .collect();
    serde_json::json!({"status": "ok", "totalResults": items.len(), "articles": items}).to_string()
}
