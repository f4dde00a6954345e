//! NewsAPI-compatible headline source (`GET {base}/top-headlines`).
//!
//! All wire types are private to this module: callers only ever see
//! normalised [`NewArticle`]s.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::NewsConfig;
use crate::store::NewArticle;

use super::NewsError;

/// Placeholder the provider substitutes for withdrawn stories.
const REMOVED_MARKER: &str = "[Removed]";

/// Built once at startup; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: Client,
    api_base_url: String,
    country: String,
    api_key: Option<String>,
}

impl NewsClient {
    /// `api_key` is sourced from `NEWS_API_KEY`. A client without a key can be
    /// built (so the server still starts) but every fetch fails with
    /// [`NewsError::MissingKey`].
    pub fn new(config: &NewsConfig, api_key: Option<String>) -> Result<Self, NewsError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("portfolio-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NewsError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            api_key,
        })
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch up to `limit` headlines for `category`, normalised and tagged
    /// with that category. Unusable entries are dropped.
    pub async fn top_headlines(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<NewArticle>, NewsError> {
        let key = self.api_key.as_deref().ok_or(NewsError::MissingKey)?;
        let url = format!("{}/top-headlines", self.api_base_url);
        let page_size = limit.clamp(1, 100).to_string();

        debug!(%url, category, page_size = %page_size, "fetching headlines");

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", key)
            .query(&[
                ("country", self.country.as_str()),
                ("category", category),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, "news HTTP request failed (transport)");
                NewsError::Request(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NewsError::Request(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            let (code, message) = match serde_json::from_str::<HeadlinesResponse>(&body) {
                Ok(env) => (env.code, env.message.unwrap_or_else(|| body.clone())),
                Err(_) => (None, body.clone()),
            };
            error!(%status, ?code, %message, "news provider returned HTTP error");
            return Err(NewsError::Upstream { status: status.as_u16(), code, message });
        }

        let parsed: HeadlinesResponse =
            serde_json::from_str(&body).map_err(|e| NewsError::Decode(e.to_string()))?;

        if parsed.status != "ok" {
            return Err(NewsError::Upstream {
                status: status.as_u16(),
                code: parsed.code,
                message: parsed.message.unwrap_or_else(|| "provider reported an error".into()),
            });
        }

        let now = Utc::now();
        let raw_count = parsed.articles.len();
        let articles: Vec<NewArticle> = parsed
            .articles
            .into_iter()
            .filter_map(|raw| normalize(raw, category, now))
            .collect();

        debug!(category, raw_count, kept = articles.len(), "headlines received");
        Ok(articles)
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeadlinesResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    url_to_image: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawSource {
    #[serde(default)]
    name: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != REMOVED_MARKER)
}

/// Drop entries without a URL or title (or withdrawn ones); trim strings;
/// fall back to `now` when the publish time is missing or unparseable.
fn normalize(raw: RawArticle, category: &str, now: DateTime<Utc>) -> Option<NewArticle> {
    let url = clean(raw.url)?;
    let title = clean(raw.title)?;

    let published_at = raw
        .published_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);

    Some(NewArticle {
        url,
        title,
        description: clean(raw.description),
        content: clean(raw.content),
        author: clean(raw.author),
        source_name: clean(raw.source.and_then(|s| s.name)),
        image_url: clean(raw.url_to_image),
        category: category.to_string(),
        published_at,
    })
}
