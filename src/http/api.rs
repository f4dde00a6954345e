//! Axum handlers for `/api/*` routes.
//!
//! Each handler receives [`AppState`] via [`axum::extract::State`]; failures
//! come back as [`ApiError`], which renders the JSON error body.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::blog::{Adjacent, BlogQuery, Post, PostSummary, TermCount};
use crate::contact::{self, ContactForm, DiscussProjectForm, SubmissionReceipt};
use crate::cron::CronEntryInfo;
use crate::error::AppError;
use crate::news::{self, CleanupReport, RefreshReport};
use crate::pagination::{Page, PageRequest, lenient_count};
use crate::state::AppState;
use crate::store::{ArticleFilter, NewsStats, StoredArticle, SubmissionStats};

use super::ApiError;

type ApiResult<T> = Result<Json<T>, ApiError>;

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(super) struct NewsQuery {
    #[serde(default, deserialize_with = "lenient_count")]
    page: Option<usize>,
    #[serde(default, deserialize_with = "lenient_count")]
    limit: Option<usize>,
    q: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct PostResponse<'a> {
    post: &'a Post,
    previous: Option<PostSummary>,
    next: Option<PostSummary>,
}

// ── Auth ──────────────────────────────────────────────────────────────────────

/// Exact `Authorization: Bearer <secret>` match. An unset secret refuses
/// everyone.
fn require_bearer(headers: &HeaderMap, secret: Option<&str>) -> Result<(), ApiError> {
    let Some(secret) = secret else {
        return Err(ApiError::Unauthorized);
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match presented {
        Some(token) if token == secret => Ok(()),
        _ => {
            warn!("rejected request with missing or wrong bearer token");
            Err(ApiError::Unauthorized)
        }
    }
}

// ── Health ────────────────────────────────────────────────────────────────────

/// GET /api/health
pub(super) async fn health(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (articles, submissions) = state
        .store
        .run(|s| Ok((s.count_articles()?, s.submission_stats()?.total)))
        .await?;
    let body = json!({
        "status": "ok",
        "name": &*state.name,
        "version": env!("CARGO_PKG_VERSION"),
        "articles": articles,
        "submissions": submissions,
    });
    Ok((StatusCode::OK, Json(body)).into_response())
}

// ── Blog ──────────────────────────────────────────────────────────────────────

/// GET /api/blog
pub(super) async fn blog_list(
    State(state): State<AppState>,
    query: Result<Query<BlogQuery>, QueryRejection>,
) -> ApiResult<Page<PostSummary>> {
    let Query(query) = query?;
    Ok(Json(state.blog.list(&query)))
}

/// GET /api/blog/tags
pub(super) async fn blog_tags(State(state): State<AppState>) -> Json<Vec<TermCount>> {
    Json(state.blog.tags())
}

/// GET /api/blog/categories
pub(super) async fn blog_categories(State(state): State<AppState>) -> Json<Vec<TermCount>> {
    Json(state.blog.categories())
}

/// GET /api/blog/{slug}
pub(super) async fn blog_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let (Some(post), Some(Adjacent { previous, next })) = (state.blog.get(&slug), state.blog.adjacent(&slug))
    else {
        return Err(ApiError::NotFound(format!("no post with slug '{slug}'")));
    };
    Ok(Json(PostResponse { post, previous, next }).into_response())
}

// ── News ──────────────────────────────────────────────────────────────────────

/// GET /api/news
pub(super) async fn news_list(
    State(state): State<AppState>,
    query: Result<Query<NewsQuery>, QueryRejection>,
) -> ApiResult<Page<StoredArticle>> {
    let Query(query) = query?;
    let req = PageRequest::new(query.page, query.limit, state.news.page_size);
    // Stored categories are lowercase.
    let filter = ArticleFilter {
        category: query.category.map(|c| c.trim().to_lowercase()),
        q: query.q,
    };
    let page = state.store.run(move |s| s.list_articles(&filter, req)).await?;
    Ok(Json(page))
}

/// GET /api/news/stats
pub(super) async fn news_stats(State(state): State<AppState>) -> ApiResult<NewsStats> {
    Ok(Json(state.store.run(|s| s.article_stats()).await?))
}

/// GET /api/news/{id}
pub(super) async fn news_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StoredArticle> {
    let lookup = id.clone();
    state
        .store
        .run(move |s| s.get_article(&lookup))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no article with id '{id}'")))
}

/// GET|POST /api/news/refresh
pub(super) async fn news_refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<RefreshReport> {
    require_bearer(&headers, state.secrets.cron_secret.as_deref())?;
    info!("news refresh triggered over http");
    let report = news::refresh(
        &state.news_client,
        &state.store,
        &state.news.categories,
        state.news.fetch_limit,
    )
    .await?;
    Ok(Json(report))
}

/// GET|POST /api/news/cleanup
pub(super) async fn news_cleanup(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<CleanupReport> {
    require_bearer(&headers, state.secrets.cron_secret.as_deref())?;
    info!("news cleanup triggered over http");
    let report = news::cleanup(&state.store, state.news.retention_days, Utc::now()).await?;
    Ok(Json(report))
}

// ── Contact ───────────────────────────────────────────────────────────────────

/// POST /api/contact
pub(super) async fn contact(
    State(state): State<AppState>,
    form: Result<Json<ContactForm>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), ApiError> {
    let Json(form) = form?;
    let receipt = contact::submit_contact(state.mailroom(), &form).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// POST /api/discuss-project
pub(super) async fn discuss_project(
    State(state): State<AppState>,
    form: Result<Json<DiscussProjectForm>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), ApiError> {
    let Json(form) = form?;
    let receipt = contact::submit_discuss_project(state.mailroom(), &form).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /api/contact/stats
pub(super) async fn contact_stats(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<SubmissionStats> {
    require_bearer(&headers, state.secrets.admin_token.as_deref())?;
    Ok(Json(contact::stats(&state.store).await?))
}

// ── Cron ──────────────────────────────────────────────────────────────────────

/// GET /api/cron
pub(super) async fn cron_list(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<CronEntryInfo>> {
    require_bearer(&headers, state.secrets.admin_token.as_deref())?;
    let entries = state
        .cron
        .list()
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;
    Ok(Json(entries))
}

pub(super) async fn not_found() -> ApiError {
    ApiError::NotFound("no such route".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_must_match_exactly() {
        assert!(require_bearer(&headers("Bearer s3cret"), Some("s3cret")).is_ok());
        assert!(require_bearer(&headers("Bearer wrong"), Some("s3cret")).is_err());
        assert!(require_bearer(&headers("bearer s3cret"), Some("s3cret")).is_err());
        assert!(require_bearer(&headers("s3cret"), Some("s3cret")).is_err());
        assert!(require_bearer(&HeaderMap::new(), Some("s3cret")).is_err());
    }

    #[test]
    fn unset_secret_fails_closed() {
        assert!(require_bearer(&headers("Bearer "), None).is_err());
        assert!(require_bearer(&HeaderMap::new(), None).is_err());
    }
}
