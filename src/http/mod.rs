//! Axum HTTP surface. Everything lives under `/api/`.
//!
//! ```text
//! GET       /api/health
//! GET       /api/blog                 ?page&limit&tag&category&q&featured
//! GET       /api/blog/tags
//! GET       /api/blog/categories
//! GET       /api/blog/{slug}
//! GET       /api/news                 ?page&limit&q&category
//! GET       /api/news/stats
//! GET       /api/news/{id}
//! GET|POST  /api/news/refresh         Bearer CRON_SECRET
//! GET|POST  /api/news/cleanup         Bearer CRON_SECRET
//! POST      /api/contact
//! POST      /api/discuss-project
//! GET       /api/contact/stats        Bearer ADMIN_TOKEN
//! GET       /api/cron                 Bearer ADMIN_TOKEN
//! ```

mod api;
mod error;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

pub use error::ApiError;

/// Bind `bind_addr` and serve until `shutdown` fires.
pub async fn serve(state: AppState, bind_addr: &str, shutdown: CancellationToken) -> Result<(), AppError> {
    let router = build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("http server error: {e}")))?;

    info!("http server shut down");
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health",           get(api::health))
        .route("/api/blog",             get(api::blog_list))
        .route("/api/blog/tags",        get(api::blog_tags))
        .route("/api/blog/categories",  get(api::blog_categories))
        .route("/api/blog/{slug}",      get(api::blog_post))
        .route("/api/news",             get(api::news_list))
        .route("/api/news/stats",       get(api::news_stats))
        .route("/api/news/refresh",     get(api::news_refresh).post(api::news_refresh))
        .route("/api/news/cleanup",     get(api::news_cleanup).post(api::news_cleanup))
        .route("/api/news/{id}",        get(api::news_article))
        .route("/api/contact",          post(api::contact))
        .route("/api/contact/stats",    get(api::contact_stats))
        .route("/api/discuss-project",  post(api::discuss_project))
        .route("/api/cron",             get(api::cron_list))
        .fallback(api::not_found)
        .with_state(state)
}
