//! News ingestion against a mocked NewsAPI-compatible source.

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use mockito::{Matcher, Server};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use portfolio_server::cron::{CronJob, CronScheduleSpec};
use portfolio_server::error::AppError;
use portfolio_server::http::build_router;
use portfolio_server::jobs;
use portfolio_server::news::{self, NewsError};
use portfolio_server::pagination::PageRequest;
use portfolio_server::store::ArticleFilter;

fn category(name: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("category".into(), name.into()),
        Matcher::UrlEncoded("country".into(), "us".into()),
        Matcher::UrlEncoded("pageSize".into(), "10".into()),
    ])
}

#[tokio::test]
async fn refresh_dedupes_across_categories_and_runs() {
    let mut server = Server::new_async().await;
    let tech = server
        .mock("GET", "/top-headlines")
        .match_query(category("technology"))
        .match_header("x-api-key", "news-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(common::headlines(&[
            ("https://n.example/shared", "Shared story", "2099-01-02T00:00:00Z"),
            ("https://n.example/tech", "Tech story", "2099-01-01T00:00:00Z"),
        ]))
        .expect(2)
        .create_async()
        .await;
    let science = server
        .mock("GET", "/top-headlines")
        .match_query(category("science"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(common::headlines(&[
            ("https://n.example/shared", "Shared story again", "2099-01-02T00:00:00Z"),
            ("https://n.example/sci", "Science story", "2099-01-03T00:00:00Z"),
            ("", "No url, dropped", "2099-01-03T00:00:00Z"),
        ]))
        .expect(2)
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let cfg = common::config(tmp.path(), &server.url());
    let h = common::harness(&cfg);
    let st = &h.state;

    let first = news::refresh(&st.news_client, &st.store, &st.news.categories, st.news.fetch_limit)
        .await
        .unwrap();
    assert_eq!(first.fetched, 4);
    assert_eq!(first.unique, 3);
    assert_eq!(first.inserted, 3);
    assert_eq!(first.skipped, 0);
    assert!(first.failed_categories.is_empty());

    let second = news::refresh(&st.news_client, &st.store, &st.news.categories, st.news.fetch_limit)
        .await
        .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 3);

    tech.assert_async().await;
    science.assert_async().await;

    let page = st
        .store
        .list_articles(&ArticleFilter::default(), PageRequest::new(None, None, 12))
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items[0].url, "https://n.example/sci");
    // First occurrence wins: the shared story keeps its technology tag.
    let shared = page.items.iter().find(|a| a.url == "https://n.example/shared").unwrap();
    assert_eq!(shared.category, "technology");
    assert_eq!(shared.title, "Shared story");
}

#[tokio::test]
async fn failing_category_is_reported_not_fatal() {
    let mut server = Server::new_async().await;
    let _tech = server
        .mock("GET", "/top-headlines")
        .match_query(category("technology"))
        .with_status(200)
        .with_body(common::headlines(&[("https://n.example/t", "T", "2099-01-01T00:00:00Z")]))
        .create_async()
        .await;
    let _science = server
        .mock("GET", "/top-headlines")
        .match_query(category("science"))
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let h = common::harness(&common::config(tmp.path(), &server.url()));
    let st = &h.state;

    let report = news::refresh(&st.news_client, &st.store, &st.news.categories, st.news.fetch_limit)
        .await
        .unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.failed_categories, vec!["science".to_string()]);
}

#[tokio::test]
async fn every_category_failing_returns_provider_error() {
    let mut server = Server::new_async().await;
    let _all = server
        .mock("GET", "/top-headlines")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#)
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let h = common::harness(&common::config(tmp.path(), &server.url()));
    let st = &h.state;

    let err = news::refresh(&st.news_client, &st.store, &st.news.categories, st.news.fetch_limit)
        .await
        .unwrap_err();
    match err {
        AppError::News(NewsError::Upstream { status, code, message }) => {
            assert_eq!(status, 401);
            assert_eq!(code.as_deref(), Some("apiKeyInvalid"));
            assert!(message.contains("invalid"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(st.store.count_articles().unwrap(), 0);
}

#[tokio::test]
async fn status_error_body_with_200_is_an_error() {
    let mut server = Server::new_async().await;
    let _all = server
        .mock("GET", "/top-headlines")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status":"error","code":"rateLimited","message":"Too many requests."}"#)
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let h = common::harness(&common::config(tmp.path(), &server.url()));
    let err = h.state.news_client.top_headlines("technology", 10).await.unwrap_err();
    assert!(matches!(err, NewsError::Upstream { code: Some(ref c), .. } if c == "rateLimited"));
}

#[tokio::test]
async fn refresh_endpoint_then_listing() {
    let mut server = Server::new_async().await;
    let _all = server
        .mock("GET", "/top-headlines")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(common::headlines(&[
            ("https://n.example/a", "Alpha", "2099-01-01T00:00:00Z"),
            ("https://n.example/b", "Beta", "2099-01-02T00:00:00Z"),
        ]))
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let h = common::harness(&common::config(tmp.path(), &server.url()));
    let router = build_router(h.state.clone());

    let req = Request::post("/api/news/refresh")
        .header(header::AUTHORIZATION, format!("Bearer {}", common::CRON_SECRET))
        .body(Body::empty())
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let report: Value = serde_json::from_slice(&to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    // Both categories return the same two URLs.
    assert_eq!(report["fetched"], 4);
    assert_eq!(report["inserted"], 2);

    let resp = router
        .oneshot(Request::get("/api/news?q=beta").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let page: Value = serde_json::from_slice(&to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["title"], "Beta");
}

#[tokio::test]
async fn refresh_without_key_is_service_unavailable() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = common::config(tmp.path(), "http://127.0.0.1:1");
    cfg.secrets.news_api_key = None;
    let h = common::harness(&cfg);

    let req = Request::get("/api/news/refresh")
        .header(header::AUTHORIZATION, format!("Bearer {}", common::CRON_SECRET))
        .body(Body::empty())
        .unwrap();
    let resp = build_router(h.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn cron_fired_job_runs_refresh() {
    let mut server = Server::new_async().await;
    let _all = server
        .mock("GET", "/top-headlines")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(common::headlines(&[("https://n.example/c", "Cron", "2099-01-01T00:00:00Z")]))
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let mut h = common::harness(&common::config(tmp.path(), &server.url()));

    h.state
        .cron
        .schedule(CronJob::NewsRefresh, CronScheduleSpec::Once { at_unix_ms: 0 })
        .await
        .unwrap();
    let job = tokio::time::timeout(std::time::Duration::from_secs(5), h.jobs.recv())
        .await
        .expect("cron did not fire")
        .expect("job channel closed");
    assert_eq!(job, CronJob::NewsRefresh);

    jobs::execute(&h.state, job).await.unwrap();
    assert_eq!(h.state.store.count_articles().unwrap(), 1);
    assert!(h.state.cron.list().await.unwrap().is_empty());
}
