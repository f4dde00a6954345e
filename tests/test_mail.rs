//! Contact flow against a mocked HTTP email API.

mod common;

use mockito::{Matcher, Server};
use serde_json::json;
use tempfile::TempDir;

use portfolio_server::config::Config;
use portfolio_server::contact::{self, ContactForm, DiscussProjectForm, Mailroom};
use portfolio_server::mail::{EmailError, EmailProvider, providers};
use portfolio_server::store::Store;

fn http_email_config(tmp: &TempDir, base: &str) -> Config {
    let mut cfg = common::config(tmp.path(), "http://127.0.0.1:1");
    cfg.email.provider = "http".into();
    cfg.email.api_base_url = format!("{base}/emails");
    cfg.email.from = "Site <noreply@example.com>".into();
    cfg.email.owner_address = "owner@example.com".into();
    cfg
}

fn form() -> ContactForm {
    ContactForm {
        name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        subject: Some("Engines".into()),
        message: "Shall we talk about the analytical engine?".into(),
        website: None,
    }
}

#[test]
fn http_provider_needs_a_key() {
    let tmp = TempDir::new().unwrap();
    let cfg = http_email_config(&tmp, "http://127.0.0.1:1");
    assert!(matches!(providers::build(&cfg.email, None), Err(EmailError::MissingKey(_))));
}

#[tokio::test]
async fn submission_sends_ack_and_notification() {
    let mut server = Server::new_async().await;
    let ack = server
        .mock("POST", "/emails")
        .match_header("authorization", "Bearer mail-key")
        .match_body(Matcher::PartialJson(json!({
            "from": "Site <noreply@example.com>",
            "to": ["ada@example.com"],
        })))
        .with_status(200)
        .with_body(r#"{"id":"ack-1"}"#)
        .expect(1)
        .create_async()
        .await;
    let notify = server
        .mock("POST", "/emails")
        .match_body(Matcher::PartialJson(json!({
            "to": ["owner@example.com"],
            "reply_to": "ada@example.com",
            "subject": "[contact] Engines",
        })))
        .with_status(200)
        .with_body(r#"{"id":"note-1"}"#)
        .expect(1)
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let cfg = http_email_config(&tmp, &server.url());
    let mailer = providers::build(&cfg.email, Some("mail-key".into())).unwrap();
    assert!(matches!(mailer, EmailProvider::Http(_)));
    let store = Store::open(&cfg.work_dir).unwrap();
    let ctx = Mailroom { store: &store, mailer: &mailer, email: &cfg.email, site: &cfg.name };

    let receipt = contact::submit_contact(ctx, &form()).await.unwrap();
    assert!(receipt.acknowledgement_sent);
    assert!(receipt.notification_sent);
    ack.assert_async().await;
    notify.assert_async().await;
}

#[tokio::test]
async fn provider_outage_keeps_the_submission() {
    let mut server = Server::new_async().await;
    let _down = server
        .mock("POST", "/emails")
        .with_status(503)
        .with_body(r#"{"message":"service unavailable"}"#)
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let cfg = http_email_config(&tmp, &server.url());
    let mailer = providers::build(&cfg.email, Some("mail-key".into())).unwrap();
    let store = Store::open(&cfg.work_dir).unwrap();
    let ctx = Mailroom { store: &store, mailer: &mailer, email: &cfg.email, site: &cfg.name };

    let project = DiscussProjectForm {
        name: "Grace Hopper".into(),
        email: "grace@example.com".into(),
        project_type: "Compiler".into(),
        details: "We need a compiler for business programs.".into(),
        ..Default::default()
    };
    let receipt = contact::submit_discuss_project(ctx, &project).await.unwrap();
    assert!(!receipt.id.is_empty());
    assert!(!receipt.acknowledgement_sent);
    assert!(!receipt.notification_sent);

    let stats = contact::stats(&store).await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.discuss_project, 1);
}

#[tokio::test]
async fn partial_delivery_is_reported_per_message() {
    let mut server = Server::new_async().await;
    let _ack = server
        .mock("POST", "/emails")
        .match_body(Matcher::PartialJson(json!({ "to": ["ada@example.com"] })))
        .with_status(200)
        .with_body(r#"{"id":"ack-1"}"#)
        .create_async()
        .await;
    let _notify = server
        .mock("POST", "/emails")
        .match_body(Matcher::PartialJson(json!({ "to": ["owner@example.com"] })))
        .with_status(422)
        .with_body(r#"{"message":"owner address rejected"}"#)
        .create_async()
        .await;

    let tmp = TempDir::new().unwrap();
    let cfg = http_email_config(&tmp, &server.url());
    let mailer = providers::build(&cfg.email, Some("mail-key".into())).unwrap();
    let store = Store::open(&cfg.work_dir).unwrap();
    let ctx = Mailroom { store: &store, mailer: &mailer, email: &cfg.email, site: &cfg.name };

    let receipt = contact::submit_contact(ctx, &form()).await.unwrap();
    assert!(receipt.acknowledgement_sent);
    assert!(!receipt.notification_sent);
}
