//! Transactional email client.
//!
//! `EmailProvider` is an enum over concrete delivery backends.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Providers are cheap to clone.

pub mod compose;
pub mod providers;

use serde::Serialize;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("unknown email provider: {0}")]
    UnknownProvider(String),
    #[error("EMAIL_API_KEY is required for the '{0}' provider")]
    MissingKey(String),
    #[error("email delivery failed: {0}")]
    Delivery(String),
}

// ── Message ───────────────────────────────────────────────────────────────────

/// A fully composed message. `text` is always present; `html` is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available delivery backends.
#[derive(Debug, Clone)]
pub enum EmailProvider {
    Dummy(providers::dummy::DummyMailer),
    Http(providers::http::HttpMailer),
}

impl EmailProvider {
    /// Deliver `email`, returning the provider's message id.
    pub async fn send(&self, email: &OutgoingEmail) -> Result<String, EmailError> {
        match self {
            EmailProvider::Dummy(p) => p.send(email).await,
            EmailProvider::Http(p) => p.send(email).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EmailProvider::Dummy(_) => "dummy",
            EmailProvider::Http(_) => "http",
        }
    }
}
