//! HTTP email API provider (Resend-compatible `POST /emails`).
//!
//! Wire types are private to this module: callers only see
//! [`OutgoingEmail`] in and a message id out.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::mail::{EmailError, OutgoingEmail};

/// Built once at startup; clones share the connection pool.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    api_base_url: String,
    api_key: String,
}

impl std::fmt::Debug for HttpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMailer")
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl HttpMailer {
    pub fn new(api_base_url: String, timeout_seconds: u64, api_key: String) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| EmailError::Delivery(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, api_base_url, api_key })
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<String, EmailError> {
        let payload = SendRequest {
            from: &email.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.text,
            html: email.html.as_deref(),
            reply_to: email.reply_to.as_deref(),
        };

        debug!(to = ?email.to, subject = %email.subject, "sending email");

        let response = self
            .client
            .post(&self.api_base_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.api_base_url, error = %e, "email HTTP request failed (transport)");
                EmailError::Delivery(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => format!("HTTP {status}: {}", err.message),
                Err(_) => format!("HTTP {status}: {body}"),
            };
            error!(%status, %message, "email provider returned HTTP error");
            return Err(EmailError::Delivery(message));
        }

        let parsed = response
            .json::<SendResponse>()
            .await
            .map_err(|e| EmailError::Delivery(format!("failed to parse response body: {e}")))?;

        debug!(id = %parsed.id, "email accepted");
        Ok(parsed.id)
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
