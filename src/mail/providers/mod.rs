//! Email provider implementations.
//!
//! `build(config, api_key)` is the factory, called once at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod http;

use crate::config::{Config, EmailConfig};
use crate::error::AppError;
use crate::mail::{EmailError, EmailProvider};

/// Construct an `EmailProvider` from config and an optional API key.
///
/// `api_key` is sourced from `EMAIL_API_KEY` env (never TOML).
pub fn build(config: &EmailConfig, api_key: Option<String>) -> Result<EmailProvider, EmailError> {
    match config.provider.as_str() {
        "dummy" => Ok(EmailProvider::Dummy(dummy::DummyMailer::default())),
        "http" | "resend" => {
            let key = api_key.ok_or_else(|| EmailError::MissingKey(config.provider.clone()))?;
            let p = http::HttpMailer::new(config.api_base_url.clone(), config.timeout_seconds, key)?;
            Ok(EmailProvider::Http(p))
        }
        _ => Err(EmailError::UnknownProvider(config.provider.clone())),
    }
}

/// Startup wrapper around [`build`]: an unknown provider or a missing key is a
/// configuration mistake, not a delivery failure.
pub fn from_config(config: &Config) -> Result<EmailProvider, AppError> {
    build(&config.email, config.secrets.email_api_key.clone()).map_err(|e| match e {
        EmailError::MissingKey(_) | EmailError::UnknownProvider(_) => AppError::Config(e.to_string()),
        other => AppError::Email(other),
    })
}
