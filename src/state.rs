//! Shared application state handed to HTTP handlers and the job worker.

use std::sync::Arc;

use crate::blog::BlogCatalog;
use crate::config::{Config, EmailConfig, NewsConfig, Secrets};
use crate::contact::Mailroom;
use crate::cron::CronHandle;
use crate::mail::EmailProvider;
use crate::news::NewsClient;
use crate::store::Store;

/// Cheap to clone: every field is reference-counted or a handle.
#[derive(Clone)]
pub struct AppState {
    /// Site name, reported by `/api/health` and used in outgoing mail.
    pub name: Arc<str>,
    pub store: Store,
    pub blog: Arc<BlogCatalog>,
    pub news_client: NewsClient,
    pub news: Arc<NewsConfig>,
    pub mailer: EmailProvider,
    pub email: Arc<EmailConfig>,
    pub cron: CronHandle,
    pub secrets: Arc<Secrets>,
}

impl AppState {
    pub fn new(
        config: &Config,
        store: Store,
        blog: BlogCatalog,
        news_client: NewsClient,
        mailer: EmailProvider,
        cron: CronHandle,
    ) -> Self {
        Self {
            name: Arc::from(config.name.as_str()),
            store,
            blog: Arc::new(blog),
            news_client,
            news: Arc::new(config.news.clone()),
            mailer,
            email: Arc::new(config.email.clone()),
            cron,
            secrets: Arc::new(config.secrets.clone()),
        }
    }

    pub fn mailroom(&self) -> Mailroom<'_> {
        Mailroom { store: &self.store, mailer: &self.mailer, email: &self.email, site: &self.name }
    }
}
