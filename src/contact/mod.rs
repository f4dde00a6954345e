//! Contact and discuss-project flows.
//!
//! validate → persist → acknowledge the sender → notify the owner → record
//! which emails went out. Email failures never undo the stored submission.

pub mod validate;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EmailConfig;
use crate::error::AppError;
use crate::mail::{EmailProvider, compose};
use crate::store::{NewSubmission, Store, SubmissionKind, SubmissionStats};

pub use validate::FieldError;
use validate::{
    Checker, MESSAGE_MAX, MESSAGE_MIN, NAME_MAX, NAME_MIN, OPTIONAL_MAX, PROJECT_TYPE_MAX,
    SUBJECT_MAX, trimmed_opt,
};

// ── Forms ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Honeypot. Hidden from humans; bots fill it in.
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussProjectForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default, alias = "project_type")]
    pub project_type: String,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub website: Option<String>,
}

fn is_bot(website: Option<&str>) -> bool {
    website.is_some_and(|w| !w.trim().is_empty())
}

impl ContactForm {
    /// Trim and check every field, producing a storable submission.
    pub fn validate(&self) -> Result<NewSubmission, Vec<FieldError>> {
        let name = self.name.trim();
        let email = self.email.trim();
        let message = self.message.trim();
        let subject = trimmed_opt(self.subject.as_deref());

        let mut c = Checker::default();
        c.length("name", name, NAME_MIN, NAME_MAX);
        c.email("email", email);
        c.optional("subject", subject.as_deref(), SUBJECT_MAX);
        c.length("message", message, MESSAGE_MIN, MESSAGE_MAX);
        c.finish()?;

        Ok(NewSubmission {
            kind: SubmissionKind::Contact,
            name: name.to_string(),
            email: email.to_string(),
            subject,
            message: message.to_string(),
            details: BTreeMap::new(),
        })
    }
}

impl DiscussProjectForm {
    pub fn validate(&self) -> Result<NewSubmission, Vec<FieldError>> {
        let name = self.name.trim();
        let email = self.email.trim();
        let project_type = self.project_type.trim();
        let details = self.details.trim();
        let company = trimmed_opt(self.company.as_deref());
        let budget = trimmed_opt(self.budget.as_deref());
        let timeline = trimmed_opt(self.timeline.as_deref());

        let mut c = Checker::default();
        c.length("name", name, NAME_MIN, NAME_MAX);
        c.email("email", email);
        c.optional("company", company.as_deref(), OPTIONAL_MAX);
        c.length("projectType", project_type, 1, PROJECT_TYPE_MAX);
        c.optional("budget", budget.as_deref(), OPTIONAL_MAX);
        c.optional("timeline", timeline.as_deref(), OPTIONAL_MAX);
        c.length("details", details, MESSAGE_MIN, MESSAGE_MAX);
        c.finish()?;

        let mut extra = BTreeMap::new();
        extra.insert("project_type".to_string(), project_type.to_string());
        for (key, value) in [("company", company), ("budget", budget), ("timeline", timeline)] {
            if let Some(v) = value {
                extra.insert(key.to_string(), v);
            }
        }

        Ok(NewSubmission {
            kind: SubmissionKind::DiscussProject,
            name: name.to_string(),
            email: email.to_string(),
            subject: None,
            message: details.to_string(),
            details: extra,
        })
    }
}

// ── Submission ──────────────────────────────────────────────────────────────

/// What the client is told after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    /// Store id. Empty when the honeypot tripped and nothing was stored.
    pub id: String,
    pub acknowledgement_sent: bool,
    pub notification_sent: bool,
}

/// Everything the submit flow needs, borrowed from the application state.
#[derive(Clone, Copy)]
pub struct Mailroom<'a> {
    pub store: &'a Store,
    pub mailer: &'a EmailProvider,
    pub email: &'a EmailConfig,
    /// Site name shown in the acknowledgement.
    pub site: &'a str,
}

pub async fn submit_contact(ctx: Mailroom<'_>, form: &ContactForm) -> Result<SubmissionReceipt, AppError> {
    if is_bot(form.website.as_deref()) {
        info!("contact: honeypot tripped, dropping submission");
        return Ok(honeypot_receipt());
    }
    let sub = form.validate().map_err(AppError::Validation)?;
    submit(ctx, sub).await
}

pub async fn submit_discuss_project(
    ctx: Mailroom<'_>,
    form: &DiscussProjectForm,
) -> Result<SubmissionReceipt, AppError> {
    if is_bot(form.website.as_deref()) {
        info!("discuss-project: honeypot tripped, dropping submission");
        return Ok(honeypot_receipt());
    }
    let sub = form.validate().map_err(AppError::Validation)?;
    submit(ctx, sub).await
}

/// Indistinguishable from a normal success on the wire, minus the id.
fn honeypot_receipt() -> SubmissionReceipt {
    SubmissionReceipt { id: String::new(), acknowledgement_sent: true, notification_sent: true }
}

/// Persist an already-validated submission, then send both emails.
pub async fn submit(ctx: Mailroom<'_>, sub: NewSubmission) -> Result<SubmissionReceipt, AppError> {
    let stored = sub.clone();
    let id = ctx.store.run(move |s| s.insert_submission(&stored)).await?;
    info!(%id, kind = %sub.kind, "submission stored");

    let ack = compose::acknowledgement(ctx.email, ctx.site, &sub);
    let acknowledgement_sent = match ctx.mailer.send(&ack).await {
        Ok(_) => true,
        Err(e) => {
            warn!(%id, error = %e, "acknowledgement email failed");
            false
        }
    };

    let note = compose::notification(ctx.email, &sub);
    let notification_sent = match ctx.mailer.send(&note).await {
        Ok(_) => true,
        Err(e) => {
            warn!(%id, error = %e, "notification email failed");
            false
        }
    };

    let flag_id = id.clone();
    ctx.store
        .run(move |s| s.mark_delivery(&flag_id, acknowledgement_sent, notification_sent))
        .await?;

    Ok(SubmissionReceipt { id, acknowledgement_sent, notification_sent })
}

pub async fn stats(store: &Store) -> Result<SubmissionStats, AppError> {
    store.run(|s| s.submission_stats()).await
}
