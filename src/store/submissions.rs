//! `contact_submissions` collection.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use rusqlite::params;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

use super::{Store, format_ts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Contact,
    DiscussProject,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::Contact => "contact",
            SubmissionKind::DiscussProject => "discuss_project",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated submission ready to be stored.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub kind: SubmissionKind,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    /// Variant-specific fields (company, budget, …), stored as a JSON object.
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SubmissionStats {
    pub total: usize,
    pub contact: usize,
    pub discuss_project: usize,
    pub last_received_at: Option<String>,
}

impl Store {
    /// Persist a submission and return its id. Delivery flags start false.
    pub fn insert_submission(&self, sub: &NewSubmission) -> Result<String, AppError> {
        let id = Uuid::now_v7().to_string();
        let details = serde_json::to_string(&sub.details)
            .map_err(|e| AppError::Store(format!("serialize submission details: {e}")))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO contact_submissions
                (id, kind, name, email, subject, message, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                sub.kind.as_str(),
                sub.name,
                sub.email,
                sub.subject,
                sub.message,
                details,
                format_ts(Utc::now()),
            ],
        )?;
        Ok(id)
    }

    /// Record which of the two emails went out. Returns `false` for an unknown id.
    pub fn mark_delivery(&self, id: &str, ack_sent: bool, notify_sent: bool) -> Result<bool, AppError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE contact_submissions SET ack_sent = ?2, notify_sent = ?3 WHERE id = ?1",
            params![id, ack_sent, notify_sent],
        )?;
        Ok(changed == 1)
    }

    pub fn submission_stats(&self) -> Result<SubmissionStats, AppError> {
        let conn = self.lock()?;
        let (total, contact, discuss, last): (i64, Option<i64>, Option<i64>, Option<String>) =
            conn.query_row(
                "SELECT COUNT(*),
                        SUM(kind = 'contact'),
                        SUM(kind = 'discuss_project'),
                        MAX(created_at)
                 FROM contact_submissions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;
        Ok(SubmissionStats {
            total: total as usize,
            contact: contact.unwrap_or(0) as usize,
            discuss_project: discuss.unwrap_or(0) as usize,
            last_received_at: last,
        })
    }
}
