//! Dummy mailer: logs and records every message instead of delivering it.
//! Used for local development and tests without an API key.

use std::sync::{Arc, Mutex};

use tracing::info;
use uuid::Uuid;

use crate::mail::{EmailError, OutgoingEmail};

#[derive(Debug, Clone, Default)]
pub struct DummyMailer {
    outbox: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl DummyMailer {
    pub async fn send(&self, email: &OutgoingEmail) -> Result<String, EmailError> {
        let id = Uuid::new_v4().to_string();
        info!(%id, to = ?email.to, subject = %email.subject, "dummy mailer: message recorded");
        self.outbox
            .lock()
            .map_err(|_| EmailError::Delivery("dummy outbox lock poisoned".into()))?
            .push(email.clone());
        Ok(id)
    }

    /// Snapshot of everything "sent" so far.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }
}
