//! Timed trigger for the news sweeps.
//!
//! [`spawn`] starts a single background tokio task (see `service.rs`) and
//! returns a [`CronHandle`] for scheduling, cancelling and listing timers.
//! When a timer fires, its [`CronJob`] is pushed onto the job channel; the
//! job worker in `crate::jobs` executes it.
//!
//! The task parks on `tokio::time::sleep_until` for the earliest deadline.
//! It wakes only when a timer fires, a command arrives, or shutdown is
//! requested.

mod service;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use service::{CronCommand, CronService};

/// Work a timer can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CronJob {
    NewsRefresh,
    NewsCleanup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CronScheduleSpec {
    /// Fire once at a wall-clock time. A time in the past fires immediately.
    Once { at_unix_ms: u64 },
    /// Fire every `every_secs`, first after one full period.
    Interval { every_secs: u64 },
}

/// One active schedule, as reported by [`CronHandle::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CronEntryInfo {
    pub schedule_id: String,
    pub job: CronJob,
    pub spec: CronScheduleSpec,
    pub next_fire_unix_ms: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("interval every_secs must be > 0")]
    ZeroInterval,
    #[error("cron service not running")]
    NotRunning,
    #[error("cron service dropped reply")]
    DroppedReply,
}

/// Cheap to clone; every clone talks to the same service task.
#[derive(Debug, Clone)]
pub struct CronHandle {
    cmd_tx: mpsc::Sender<CronCommand>,
}

/// Start the timer service. Fired jobs are sent to `job_tx`.
pub fn spawn(job_tx: mpsc::Sender<CronJob>, shutdown: CancellationToken) -> CronHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let svc = CronService::new(job_tx, cmd_rx, shutdown);
    tokio::spawn(svc.run());
    debug!("cron service started");
    CronHandle { cmd_tx }
}

impl CronHandle {
    pub async fn schedule(&self, job: CronJob, spec: CronScheduleSpec) -> Result<String, CronError> {
        if let CronScheduleSpec::Interval { every_secs: 0 } = spec {
            return Err(CronError::ZeroInterval);
        }
        let (reply, rx) = oneshot::channel();
        self.request(CronCommand::Schedule { job, spec, reply }, rx).await
    }

    /// `Ok(false)` when no schedule has that id.
    pub async fn cancel(&self, schedule_id: &str) -> Result<bool, CronError> {
        let (reply, rx) = oneshot::channel();
        self.request(CronCommand::Cancel { schedule_id: schedule_id.to_string(), reply }, rx)
            .await
    }

    /// Active schedules, earliest deadline first.
    pub async fn list(&self) -> Result<Vec<CronEntryInfo>, CronError> {
        let (reply, rx) = oneshot::channel();
        self.request(CronCommand::List { reply }, rx).await
    }

    async fn request<T>(&self, cmd: CronCommand, rx: oneshot::Receiver<T>) -> Result<T, CronError> {
        self.cmd_tx.send(cmd).await.map_err(|_| CronError::NotRunning)?;
        rx.await.map_err(|_| CronError::DroppedReply)
    }
}
