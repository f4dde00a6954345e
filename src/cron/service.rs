//! Background timer task.
//!
//! Keeps a `BTreeMap<Instant, ScheduleEntry>` queue and sleeps until the
//! earliest deadline via `tokio::time::sleep_until`.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::{CronEntryInfo, CronJob, CronScheduleSpec};

// ── Commands ─────────────────────────────────────────────────────────────────

/// Sent from [`super::CronHandle`] to the background task.
#[derive(Debug)]
pub enum CronCommand {
    Schedule {
        job: CronJob,
        spec: CronScheduleSpec,
        reply: oneshot::Sender<String>, // schedule_id
    },
    Cancel {
        schedule_id: String,
        reply: oneshot::Sender<bool>,
    },
    List {
        reply: oneshot::Sender<Vec<CronEntryInfo>>,
    },
}

#[derive(Debug, Clone)]
struct ScheduleEntry {
    id: String,
    job: CronJob,
    spec: CronScheduleSpec,
}

// ── Service ──────────────────────────────────────────────────────────────────

pub struct CronService {
    job_tx: mpsc::Sender<CronJob>,
    cmd_rx: mpsc::Receiver<CronCommand>,
    shutdown: CancellationToken,
}

impl CronService {
    pub fn new(
        job_tx: mpsc::Sender<CronJob>,
        cmd_rx: mpsc::Receiver<CronCommand>,
        shutdown: CancellationToken,
    ) -> Self {
        Self { job_tx, cmd_rx, shutdown }
    }

    /// Run the timer loop until shutdown.
    pub async fn run(mut self) {
        // Keys are unique: a colliding deadline is nudged forward by 1ns.
        let mut queue: BTreeMap<Instant, ScheduleEntry> = BTreeMap::new();
        let mut id_to_deadline: HashMap<String, Instant> = HashMap::new();

        info!("cron service running");

        loop {
            let next_deadline = queue.keys().next().copied();

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!(active = queue.len(), "cron service shutting down");
                    break;
                }

                Some(cmd) = self.cmd_rx.recv() => match cmd {
                    CronCommand::Schedule { job, spec, reply } => {
                        let id = Uuid::new_v4().to_string();
                        let deadline = spec_to_instant(&spec);
                        let deadline = insert_unique(
                            &mut queue,
                            deadline,
                            ScheduleEntry { id: id.clone(), job, spec },
                        );
                        id_to_deadline.insert(id.clone(), deadline);
                        debug!(schedule_id = %id, ?job, ?deadline, "scheduled");
                        let _ = reply.send(id);
                    }
                    CronCommand::Cancel { schedule_id, reply } => {
                        let removed = match id_to_deadline.remove(&schedule_id) {
                            Some(deadline) => {
                                queue.remove(&deadline);
                                debug!(%schedule_id, "cancelled");
                                true
                            }
                            None => {
                                debug!(%schedule_id, "cancel: not found");
                                false
                            }
                        };
                        let _ = reply.send(removed);
                    }
                    CronCommand::List { reply } => {
                        let entries: Vec<CronEntryInfo> = queue
                            .iter()
                            .map(|(deadline, entry)| CronEntryInfo {
                                schedule_id: entry.id.clone(),
                                job: entry.job,
                                spec: entry.spec.clone(),
                                next_fire_unix_ms: instant_to_unix_ms(*deadline),
                            })
                            .collect();
                        trace!(count = entries.len(), "listing schedules");
                        let _ = reply.send(entries);
                    }
                },

                _ = async {
                    match next_deadline {
                        Some(d) => tokio::time::sleep_until(d).await,
                        None => std::future::pending().await,
                    }
                } => {
                    let Some((deadline, entry)) = queue.pop_first() else { continue };
                    id_to_deadline.remove(&entry.id);

                    debug!(schedule_id = %entry.id, job = ?entry.job, "cron firing");

                    // A busy worker means a tick is skipped, not queued up.
                    match self.job_tx.try_send(entry.job) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(job)) => {
                            warn!(schedule_id = %entry.id, ?job, "job worker busy; tick skipped");
                        }
                        Err(mpsc::error::TrySendError::Closed(job)) => {
                            warn!(schedule_id = %entry.id, ?job, "job worker gone; tick dropped");
                        }
                    }

                    if let CronScheduleSpec::Interval { every_secs } = entry.spec {
                        let next = deadline + Duration::from_secs(every_secs);
                        let id = entry.id.clone();
                        let next = insert_unique(&mut queue, next, entry);
                        id_to_deadline.insert(id, next);
                    }
                }
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn spec_to_instant(spec: &CronScheduleSpec) -> Instant {
    match spec {
        CronScheduleSpec::Once { at_unix_ms } => {
            let target = UNIX_EPOCH + Duration::from_millis(*at_unix_ms);
            let now = Instant::now();
            match target.duration_since(SystemTime::now()) {
                Ok(delta) => now + delta,
                Err(_) => now,
            }
        }
        CronScheduleSpec::Interval { every_secs } => Instant::now() + Duration::from_secs(*every_secs),
    }
}

/// Returns the key actually used.
fn insert_unique(
    queue: &mut BTreeMap<Instant, ScheduleEntry>,
    mut deadline: Instant,
    entry: ScheduleEntry,
) -> Instant {
    while queue.contains_key(&deadline) {
        deadline += Duration::from_nanos(1);
    }
    queue.insert(deadline, entry);
    deadline
}

/// Best-effort, for listings only.
fn instant_to_unix_ms(instant: Instant) -> u64 {
    let now_inst = Instant::now();
    let unix_now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();

    if instant >= now_inst {
        (unix_now + (instant - now_inst)).as_millis() as u64
    } else {
        unix_now
            .checked_sub(now_inst - instant)
            .map_or(0, |d| d.as_millis() as u64)
    }
}
