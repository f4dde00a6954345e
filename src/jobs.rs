//! Job worker: executes the jobs the cron service emits.
//!
//! Jobs run one at a time, in the order they fired. A failed job is logged
//! and the worker moves on.

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cron::{CronHandle, CronJob, CronScheduleSpec};
use crate::error::AppError;
use crate::news;
use crate::state::AppState;

/// Run a single job against the shared state.
pub async fn execute(state: &AppState, job: CronJob) -> Result<(), AppError> {
    match job {
        CronJob::NewsRefresh => {
            news::refresh(
                &state.news_client,
                &state.store,
                &state.news.categories,
                state.news.fetch_limit,
            )
            .await?;
        }
        CronJob::NewsCleanup => {
            news::cleanup(&state.store, state.news.retention_days, Utc::now()).await?;
        }
    }
    Ok(())
}

/// Drain `jobs` until shutdown or until every sender is gone.
pub async fn run_worker(state: AppState, mut jobs: mpsc::Receiver<CronJob>, shutdown: CancellationToken) {
    info!("job worker running");
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            job = jobs.recv() => {
                let Some(job) = job else { break };
                debug!(?job, "job started");
                if let Err(e) = execute(&state, job).await {
                    error!(?job, error = %e, "job failed");
                }
            }
        }
    }
    info!("job worker stopped");
}

/// Register the configured refresh and cleanup intervals. A period of `0`
/// leaves that timer off. Returns the schedule ids that were created.
pub async fn schedule_defaults(
    cron: &CronHandle,
    refresh_every_secs: u64,
    cleanup_every_secs: u64,
) -> Result<Vec<String>, AppError> {
    let mut ids = Vec::new();
    for (job, every_secs) in [
        (CronJob::NewsRefresh, refresh_every_secs),
        (CronJob::NewsCleanup, cleanup_every_secs),
    ] {
        if every_secs == 0 {
            info!(?job, "timer disabled");
            continue;
        }
        let id = cron
            .schedule(job, CronScheduleSpec::Interval { every_secs })
            .await
            .map_err(|e| AppError::Server(format!("cannot schedule {job:?}: {e}")))?;
        info!(?job, every_secs, schedule_id = %id, "timer scheduled");
        ids.push(id);
    }
    Ok(ids)
}
