//! Time-based reclamation sweep.
//!
//! Two passes on a fixed interval. The registry pass retires jobs past the
//! retention horizon: cancel flag forced, record made terminal, disk
//! footprint removed, record dropped from registry and queue. The orphan
//! pass removes on-disk entries no live job owns, but only once they are
//! older than the same horizon, so the sweep never races an in-flight
//! submission that has staged files without a registry record yet.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use pakrat_core::{Error, JobStatus};

use crate::context::EngineContext;
use crate::events::EngineEvent;

pub struct ReclamationSweeper;

impl ReclamationSweeper {
    /// Run `sweep_once` every `sweep_interval_secs`; the first sweep fires
    /// one full interval after start.
    pub fn start(ctx: Arc<EngineContext>) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let period = Duration::from_secs(ctx.config.sweep_interval_secs.max(1));
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval's first tick completes immediately; consume it so
            // the first sweep happens after one period.
            ticker.tick().await;

            info!(
                sweep_interval_secs = period.as_secs(),
                retention_hours = ctx.config.retention_hours,
                "Reclamation sweeper started"
            );

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        sweep_once(&ctx).await;
                    }
                }
            }

            info!("Reclamation sweeper stopped");
        });

        SweeperHandle { shutdown_tx, task }
    }
}

/// Handle for stopping the sweeper.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

/// One full sweep. Public so tests (and embedders) can trigger reclamation
/// without waiting out the interval.
pub async fn sweep_once(ctx: &EngineContext) -> (usize, usize) {
    sweep_at(ctx, Utc::now()).await
}

/// Sweep with an explicit "now", for callers that need deterministic
/// horizons.
pub async fn sweep_at(ctx: &EngineContext, now: DateTime<Utc>) -> (usize, usize) {
    let horizon_hours = ctx.config.retention_hours;

    // Pass 1: expired registry entries.
    let mut reclaimed_jobs = 0;
    for job_id in ctx.registry.ids().await {
        let Some(job) = ctx.registry.get(job_id).await else {
            continue;
        };
        if !job.expired_at(now, horizon_hours) {
            continue;
        }

        job.request_cancel();
        ctx.queue.remove(job_id);
        if !job.status().await.is_terminal() {
            // Every non-terminal status may move straight to Cancelled; a
            // running phase observes the flag at its next checkpoint and
            // unwinds into no-op cleanup.
            job.set_error(Error::Cancelled.to_string()).await;
            let _ = job.set_status(JobStatus::Cancelled).await;
        }
        job.cleanup().await;
        ctx.registry.remove(job_id).await;
        reclaimed_jobs += 1;
        info!(%job_id, "Reclaimed expired job");
    }

    // Pass 2: orphaned disk entries.
    let live: HashSet<Uuid> = ctx.registry.ids().await.into_iter().collect();
    let mut orphans_removed = 0;
    for root in [&ctx.storage.upload_root, &ctx.storage.work_root, &ctx.storage.log_root] {
        orphans_removed += remove_orphans(root, &live, now, horizon_hours).await;
    }

    ctx.limiter.prune().await;

    info!(reclaimed_jobs, orphans_removed, "Reclamation sweep completed");
    ctx.emit(EngineEvent::SweepCompleted {
        reclaimed_jobs,
        orphans_removed,
    });

    (reclaimed_jobs, orphans_removed)
}

/// Delete job-named entries (`<uuid>` dirs, `<uuid>.log` files) under `root`
/// that no live job owns and whose mtime predates the horizon. Entries with
/// other names are not ours to touch. I/O problems are logged and skipped.
async fn remove_orphans(
    root: &Path,
    live: &HashSet<Uuid>,
    now: DateTime<Utc>,
    horizon_hours: i64,
) -> usize {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(root = %root.display(), error = %e, "Sweep could not read root");
            }
            return 0;
        }
    };

    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Ok(owner) = name.strip_suffix(".log").unwrap_or(&name).parse::<Uuid>() else {
            continue;
        };
        if live.contains(&owner) {
            continue;
        }
        if !older_than(&entry, now, horizon_hours).await {
            continue;
        }

        let path = entry.path();
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        let result = if is_dir {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        match result {
            Ok(()) => {
                removed += 1;
                info!(path = %path.display(), "Removed orphaned entry");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove orphaned entry");
            }
        }
    }
    removed
}

async fn older_than(entry: &tokio::fs::DirEntry, now: DateTime<Utc>, horizon_hours: i64) -> bool {
    let Ok(meta) = entry.metadata().await else {
        return false;
    };
    let Ok(modified) = meta.modified() else {
        return false;
    };
    let modified: DateTime<Utc> = modified.into();
    now - modified > chrono::Duration::hours(horizon_hours)
}
