//! Fixed worker pool draining the task queue.
//!
//! Each worker is one loop: claim the front job, run its analyze phase as a
//! spawned child task, await the join handle. The child task boundary is
//! what makes the pool resilient: a panicking phase surfaces as a join
//! error, marks that one job `Error`, and the loop moves on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

use pakrat_core::{Error, JobStatus};

use crate::analyze;
use crate::context::EngineContext;
use crate::events::EngineEvent;
use crate::job::JobHandle;

pub struct WorkerPool;

impl WorkerPool {
    /// Spawn `worker_count` worker loops and return their control handle.
    pub fn start(ctx: Arc<EngineContext>) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let grace = Duration::from_millis(ctx.config.shutdown_grace_ms);

        let count = ctx.config.worker_count.max(1);
        let mut workers = Vec::with_capacity(count);
        for worker_id in 0..count {
            workers.push(tokio::spawn(run_worker(
                ctx.clone(),
                worker_id,
                shutdown_rx.clone(),
            )));
        }

        WorkerHandle {
            shutdown_tx,
            workers,
            grace,
        }
    }
}

/// Handle for stopping a running pool.
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
    grace: Duration,
}

impl WorkerHandle {
    /// Signal every worker, then wait up to the grace period for each loop;
    /// stragglers are aborted.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for (worker_id, mut handle) in self.workers.into_iter().enumerate() {
            match tokio::time::timeout(self.grace, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(worker_id, error = %e, "Worker task panicked"),
                Err(_) => {
                    warn!(worker_id, "Worker did not stop within grace period, aborting");
                    handle.abort();
                }
            }
        }
    }
}

async fn run_worker(
    ctx: Arc<EngineContext>,
    worker_id: usize,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(
        worker_id,
        poll_interval_ms = ctx.config.poll_interval_ms,
        "Worker started"
    );
    ctx.emit(EngineEvent::WorkerStarted { worker_id });

    let poll_interval = Duration::from_millis(ctx.config.poll_interval_ms);

    loop {
        if *shutdown_rx.borrow() {
            info!(worker_id, "Worker received shutdown signal");
            break;
        }

        let Some(job_id) = ctx.queue.dequeue() else {
            // Queue empty; sleep unless shutdown lands first.
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!(worker_id, "Worker received shutdown signal");
                    break;
                }
                _ = sleep(poll_interval) => {}
            }
            continue;
        };

        let Some(job) = ctx.registry.get(job_id).await else {
            warn!(worker_id, %job_id, "Dequeued job missing from registry");
            continue;
        };

        execute(&ctx, worker_id, job).await;
    }

    ctx.emit(EngineEvent::WorkerStopped { worker_id });
    info!(worker_id, "Worker stopped");
}

/// Run one claimed job to a terminal outcome.
async fn execute(ctx: &Arc<EngineContext>, worker_id: usize, job: Arc<JobHandle>) {
    let job_id = job.id();

    // Cancelled while queued, claimed before the cancel resolved it.
    if job.cancel_requested() {
        job.set_error(Error::Cancelled.to_string()).await;
        let _ = job.set_status(JobStatus::Cancelled).await;
        ctx.emit(EngineEvent::JobCancelled { job_id });
        job.work_log("cancelled before start").await;
        job.cleanup().await;
        info!(worker_id, %job_id, "Job cancelled before start");
        return;
    }

    info!(worker_id, %job_id, "Processing job");
    ctx.emit(EngineEvent::JobStarted { job_id, worker_id });

    let task = tokio::spawn({
        let ctx = ctx.clone();
        let job = job.clone();
        async move { analyze::run(&ctx, &job).await }
    });

    let result = match task.await {
        Ok(result) => result,
        Err(e) => {
            error!(worker_id, %job_id, error = %e, "Job task panicked");
            Err(Error::Internal("job task panicked".to_string()))
        }
    };

    match result {
        Ok(()) => {}
        Err(e) if e.is_cancellation() => {
            job.set_error(e.to_string()).await;
            let _ = job.set_status(JobStatus::Cancelled).await;
            ctx.emit(EngineEvent::JobCancelled { job_id });
            job.work_log("analyze cancelled").await;
            job.cleanup().await;
            info!(worker_id, %job_id, "Job cancelled during analyze");
        }
        Err(e) => {
            let message = e.client_message(ctx.config.verbose_errors);
            warn!(worker_id, %job_id, error = %e, "Job failed");
            job.set_error(message.clone()).await;
            let _ = job.set_status(JobStatus::Error).await;
            ctx.emit(EngineEvent::JobFailed {
                job_id,
                error: message,
            });
            job.work_log(&format!("analyze failed: {e}")).await;
            job.cleanup().await;
        }
    }
}
