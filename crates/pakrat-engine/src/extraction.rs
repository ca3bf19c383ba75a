//! Extraction runner: selected inventory rows become files on disk, then
//! one downloadable archive.
//!
//! `spawn` returns immediately; the task queues behind the extraction
//! semaphore, so a saturated engine leaves the job `Completed` (analyze
//! result intact) until a permit frees up. Per-item problems are counters,
//! never fatal; only parse and archive failures end the job in `Error`.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use pakrat_core::{
    defaults, derive_name, sanitize_stem, Archiver, ArtifactEnvironment, ArtifactParser,
    AssetExporter, Error, ExportStats, JobPhase, JobStatus, NameContext, Result, TypedObject,
};

use crate::context::EngineContext;
use crate::events::EngineEvent;
use crate::job::JobHandle;

pub(crate) fn spawn(ctx: Arc<EngineContext>, job: Arc<JobHandle>, indices: Vec<usize>) {
    tokio::spawn(async move {
        // Same child-task boundary as the worker pool: a panicking exporter
        // ends this one job in `Error` instead of stranding it mid-phase.
        let task = tokio::spawn({
            let ctx = ctx.clone();
            let job = job.clone();
            async move { run(&ctx, &job, &indices).await }
        });
        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(job_id = %job.id(), error = %e, "Extraction task panicked");
                Err(Error::Internal("extraction task panicked".to_string()))
            }
        };
        finish(&ctx, &job, result).await;
    });
}

async fn finish(ctx: &Arc<EngineContext>, job: &Arc<JobHandle>, result: Result<()>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_cancellation() => {
            job.set_error(e.to_string()).await;
            let _ = job.set_status(JobStatus::Cancelled).await;
            ctx.emit(EngineEvent::JobCancelled { job_id: job.id() });
            job.work_log("extraction cancelled").await;
            job.cleanup().await;
            info!(job_id = %job.id(), "Job cancelled during extraction");
        }
        Err(e) => {
            let message = e.client_message(ctx.config.verbose_errors);
            warn!(job_id = %job.id(), error = %e, "Extraction failed");
            job.set_error(message.clone()).await;
            let _ = job.set_status(JobStatus::Error).await;
            ctx.emit(EngineEvent::JobFailed {
                job_id: job.id(),
                error: message,
            });
            job.work_log(&format!("extraction failed: {e}")).await;
            job.cleanup().await;
        }
    }
}

async fn run(ctx: &EngineContext, job: &JobHandle, indices: &[usize]) -> Result<()> {
    let _permit = ctx
        .extraction_permits
        .acquire()
        .await
        .map_err(|_| Error::Internal("extraction semaphore closed".to_string()))?;

    let started = Instant::now();

    job.checkpoint()?;
    job.set_status(JobStatus::Extracting).await?;
    job.set_stats(ExportStats::default()).await;
    progress(ctx, job, 0).await;
    ctx.emit(EngineEvent::ExtractionStarted {
        job_id: job.id(),
        selected: indices.len(),
    });
    job.work_log(&format!("extraction started: {} assets selected", indices.len()))
        .await;

    let metadata = job
        .metadata()
        .await
        .ok_or_else(|| Error::Internal("extraction started without metadata".to_string()))?;

    tokio::fs::create_dir_all(job.work_dir()).await?;

    job.checkpoint()?;
    let env = ctx.parser.load(job.artifact_path()).await?;
    let objects = env.objects();

    let mut stats = ExportStats::default();
    let total = indices.len().max(1);
    for (done, &index) in indices.iter().enumerate() {
        job.checkpoint()?;

        match export_one(ctx, job, &metadata, &objects, index).await {
            ItemOutcome::Success => stats.success += 1,
            ItemOutcome::Failed => stats.failed += 1,
            ItemOutcome::Skipped => stats.skipped += 1,
        }
        job.set_stats(stats).await;

        let ceiling = defaults::EXTRACT_LOOP_PROGRESS_CEILING as usize;
        progress(ctx, job, (((done + 1) * ceiling) / total) as u8).await;
    }

    job.checkpoint()?;
    progress(ctx, job, 95).await;

    let stem = format!("{}_{}", sanitize_stem(job.artifact_name()), job.id());
    let archive = ctx
        .archiver
        .package(job.work_dir(), &job.out_dir().join(stem))
        .await?;
    let archive_name = archive.file_name.clone();

    job.set_archive(archive).await;
    job.set_status(JobStatus::Completed).await?;
    progress(ctx, job, 100).await;

    ctx.emit(EngineEvent::ExtractionCompleted {
        job_id: job.id(),
        stats,
    });
    job.work_log(&format!(
        "extraction completed: {} exported, {} failed, {} skipped; archive {archive_name}",
        stats.success, stats.failed, stats.skipped
    ))
    .await;
    info!(
        job_id = %job.id(),
        success = stats.success,
        failed = stats.failed,
        skipped = stats.skipped,
        duration_ms = started.elapsed().as_millis() as u64,
        "Extraction completed"
    );

    Ok(())
}

enum ItemOutcome {
    Success,
    Failed,
    Skipped,
}

/// Export one selected container index into the work area, under its kind's
/// category directory.
async fn export_one(
    ctx: &EngineContext,
    job: &JobHandle,
    metadata: &pakrat_core::BundleMetadata,
    objects: &[Arc<dyn TypedObject>],
    index: usize,
) -> ItemOutcome {
    let Some(object) = objects.get(index) else {
        warn!(job_id = %job.id(), index, "Selected index outside container");
        return ItemOutcome::Skipped;
    };

    let data = match object.read() {
        Ok(data) => data,
        Err(e) => {
            warn!(
                job_id = %job.id(),
                object_id = object.object_id(),
                error = %e,
                "Object read failed"
            );
            return ItemOutcome::Failed;
        }
    };

    // Prefer the inventory name the client selected by; fall back to a
    // fresh derivation for objects that were unreadable at analyze time.
    let name = metadata
        .assets
        .iter()
        .find(|entry| entry.index == index)
        .map(|entry| entry.name.clone())
        .unwrap_or_else(|| {
            derive_name(&NameContext {
                kind: object.kind(),
                object_id: object.object_id(),
                data: Some(&data),
            })
        });

    let category_dir = job.work_dir().join(object.kind().label());
    if let Err(e) = tokio::fs::create_dir_all(&category_dir).await {
        warn!(
            job_id = %job.id(),
            path = %category_dir.display(),
            error = %e,
            "Could not create category directory"
        );
        return ItemOutcome::Failed;
    }

    match ctx.exporter.export(&data, &category_dir.join(&name)).await {
        Ok(true) => ItemOutcome::Success,
        Ok(false) => {
            debug!(job_id = %job.id(), object_id = object.object_id(), "Nothing to write");
            ItemOutcome::Failed
        }
        Err(e) => {
            warn!(
                job_id = %job.id(),
                object_id = object.object_id(),
                error = %e,
                "Export failed"
            );
            ItemOutcome::Failed
        }
    }
}

async fn progress(ctx: &EngineContext, job: &JobHandle, percent: u8) {
    job.set_progress(percent).await;
    ctx.emit(EngineEvent::JobProgress {
        job_id: job.id(),
        phase: JobPhase::Extract,
        percent,
    });
}
