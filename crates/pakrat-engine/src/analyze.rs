//! Analyze phase: fingerprint, parse, inventory.

use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

use pakrat_core::{
    derive_name, read_fingerprint, ArtifactDescriptor, ArtifactEnvironment, ArtifactParser,
    AssetEntry, AssetKind, BundleMetadata, Error, JobPhase, NameContext, Result, TypedObject,
};

use crate::context::EngineContext;
use crate::events::EngineEvent;
use crate::job::JobHandle;

/// Run the analyze phase to completion on the calling task.
///
/// Progress milestones: 10 started, 20 fingerprinted, 40 parsed, 60
/// enumerated, 90 inventoried, 100 stored. A checkpoint guards every step,
/// so cancellation unwinds between any two milestones.
pub(crate) async fn run(ctx: &EngineContext, job: &JobHandle) -> Result<()> {
    let started = Instant::now();

    job.checkpoint()?;
    job.set_status(pakrat_core::JobStatus::Analyzing).await?;
    progress(ctx, job, 10).await;
    job.work_log(&format!("analyze started: {}", job.artifact_name()))
        .await;

    job.checkpoint()?;
    let fingerprint = read_fingerprint(job.artifact_path())?;
    if fingerprint.size_bytes > ctx.config.max_artifact_bytes {
        return Err(Error::Validation(format!(
            "artifact is {} bytes, cap is {} bytes",
            fingerprint.size_bytes, ctx.config.max_artifact_bytes
        )));
    }
    let descriptor = ArtifactDescriptor {
        file_name: job.artifact_name().to_string(),
        size_bytes: fingerprint.size_bytes,
        signature_hex: fingerprint.signature_hex,
        compression: fingerprint.compression,
    };
    progress(ctx, job, 20).await;

    job.checkpoint()?;
    let env = ctx.parser.load(job.artifact_path()).await?;
    progress(ctx, job, 40).await;

    job.checkpoint()?;
    let objects = env.objects();
    let object_count = objects.len();
    progress(ctx, job, 60).await;

    // Inventory rows keep the container enumeration index, so extraction
    // selections map straight back to objects. Unreadable objects are
    // dropped from the inventory, not fatal.
    let mut assets = Vec::with_capacity(object_count);
    for (index, object) in objects.iter().enumerate() {
        job.checkpoint()?;
        let data = match object.read() {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    job_id = %job.id(),
                    object_id = object.object_id(),
                    error = %e,
                    "Skipping unreadable object"
                );
                continue;
            }
        };
        let name = derive_name(&NameContext {
            kind: object.kind(),
            object_id: object.object_id(),
            data: Some(&data),
        });
        assets.push(AssetEntry {
            index,
            object_id: object.object_id(),
            kind: object.kind(),
            name,
            estimated_size: data.estimated_export_size(),
        });
    }
    progress(ctx, job, 90).await;

    job.checkpoint()?;
    let mut counts: BTreeMap<AssetKind, usize> = BTreeMap::new();
    for entry in &assets {
        *counts.entry(entry.kind).or_insert(0) += 1;
    }
    let kinds: Vec<AssetKind> = counts.keys().copied().collect();
    let inventory_len = assets.len();

    job.set_metadata(BundleMetadata {
        descriptor,
        container: env.container_info(),
        object_count,
        assets,
        counts,
        kinds,
        analyzed_at: Utc::now(),
    })
    .await;
    job.set_status(pakrat_core::JobStatus::Completed).await?;
    progress(ctx, job, 100).await;

    ctx.emit(EngineEvent::AnalyzeCompleted {
        job_id: job.id(),
        object_count,
    });
    job.work_log(&format!(
        "analyze completed: {inventory_len} of {object_count} objects inventoried"
    ))
    .await;
    info!(
        job_id = %job.id(),
        object_count,
        inventory_len,
        duration_ms = started.elapsed().as_millis() as u64,
        "Analyze completed"
    );

    Ok(())
}

async fn progress(ctx: &EngineContext, job: &JobHandle, percent: u8) {
    job.set_progress(percent).await;
    ctx.emit(EngineEvent::JobProgress {
        job_id: job.id(),
        phase: JobPhase::Analyze,
        percent,
    });
}
