//! Engine facade: the operations a boundary (HTTP layer, CLI, tests) calls.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use pakrat_core::{
    is_allowed_artifact, pick_primary, sanitize_filename, ArtifactParser, Archiver, AssetExporter,
    DownloadTicket, EngineConfig, Error, JobSnapshot, JobStatus, Result, StagedFile, StorageConfig,
    SubmitRequest,
};

use crate::context::EngineContext;
use crate::events::EngineEvent;
use crate::extraction;
use crate::job::JobHandle;
use crate::sweep::{ReclamationSweeper, SweeperHandle};
use crate::worker::{WorkerHandle, WorkerPool};

/// The orchestration engine.
///
/// Construction wires the collaborator seams; `start` brings up the worker
/// pool and the reclamation sweeper. All operations are safe to call before
/// `start` (jobs simply wait in the queue).
pub struct JobEngine {
    ctx: Arc<EngineContext>,
    workers: Option<WorkerHandle>,
    sweeper: Option<SweeperHandle>,
}

impl JobEngine {
    pub fn new(
        config: EngineConfig,
        storage: StorageConfig,
        parser: Arc<dyn ArtifactParser>,
        exporter: Arc<dyn AssetExporter>,
        archiver: Arc<dyn Archiver>,
    ) -> Result<Self> {
        storage.ensure_dirs()?;
        let ctx = EngineContext::new(config, storage, parser, exporter, archiver);
        Ok(Self {
            ctx,
            workers: None,
            sweeper: None,
        })
    }

    /// Launch the worker pool and the sweeper. Idempotent.
    pub fn start(&mut self) {
        if self.workers.is_none() {
            self.workers = Some(WorkerPool::start(self.ctx.clone()));
        }
        if self.sweeper.is_none() {
            self.sweeper = Some(ReclamationSweeper::start(self.ctx.clone()));
        }
        info!(
            workers = self.ctx.config.worker_count,
            sweep_interval_secs = self.ctx.config.sweep_interval_secs,
            "Engine started"
        );
    }

    /// Stop the pool (grace period, then abort) and the sweeper.
    pub async fn shutdown(&mut self) {
        if let Some(workers) = self.workers.take() {
            workers.shutdown().await;
        }
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.shutdown().await;
        }
        info!("Engine stopped");
    }

    /// Shared context, for embedders and tests that reach past the facade.
    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    pub fn queue_depth(&self) -> usize {
        self.ctx.queue.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.ctx.subscribe()
    }

    // ---- operations ----

    /// Accept a staged submission into the queue.
    ///
    /// The engine owns `input_dir` from this call on: every rejection path
    /// (rate limit included) removes the staged files, so nothing lingers
    /// for a job that never existed.
    pub async fn submit(&self, request: SubmitRequest) -> Result<Uuid> {
        if let Err(e) = self.ctx.limiter.check(&request.client_key).await {
            self.discard_input(&request).await;
            return Err(e);
        }

        let (artifact_path, artifact_name) = match self.validate(&request).await {
            Ok(primary) => primary,
            Err(e) => {
                self.discard_input(&request).await;
                return Err(e);
            }
        };

        let job_id = Uuid::new_v4();
        let job = Arc::new(JobHandle::new(
            job_id,
            &request,
            artifact_path,
            artifact_name,
            &self.ctx.storage,
        ));

        self.ctx.registry.insert(job.clone()).await;
        job.set_status(JobStatus::Queued).await?;
        self.ctx.queue.enqueue(job_id);
        let position = self.ctx.queue.position(job_id).unwrap_or(1);

        self.ctx.emit(EngineEvent::JobQueued { job_id, position });
        job.work_log(&format!(
            "submitted by {}: {} at queue position {position}",
            request.client_key,
            job.artifact_name()
        ))
        .await;
        info!(
            %job_id,
            client_key = %request.client_key,
            artifact = job.artifact_name(),
            position,
            "Job submitted"
        );

        Ok(job_id)
    }

    /// Status snapshot; queue position and total are present while `Queued`.
    pub async fn job_status(&self, job_id: Uuid) -> Result<JobSnapshot> {
        let job = self.require(job_id).await?;
        let (position, total) = if job.status().await == JobStatus::Queued {
            (self.ctx.queue.position(job_id), Some(self.ctx.queue.len()))
        } else {
            (None, None)
        };
        Ok(job.snapshot(position, total).await)
    }

    /// Begin exporting the selected inventory indices.
    ///
    /// Legal only from `Completed` with analysis metadata present. Returns
    /// as soon as the extraction task is spawned; saturation of the
    /// extraction cap delays the task, not this call.
    pub async fn start_extraction(&self, job_id: Uuid, indices: Vec<usize>) -> Result<()> {
        let job = self.require(job_id).await?;

        if indices.is_empty() {
            return Err(Error::Validation("no asset indices selected".to_string()));
        }
        let status = job.status().await;
        if status != JobStatus::Completed {
            return Err(Error::Validation(format!(
                "extraction requires a completed analysis, job is {status}"
            )));
        }
        if job.metadata().await.is_none() {
            return Err(Error::Validation(
                "job has no analysis metadata".to_string(),
            ));
        }

        debug!(%job_id, selected = indices.len(), "Extraction accepted");
        extraction::spawn(self.ctx.clone(), job, indices);
        Ok(())
    }

    /// Same snapshot surface as `job_status`; named for the extract phase.
    pub async fn extraction_status(&self, job_id: Uuid) -> Result<JobSnapshot> {
        self.job_status(job_id).await
    }

    /// Hand out the archive for serving. `NotFound` until extraction has
    /// packaged one.
    pub async fn request_download(&self, job_id: Uuid) -> Result<DownloadTicket> {
        let job = self.require(job_id).await?;
        let archive = job
            .archive()
            .await
            .ok_or_else(|| Error::NotFound(format!("no archive ready for job {job_id}")))?;

        Ok(DownloadTicket {
            job_id,
            path: archive.path,
            file_name: archive.file_name,
            size_bytes: archive.size_bytes,
            sha256: archive.sha256,
            retained: job.retain_artifacts(),
        })
    }

    /// The boundary calls this after the archive bytes were served. Without
    /// retention the job's footprint and record are reclaimed immediately;
    /// with retention the sweep reclaims later.
    pub async fn complete_download(&self, job_id: Uuid) -> Result<()> {
        let job = self.require(job_id).await?;
        if job.retain_artifacts() {
            debug!(%job_id, "Download complete, artifacts retained");
            return Ok(());
        }
        job.cleanup().await;
        self.ctx.registry.remove(job_id).await;
        info!(%job_id, "Download complete, job reclaimed");
        Ok(())
    }

    /// Cancel a job. Terminal jobs are a successful no-op; queued jobs are
    /// resolved here; running jobs get the flag and finish at their next
    /// checkpoint. Returns the status after the cancel took effect.
    pub async fn cancel(&self, job_id: Uuid) -> Result<JobStatus> {
        let job = self.require(job_id).await?;
        let status = job.status().await;

        if status.is_terminal() {
            debug!(%job_id, %status, "Cancel of terminal job is a no-op");
            return Ok(status);
        }

        job.request_cancel();

        match status {
            JobStatus::Initializing | JobStatus::Queued => {
                self.ctx.queue.remove(job_id);
                job.set_error(Error::Cancelled.to_string()).await;
                let _ = job.set_status(JobStatus::Cancelled).await;
                self.ctx.emit(EngineEvent::JobCancelled { job_id });
                job.work_log("cancelled while queued").await;
                job.cleanup().await;
                info!(%job_id, "Job cancelled while queued");
                Ok(JobStatus::Cancelled)
            }
            _ => {
                let _ = job.set_status(JobStatus::Cancelling).await;
                info!(%job_id, "Job cancellation requested");
                Ok(job.status().await)
            }
        }
    }

    // ---- helpers ----

    async fn require(&self, job_id: Uuid) -> Result<Arc<JobHandle>> {
        self.ctx
            .registry
            .get(job_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("job {job_id}")))
    }

    /// Validate a submission and locate its primary artifact.
    async fn validate(&self, request: &SubmitRequest) -> Result<(std::path::PathBuf, String)> {
        if request.files.is_empty() {
            return Err(Error::Validation("no files staged".to_string()));
        }

        let mut staged = Vec::with_capacity(request.files.len());
        for file in &request.files {
            let clean = sanitize_filename(&file.name);
            if !is_allowed_artifact(&clean) {
                return Err(Error::Validation(format!(
                    "file type of '{clean}' is not allowed"
                )));
            }
            staged.push(StagedFile {
                name: clean,
                path: file.path.clone(),
            });
        }

        let primary = pick_primary(&staged).ok_or_else(|| {
            Error::Validation("no primary artifact among staged files".to_string())
        })?;

        let meta = tokio::fs::metadata(&primary.path).await.map_err(|e| {
            Error::Validation(format!("staged file '{}' unreadable: {e}", primary.name))
        })?;
        if meta.len() > self.ctx.config.max_artifact_bytes {
            return Err(Error::Validation(format!(
                "artifact is {} bytes, cap is {} bytes",
                meta.len(),
                self.ctx.config.max_artifact_bytes
            )));
        }

        Ok((primary.path.clone(), primary.name.clone()))
    }

    async fn discard_input(&self, request: &SubmitRequest) {
        if let Err(e) = tokio::fs::remove_dir_all(&request.input_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    path = %request.input_dir.display(),
                    error = %e,
                    "Failed to remove rejected staging directory"
                );
            }
        }
    }
}
