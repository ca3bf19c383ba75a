//! Per-job handle: identity, paths, cancellation flag, and guarded state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use pakrat_core::{
    ArchiveInfo, BundleMetadata, Error, ExportStats, JobSnapshot, JobStatus, Result, StorageConfig,
    SubmitRequest,
};

/// Mutable portion of a job, guarded by one lock.
#[derive(Debug, Clone)]
pub struct JobState {
    pub status: JobStatus,
    /// 0-100 within the current phase.
    pub progress: u8,
    pub metadata: Option<BundleMetadata>,
    pub stats: Option<ExportStats>,
    pub error: Option<String>,
    pub archive: Option<ArchiveInfo>,
    pub updated_at: DateTime<Utc>,
}

/// One tracked job.
///
/// Identity and paths are immutable; everything a poller sees lives in the
/// state lock. Cancellation is a flag the running phase observes at its next
/// checkpoint, never a forced abort.
pub struct JobHandle {
    id: Uuid,
    created_at: DateTime<Utc>,
    client_key: String,
    retain_artifacts: bool,
    /// Staged upload directory; owned by the engine once submitted.
    input_dir: PathBuf,
    /// Export area the asset writers fill.
    work_dir: PathBuf,
    /// Job work root; the archive lands here, beside `work_dir`.
    out_dir: PathBuf,
    /// Primary artifact inside `input_dir`, with its sanitized name.
    artifact_path: PathBuf,
    artifact_name: String,
    log_file: PathBuf,
    cancel_flag: AtomicBool,
    cleaned: AtomicBool,
    state: RwLock<JobState>,
}

impl JobHandle {
    pub fn new(
        id: Uuid,
        request: &SubmitRequest,
        artifact_path: PathBuf,
        artifact_name: String,
        storage: &StorageConfig,
    ) -> Self {
        let out_dir = storage.work_dir(id);
        let work_dir = out_dir.join("export");
        Self {
            id,
            created_at: Utc::now(),
            client_key: request.client_key.clone(),
            retain_artifacts: request.retain_artifacts,
            input_dir: request.input_dir.clone(),
            work_dir,
            out_dir,
            artifact_path,
            artifact_name,
            log_file: storage.log_file(id),
            cancel_flag: AtomicBool::new(false),
            cleaned: AtomicBool::new(false),
            state: RwLock::new(JobState {
                status: JobStatus::Initializing,
                progress: 0,
                metadata: None,
                stats: None,
                error: None,
                archive: None,
                updated_at: Utc::now(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    pub fn retain_artifacts(&self) -> bool {
        self.retain_artifacts
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub fn artifact_name(&self) -> &str {
        &self.artifact_name
    }

    // ---- cancellation ----

    /// Ask the job to stop. The running phase observes the flag at its next
    /// checkpoint; queued jobs are resolved by the caller.
    pub fn request_cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// Cooperative cancellation point: `Err(Cancelled)` once the flag is
    /// set, so cancellation unwinds through phase code as an ordinary error.
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel_requested() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    // ---- guarded state ----

    pub async fn status(&self) -> JobStatus {
        self.state.read().await.status
    }

    /// Move the job to `to`, enforcing the transition table. Setting the
    /// current status again is a no-op.
    pub async fn set_status(&self, to: JobStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let from = state.status;
        if from == to {
            return Ok(());
        }
        if !from.can_transition_to(to) {
            warn!(job_id = %self.id, %from, %to, "Rejected job status transition");
            return Err(Error::InvalidTransition { from, to });
        }
        state.status = to;
        state.updated_at = Utc::now();
        debug!(job_id = %self.id, %from, %to, "Job status transition");
        Ok(())
    }

    pub async fn set_progress(&self, percent: u8) {
        let mut state = self.state.write().await;
        state.progress = percent.min(100);
        state.updated_at = Utc::now();
    }

    pub async fn set_metadata(&self, metadata: BundleMetadata) {
        let mut state = self.state.write().await;
        state.metadata = Some(metadata);
        state.updated_at = Utc::now();
    }

    pub async fn metadata(&self) -> Option<BundleMetadata> {
        self.state.read().await.metadata.clone()
    }

    pub async fn set_stats(&self, stats: ExportStats) {
        let mut state = self.state.write().await;
        state.stats = Some(stats);
        state.updated_at = Utc::now();
    }

    pub async fn set_error(&self, message: String) {
        let mut state = self.state.write().await;
        state.error = Some(message);
        state.updated_at = Utc::now();
    }

    pub async fn set_archive(&self, archive: ArchiveInfo) {
        let mut state = self.state.write().await;
        state.archive = Some(archive);
        state.updated_at = Utc::now();
    }

    pub async fn archive(&self) -> Option<ArchiveInfo> {
        self.state.read().await.archive.clone()
    }

    pub async fn snapshot(
        &self,
        queue_position: Option<usize>,
        queue_total: Option<usize>,
    ) -> JobSnapshot {
        let state = self.state.read().await;
        JobSnapshot {
            id: self.id,
            status: state.status,
            progress: state.progress,
            queue_position,
            queue_total,
            metadata: state.metadata.clone(),
            stats: state.stats,
            error: state.error.clone(),
            download_ready: state.archive.is_some(),
            retain_artifacts: self.retain_artifacts,
            created_at: self.created_at,
            updated_at: state.updated_at,
        }
    }

    // ---- lifecycle ----

    /// Whether the retention horizon has passed for this job.
    pub fn expired_at(&self, now: DateTime<Utc>, retention_hours: i64) -> bool {
        now - self.created_at > Duration::hours(retention_hours)
    }

    /// Remove the job's disk footprint: input dir, work root (export area
    /// and archive), and work log. Exactly-once; repeat and concurrent calls
    /// are no-ops, and missing paths are fine.
    pub async fn cleanup(&self) {
        if self.cleaned.swap(true, Ordering::SeqCst) {
            return;
        }

        let input_dir = self.input_dir.clone();
        let out_dir = self.out_dir.clone();
        let log_file = self.log_file.clone();

        for dir in [input_dir, out_dir] {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        job_id = %self.id,
                        path = %dir.display(),
                        error = %e,
                        "Failed to remove job directory"
                    );
                }
            }
        }
        if let Err(e) = tokio::fs::remove_file(&log_file).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    job_id = %self.id,
                    path = %log_file.display(),
                    error = %e,
                    "Failed to remove job work log"
                );
            }
        }

        debug!(job_id = %self.id, "Job artifacts cleaned");
    }

    /// Append a timestamped line to the per-job work log. Logging must never
    /// fail a job; write errors are demoted to debug. Once `cleanup` has run,
    /// nothing may be written, or the removed log file would come back.
    pub async fn work_log(&self, line: &str) {
        if self.cleaned.load(Ordering::Relaxed) {
            return;
        }
        let entry = format!("{} {line}\n", Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"));
        match tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .await
        {
            Ok(mut file) => {
                if let Err(e) = file.write_all(entry.as_bytes()).await {
                    debug!(job_id = %self.id, error = %e, "Work log write failed");
                }
            }
            Err(e) => debug!(job_id = %self.id, error = %e, "Work log open failed"),
        }
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("client_key", &self.client_key)
            .field("artifact_name", &self.artifact_name)
            .field("cancel_requested", &self.cancel_requested())
            .finish_non_exhaustive()
    }
}
