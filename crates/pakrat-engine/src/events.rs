//! Engine event stream.
//!
//! Events go out over a `tokio::sync::broadcast` channel; sends with no
//! subscribers are ignored. Boundaries use the stream for push-style status
//! (SSE, websockets) instead of polling snapshots.

use uuid::Uuid;

use pakrat_core::{ExportStats, JobPhase};

/// Something the engine did that an observer may care about.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A submission passed validation and joined the queue.
    JobQueued { job_id: Uuid, position: usize },
    /// A worker claimed the job and the analyze phase began.
    JobStarted { job_id: Uuid, worker_id: usize },
    /// Phase progress moved.
    JobProgress {
        job_id: Uuid,
        phase: JobPhase,
        percent: u8,
    },
    /// The analyze phase finished and metadata is available.
    AnalyzeCompleted { job_id: Uuid, object_count: usize },
    /// An extraction task began running.
    ExtractionStarted { job_id: Uuid, selected: usize },
    /// The extraction finished and the archive is ready.
    ExtractionCompleted { job_id: Uuid, stats: ExportStats },
    /// The job ended in `Error`.
    JobFailed { job_id: Uuid, error: String },
    /// The job ended in `Cancelled`.
    JobCancelled { job_id: Uuid },
    /// A worker loop came up.
    WorkerStarted { worker_id: usize },
    /// A worker loop exited.
    WorkerStopped { worker_id: usize },
    /// A reclamation sweep finished.
    SweepCompleted {
        reclaimed_jobs: usize,
        orphans_removed: usize,
    },
}
