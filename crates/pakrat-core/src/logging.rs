//! Structured logging schema and field name constants for pakrat.
//!
//! All crates use these constants for consistent structured logging fields.
//! This ensures log aggregation tools (Loki, Elasticsearch) can query by
//! standardized field names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Job failed, phase aborted, sweep I/O failure |
//! | WARN  | Recoverable per-item failure, skipped index, rate-limit reject |
//! | INFO  | Lifecycle events (submit, start, complete, cancel, worker up/down) |
//! | DEBUG | Progress updates, decision points, config choices |
//! | TRACE | Per-object iteration, high-volume record detail |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Job UUID being processed.
pub const JOB_ID: &str = "job_id";

/// Worker loop index (0-based) handling the job.
pub const WORKER_ID: &str = "worker_id";

/// Processing phase. Values: "analyze", "extract"
pub const PHASE: &str = "phase";

/// Logical operation name.
/// Examples: "submit", "cancel", "sweep_once", "package"
pub const OPERATION: &str = "op";

/// Rate-limit key identifying the submitting client.
pub const CLIENT_KEY: &str = "client_key";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Jobs waiting in the task queue.
pub const QUEUE_SIZE: &str = "queue_size";

/// Phase progress percentage (0-100).
pub const PROGRESS: &str = "progress";

/// Objects enumerated from an artifact.
pub const OBJECT_COUNT: &str = "object_count";

/// Assets written during an extraction.
pub const EXPORTED_COUNT: &str = "exported_count";

/// Registry entries reclaimed by a sweep.
pub const RECLAIMED: &str = "reclaimed";

/// Orphaned filesystem entries removed by a sweep.
pub const ORPHANS_REMOVED: &str = "orphans_removed";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
