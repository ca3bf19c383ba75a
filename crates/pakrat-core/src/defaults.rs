//! Centralized default constants for the pakrat engine.
//!
//! **This module is the single source of truth** for all shared default values.
//! All crates and embedders should reference these constants instead of
//! defining their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// WORKER POOL
// =============================================================================

/// Default number of worker loops draining the task queue.
pub const WORKER_COUNT: usize = 2;

/// Default idle backoff between queue polls in milliseconds.
pub const POLL_INTERVAL_MS: u64 = 500;

/// Default grace period for worker loops to finish on shutdown (milliseconds).
pub const SHUTDOWN_GRACE_MS: u64 = 1_000;

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Default maximum submissions per client within the window.
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 10;

/// Default sliding window length in seconds.
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

// =============================================================================
// RECLAMATION
// =============================================================================

/// Default retention horizon in hours. Jobs (and their on-disk footprint)
/// older than this are reclaimed by the sweep.
pub const RETENTION_HOURS: i64 = 24;

/// Default interval between reclamation sweeps in seconds.
pub const SWEEP_INTERVAL_SECS: u64 = 3_600;

// =============================================================================
// EXTRACTION
// =============================================================================

/// Default cap on concurrently running extraction tasks. Extractions beyond
/// the cap wait for a permit rather than failing.
pub const MAX_CONCURRENT_EXTRACTIONS: usize = 4;

/// Progress ceiling for the per-item extraction loop; the remainder is
/// reserved for archive packaging (95) and completion (100).
pub const EXTRACT_LOOP_PROGRESS_CEILING: u8 = 90;

// =============================================================================
// ARTIFACTS
// =============================================================================

/// Maximum accepted artifact size in bytes (500 MB).
/// Configurable via `PAKRAT_MAX_ARTIFACT_BYTES`.
pub const MAX_ARTIFACT_BYTES: u64 = 500 * 1024 * 1024;

/// Bytes of file header captured for the artifact signature.
pub const SIGNATURE_HEADER_LEN: usize = 8;

/// Maximum filename length (ext4/NTFS compatible).
pub const FILENAME_MAX_LENGTH: usize = 255;

// =============================================================================
// STORAGE ROOTS
// =============================================================================

/// Default directory for staged uploads, one subdirectory per job.
pub const UPLOAD_ROOT: &str = "uploads";

/// Default directory for extraction work areas and archives.
pub const WORK_ROOT: &str = "work";

/// Default directory for per-job work logs.
pub const LOG_ROOT: &str = "logs";

// =============================================================================
// EVENTS
// =============================================================================

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;
