//! Engine and storage configuration.
//!
//! Both structs load from `PAKRAT_*` environment variables with fallback to
//! the constants in [`crate::defaults`], and carry `with_*` builders so
//! embedders and tests can override individual knobs.

use std::path::{Path, PathBuf};

use crate::defaults;
use crate::error::Result;

/// Tunables for the orchestration engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of worker loops draining the task queue.
    pub worker_count: usize,
    /// Idle backoff between queue polls in milliseconds.
    pub poll_interval_ms: u64,
    /// Grace period for worker loops to finish on shutdown (milliseconds).
    pub shutdown_grace_ms: u64,
    /// Whether submission rate limiting is enforced.
    pub rate_limit_enabled: bool,
    /// Maximum submissions per client within the window.
    pub rate_limit_max_requests: u32,
    /// Sliding window length in seconds.
    pub rate_limit_window_secs: u64,
    /// Hours a job and its on-disk footprint are kept before reclamation.
    pub retention_hours: i64,
    /// Seconds between reclamation sweeps.
    pub sweep_interval_secs: u64,
    /// Cap on concurrently running extraction tasks.
    pub max_concurrent_extractions: usize,
    /// Maximum accepted artifact size in bytes.
    pub max_artifact_bytes: u64,
    /// Surface full error detail to clients instead of a generic message.
    pub verbose_errors: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: defaults::WORKER_COUNT,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            shutdown_grace_ms: defaults::SHUTDOWN_GRACE_MS,
            rate_limit_enabled: true,
            rate_limit_max_requests: defaults::RATE_LIMIT_MAX_REQUESTS,
            rate_limit_window_secs: defaults::RATE_LIMIT_WINDOW_SECS,
            retention_hours: defaults::RETENTION_HOURS,
            sweep_interval_secs: defaults::SWEEP_INTERVAL_SECS,
            max_concurrent_extractions: defaults::MAX_CONCURRENT_EXTRACTIONS,
            max_artifact_bytes: defaults::MAX_ARTIFACT_BYTES,
            verbose_errors: false,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `PAKRAT_WORKERS` | `2` | Worker loops draining the queue |
    /// | `PAKRAT_POLL_INTERVAL_MS` | `500` | Idle backoff between polls |
    /// | `PAKRAT_SHUTDOWN_GRACE_MS` | `1000` | Shutdown join timeout |
    /// | `PAKRAT_RATE_LIMIT_ENABLED` | `true` | Enforce submission limiting |
    /// | `PAKRAT_RATE_LIMIT_MAX` | `10` | Submissions per window |
    /// | `PAKRAT_RATE_LIMIT_WINDOW_SECS` | `60` | Window length |
    /// | `PAKRAT_RETENTION_HOURS` | `24` | Reclamation horizon |
    /// | `PAKRAT_SWEEP_INTERVAL_SECS` | `3600` | Sweep period |
    /// | `PAKRAT_MAX_CONCURRENT_EXTRACTIONS` | `4` | Extraction permits |
    /// | `PAKRAT_MAX_ARTIFACT_BYTES` | `524288000` | Artifact size cap |
    /// | `PAKRAT_VERBOSE_ERRORS` | `false` | Client-visible error detail |
    pub fn from_env() -> Self {
        let defaults_cfg = Self::default();

        let worker_count = env_parse("PAKRAT_WORKERS", defaults_cfg.worker_count).max(1);
        let poll_interval_ms =
            env_parse("PAKRAT_POLL_INTERVAL_MS", defaults_cfg.poll_interval_ms).max(1);
        let shutdown_grace_ms =
            env_parse("PAKRAT_SHUTDOWN_GRACE_MS", defaults_cfg.shutdown_grace_ms);
        let rate_limit_enabled = env_flag("PAKRAT_RATE_LIMIT_ENABLED", true);
        let rate_limit_max_requests = env_parse(
            "PAKRAT_RATE_LIMIT_MAX",
            defaults_cfg.rate_limit_max_requests,
        )
        .max(1);
        let rate_limit_window_secs = env_parse(
            "PAKRAT_RATE_LIMIT_WINDOW_SECS",
            defaults_cfg.rate_limit_window_secs,
        )
        .max(1);
        let retention_hours =
            env_parse("PAKRAT_RETENTION_HOURS", defaults_cfg.retention_hours).max(1);
        let sweep_interval_secs = env_parse(
            "PAKRAT_SWEEP_INTERVAL_SECS",
            defaults_cfg.sweep_interval_secs,
        )
        .max(1);
        let max_concurrent_extractions = env_parse(
            "PAKRAT_MAX_CONCURRENT_EXTRACTIONS",
            defaults_cfg.max_concurrent_extractions,
        )
        .max(1);
        let max_artifact_bytes =
            env_parse("PAKRAT_MAX_ARTIFACT_BYTES", defaults_cfg.max_artifact_bytes).max(1);
        let verbose_errors = env_flag("PAKRAT_VERBOSE_ERRORS", false);

        Self {
            worker_count,
            poll_interval_ms,
            shutdown_grace_ms,
            rate_limit_enabled,
            rate_limit_max_requests,
            rate_limit_window_secs,
            retention_hours,
            sweep_interval_secs,
            max_concurrent_extractions,
            max_artifact_bytes,
            verbose_errors,
        }
    }

    /// Set the number of worker loops.
    pub fn with_workers(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    /// Set the idle poll backoff.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms.max(1);
        self
    }

    /// Set the shutdown grace period.
    pub fn with_shutdown_grace(mut self, ms: u64) -> Self {
        self.shutdown_grace_ms = ms;
        self
    }

    /// Enable or disable submission rate limiting.
    pub fn with_rate_limit_enabled(mut self, enabled: bool) -> Self {
        self.rate_limit_enabled = enabled;
        self
    }

    /// Set the rate limit window parameters.
    pub fn with_rate_limit(mut self, max_requests: u32, window_secs: u64) -> Self {
        self.rate_limit_max_requests = max_requests.max(1);
        self.rate_limit_window_secs = window_secs.max(1);
        self
    }

    /// Set the reclamation horizon in hours.
    pub fn with_retention_hours(mut self, hours: i64) -> Self {
        self.retention_hours = hours.max(1);
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, secs: u64) -> Self {
        self.sweep_interval_secs = secs.max(1);
        self
    }

    /// Set the extraction concurrency cap.
    pub fn with_max_concurrent_extractions(mut self, max: usize) -> Self {
        self.max_concurrent_extractions = max.max(1);
        self
    }

    /// Set the artifact size cap.
    pub fn with_max_artifact_bytes(mut self, bytes: u64) -> Self {
        self.max_artifact_bytes = bytes.max(1);
        self
    }

    /// Surface full error detail to clients.
    pub fn with_verbose_errors(mut self, verbose: bool) -> Self {
        self.verbose_errors = verbose;
        self
    }
}

/// On-disk roots the engine owns.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Staged uploads, one subdirectory per job id.
    pub upload_root: PathBuf,
    /// Extraction work areas and archives, one subdirectory per job id.
    pub work_root: PathBuf,
    /// Per-job work logs, `<job_id>.log`.
    pub log_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::from(defaults::UPLOAD_ROOT),
            work_root: PathBuf::from(defaults::WORK_ROOT),
            log_root: PathBuf::from(defaults::LOG_ROOT),
        }
    }
}

impl StorageConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// Reads `PAKRAT_UPLOAD_ROOT`, `PAKRAT_WORK_ROOT`, `PAKRAT_LOG_ROOT`.
    pub fn from_env() -> Self {
        Self {
            upload_root: env_path("PAKRAT_UPLOAD_ROOT", defaults::UPLOAD_ROOT),
            work_root: env_path("PAKRAT_WORK_ROOT", defaults::WORK_ROOT),
            log_root: env_path("PAKRAT_LOG_ROOT", defaults::LOG_ROOT),
        }
    }

    /// Root all three directories under one base path.
    pub fn under<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref();
        Self {
            upload_root: base.join(defaults::UPLOAD_ROOT),
            work_root: base.join(defaults::WORK_ROOT),
            log_root: base.join(defaults::LOG_ROOT),
        }
    }

    /// Create the storage roots if they do not exist yet.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.upload_root)?;
        std::fs::create_dir_all(&self.work_root)?;
        std::fs::create_dir_all(&self.log_root)?;
        Ok(())
    }

    /// Input directory for a job.
    pub fn input_dir(&self, job_id: uuid::Uuid) -> PathBuf {
        self.upload_root.join(job_id.to_string())
    }

    /// Work directory for a job (exports and archive live below it).
    pub fn work_dir(&self, job_id: uuid::Uuid) -> PathBuf {
        self.work_root.join(job_id.to_string())
    }

    /// Work-log file for a job.
    pub fn log_file(&self, job_id: uuid::Uuid) -> PathBuf {
        self.log_root.join(format!("{job_id}.log"))
    }
}

fn env_parse<T: std::str::FromStr + Copy>(var: &str, default: T) -> T {
    match std::env::var(var) {
        Ok(v) => match v.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(variable = var, value = %v, "Unparseable value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_flag(var: &str, default: bool) -> bool {
    match std::env::var(var) {
        Ok(v) => v != "false" && v != "0",
        Err(_) => default,
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
