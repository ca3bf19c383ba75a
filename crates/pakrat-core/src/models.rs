//! Core data models for pakrat.
//!
//! Job lifecycle types, artifact descriptors, analysis metadata, and the
//! request/response shapes the engine facade exchanges with its callers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assets::AssetKind;

// =============================================================================
// JOB LIFECYCLE
// =============================================================================

/// Status of a job in its lifecycle.
///
/// `Cancelling` is advisory: observers may see it between a cancel request
/// and the checkpoint that honors it. `Completed` is terminal for
/// cancellation purposes but re-enters `Extracting` when a client selects
/// assets to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Initializing,
    Queued,
    Analyzing,
    Extracting,
    Completed,
    Error,
    Cancelling,
    Cancelled,
}

impl JobStatus {
    /// True for states no worker will touch again (absent explicit re-entry).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Error | JobStatus::Cancelled
        )
    }

    /// True while a phase is actively running on the job.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Analyzing | JobStatus::Extracting)
    }

    /// Whether the transition `self -> to` is legal.
    ///
    /// The single transition out of a terminal state is
    /// `Completed -> Extracting` (a client starting the export phase).
    pub fn can_transition_to(&self, to: JobStatus) -> bool {
        use JobStatus::*;
        match (self, to) {
            (Initializing, Queued | Error | Cancelled) => true,
            (Queued, Analyzing | Error | Cancelled) => true,
            (Analyzing, Completed | Error | Cancelling | Cancelled) => true,
            (Completed, Extracting) => true,
            (Extracting, Completed | Error | Cancelling | Cancelled) => true,
            (Cancelling, Cancelled | Error) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Queued => write!(f, "queued"),
            Self::Analyzing => write!(f, "analyzing"),
            Self::Extracting => write!(f, "extracting"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
            Self::Cancelling => write!(f, "cancelling"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// The two processing phases a job can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Analyze,
    Extract,
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analyze => write!(f, "analyze"),
            Self::Extract => write!(f, "extract"),
        }
    }
}

// =============================================================================
// ARTIFACT DESCRIPTION
// =============================================================================

/// Compression detected from an artifact's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    Gzip,
    Zlib,
    Zstd,
    None,
    Unknown,
}

impl std::fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gzip => write!(f, "gzip"),
            Self::Zlib => write!(f, "zlib"),
            Self::Zstd => write!(f, "zstd"),
            Self::None => write!(f, "none"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// What the container parser reports about an opened artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Format label, e.g. `pak`.
    pub format: String,
    /// Container format version.
    pub version: u16,
}

/// Filesystem-level facts about the submitted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    /// Sanitized original file name.
    pub file_name: String,
    pub size_bytes: u64,
    /// Hex of the first header bytes, for format identification.
    pub signature_hex: String,
    pub compression: CompressionKind,
}

// =============================================================================
// ANALYSIS METADATA
// =============================================================================

/// One row of the asset inventory produced by the analyze phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// Stable position in the inventory; extraction selects by this index.
    pub index: usize,
    pub object_id: u64,
    pub kind: AssetKind,
    /// Derived, filesystem-safe display name.
    pub name: String,
    /// Rough on-disk size the export of this asset will take.
    pub estimated_size: u64,
}

/// Full analyze-phase output stored on the job and returned to pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub descriptor: ArtifactDescriptor,
    pub container: ContainerInfo,
    /// Objects enumerated in the container (inventory rows may be fewer when
    /// individual objects failed to materialize).
    pub object_count: usize,
    pub assets: Vec<AssetEntry>,
    /// Inventory rows per kind.
    pub counts: BTreeMap<AssetKind, usize>,
    /// Kinds present, sorted, deduplicated.
    pub kinds: Vec<AssetKind>,
    pub analyzed_at: DateTime<Utc>,
}

// =============================================================================
// EXTRACTION RESULTS
// =============================================================================

/// Per-item outcome counters accumulated during the extract phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    /// Assets written to the work area.
    pub success: u32,
    /// Assets whose read or export failed (or wrote nothing).
    pub failed: u32,
    /// Selected indices outside the inventory bounds.
    pub skipped: u32,
}

impl ExportStats {
    pub fn total(&self) -> u32 {
        self.success + self.failed + self.skipped
    }
}

/// The packaged result archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    /// Hex sha-256 of the archive bytes.
    pub sha256: String,
}

// =============================================================================
// FACADE SHAPES
// =============================================================================

/// One staged file in a submission. The boundary stages uploads into the
/// job's input directory before calling submit; the engine owns the
/// directory (and its removal) from that point on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedFile {
    /// Client-supplied file name (unsanitized).
    pub name: String,
    pub path: PathBuf,
}

/// A job submission.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Rate-limit key identifying the submitting client.
    pub client_key: String,
    /// Directory holding the staged files; removed on validation failure,
    /// cancellation, reclamation, or download-complete without retention.
    pub input_dir: PathBuf,
    pub files: Vec<StagedFile>,
    /// Keep artifacts on disk after the archive is downloaded.
    pub retain_artifacts: bool,
}

/// Immutable view of a job for status pollers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub status: JobStatus,
    /// 0-100 within the current phase.
    pub progress: u8,
    /// 1-based position while queued.
    pub queue_position: Option<usize>,
    /// Queue depth at snapshot time, for "position X of Y" displays.
    pub queue_total: Option<usize>,
    pub metadata: Option<BundleMetadata>,
    pub stats: Option<ExportStats>,
    pub error: Option<String>,
    pub download_ready: bool,
    pub retain_artifacts: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Handed to the boundary when an archive is ready to serve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadTicket {
    pub job_id: Uuid,
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub sha256: String,
    /// True when artifacts will survive the download (no cleanup follows).
    pub retained: bool,
}
