//! Integration tests for cooperative cancellation.
//!
//! This test suite validates:
//! - Cancel-001: Queued jobs resolve to Cancelled immediately
//! - Cancel-002: Cancelling one queued job leaves the others in order
//! - Cancel-003: A running analyze stops at its next checkpoint
//! - Cancel-004: A running extraction stops at its next checkpoint
//! - Cancel-005: Cancel is idempotent and a no-op on terminal jobs
//! - Cancel-006: Cancelled jobs keep a pollable record but no disk footprint

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use uuid::Uuid;

use pakrat_core::{
    ArchiveInfo, Archiver, ArtifactEnvironment, ArtifactParser, AssetData, AssetExporter,
    AssetKind, ContainerInfo, EngineConfig, Error, JobStatus, Result, StagedFile, StorageConfig,
    SubmitRequest, TextData, TypedObject,
};
use pakrat_engine::JobEngine;

// ============================================================================
// SCRIPTED DOUBLES
// ============================================================================

struct ScriptedObject {
    object_id: u64,
    data: AssetData,
}

impl TypedObject for ScriptedObject {
    fn kind(&self) -> AssetKind {
        self.data.kind()
    }

    fn object_id(&self) -> u64 {
        self.object_id
    }

    fn read(&self) -> Result<AssetData> {
        Ok(self.data.clone())
    }
}

struct ScriptedEnvironment {
    objects: Vec<Arc<dyn TypedObject>>,
}

impl ArtifactEnvironment for ScriptedEnvironment {
    fn container_info(&self) -> ContainerInfo {
        ContainerInfo {
            format: "pak".to_string(),
            version: 1,
        }
    }

    fn objects(&self) -> Vec<Arc<dyn TypedObject>> {
        self.objects.clone()
    }
}

struct ScriptedParser {
    object_count: usize,
    delay: Duration,
}

impl ScriptedParser {
    fn new(object_count: usize) -> Self {
        Self {
            object_count,
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ArtifactParser for ScriptedParser {
    async fn load(&self, _path: &Path) -> Result<Box<dyn ArtifactEnvironment>> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        let objects = (0..self.object_count)
            .map(|i| {
                Arc::new(ScriptedObject {
                    object_id: i as u64,
                    data: AssetData::Text(TextData {
                        name: format!("entry_{i}"),
                        content: "text".to_string(),
                    }),
                }) as Arc<dyn TypedObject>
            })
            .collect();
        Ok(Box::new(ScriptedEnvironment { objects }))
    }
}

/// Exporter double that takes `delay` per item, so a multi-item extraction
/// stays in flight long enough to cancel.
struct SlowExporter {
    delay: Duration,
}

#[async_trait]
impl AssetExporter for SlowExporter {
    async fn export(&self, _data: &AssetData, _dest: &Path) -> Result<bool> {
        sleep(self.delay).await;
        Ok(true)
    }
}

struct StubArchiver;

#[async_trait]
impl Archiver for StubArchiver {
    async fn package(&self, _source_dir: &Path, dest_stem: &Path) -> Result<ArchiveInfo> {
        let mut path = dest_stem.as_os_str().to_owned();
        path.push(".tar.gz");
        let path = PathBuf::from(path);
        tokio::fs::write(&path, b"stub archive").await?;
        Ok(ArchiveInfo {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size_bytes: 12,
            sha256: "0".repeat(64),
            path,
        })
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn test_config() -> EngineConfig {
    EngineConfig::default()
        .with_workers(1)
        .with_poll_interval(10)
        .with_shutdown_grace(500)
        .with_rate_limit_enabled(false)
}

fn build_engine(
    base: &Path,
    config: EngineConfig,
    parser: Arc<dyn ArtifactParser>,
    exporter: Arc<dyn AssetExporter>,
) -> (JobEngine, StorageConfig) {
    let storage = StorageConfig::under(base);
    let engine = JobEngine::new(
        config,
        storage.clone(),
        parser,
        exporter,
        Arc::new(StubArchiver),
    )
    .expect("engine construction");
    (engine, storage)
}

struct QuickExporter;

#[async_trait]
impl AssetExporter for QuickExporter {
    async fn export(&self, _data: &AssetData, _dest: &Path) -> Result<bool> {
        Ok(true)
    }
}

fn stage_submission(storage: &StorageConfig, file_name: &str) -> SubmitRequest {
    let input_dir = storage.upload_root.join(Uuid::new_v4().to_string());
    std::fs::create_dir_all(&input_dir).expect("staging dir");
    let path = input_dir.join(file_name);
    std::fs::write(&path, b"PAKBNDL1 payload").expect("staged file");
    SubmitRequest {
        client_key: "client-a".to_string(),
        input_dir,
        files: vec![StagedFile {
            name: file_name.to_string(),
            path,
        }],
        retain_artifacts: false,
    }
}

async fn wait_for_status(
    engine: &JobEngine,
    job_id: Uuid,
    expected: JobStatus,
    timeout_secs: u64,
) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed().as_secs() < timeout_secs {
        if let Ok(snapshot) = engine.job_status(job_id).await {
            if snapshot.status == expected {
                return true;
            }
        }
        sleep(Duration::from_millis(20)).await;
    }
    false
}

async fn wait_for_download_ready(engine: &JobEngine, job_id: Uuid, timeout_secs: u64) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed().as_secs() < timeout_secs {
        if let Ok(snapshot) = engine.job_status(job_id).await {
            if snapshot.download_ready {
                return true;
            }
        }
        sleep(Duration::from_millis(20)).await;
    }
    false
}

// ============================================================================
// INTEGRATION TESTS - Cancelling Queued Jobs
// ============================================================================

#[tokio::test]
async fn test_cancel_queued_job_resolves_immediately() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, storage) = build_engine(
        tmp.path(),
        test_config(),
        Arc::new(ScriptedParser::new(1)),
        Arc::new(QuickExporter),
    );

    let request = stage_submission(&storage, "level.pak");
    let input_dir = request.input_dir.clone();
    let job_id = engine.submit(request).await.unwrap();
    assert_eq!(engine.queue_depth(), 1);

    let status = engine.cancel(job_id).await.unwrap();
    assert_eq!(status, JobStatus::Cancelled);
    assert_eq!(engine.queue_depth(), 0);

    // The record stays pollable; the disk footprint does not.
    let snapshot = engine.job_status(job_id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Cancelled);
    assert_eq!(snapshot.error.as_deref(), Some("Job cancelled"));
    assert!(!input_dir.exists(), "Staged input must be removed");
}

#[tokio::test]
async fn test_cancel_leaves_other_jobs_ordered() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut engine, storage) = build_engine(
        tmp.path(),
        test_config(),
        Arc::new(ScriptedParser::new(1)),
        Arc::new(QuickExporter),
    );

    let a = engine.submit(stage_submission(&storage, "a.pak")).await.unwrap();
    let b = engine.submit(stage_submission(&storage, "b.pak")).await.unwrap();
    let c = engine.submit(stage_submission(&storage, "c.pak")).await.unwrap();

    engine.cancel(b).await.unwrap();

    let first = engine.job_status(a).await.unwrap();
    assert_eq!(first.queue_position, Some(1));
    assert_eq!(first.queue_total, Some(2));
    let last = engine.job_status(c).await.unwrap();
    assert_eq!(last.queue_position, Some(2));

    engine.start();
    assert!(wait_for_status(&engine, a, JobStatus::Completed, 5).await);
    assert!(wait_for_status(&engine, c, JobStatus::Completed, 5).await);
    assert_eq!(
        engine.job_status(b).await.unwrap().status,
        JobStatus::Cancelled,
        "The cancelled job must stay cancelled"
    );
    engine.shutdown().await;
}

// ============================================================================
// INTEGRATION TESTS - Cancelling Running Phases
// ============================================================================

#[tokio::test]
async fn test_cancel_while_analyzing_stops_at_checkpoint() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut engine, storage) = build_engine(
        tmp.path(),
        test_config(),
        Arc::new(ScriptedParser::new(1).with_delay(Duration::from_millis(800))),
        Arc::new(QuickExporter),
    );
    engine.start();

    let request = stage_submission(&storage, "slow.pak");
    let input_dir = request.input_dir.clone();
    let job_id = engine.submit(request).await.unwrap();
    assert!(wait_for_status(&engine, job_id, JobStatus::Analyzing, 5).await);

    let status = engine.cancel(job_id).await.unwrap();
    assert!(
        matches!(status, JobStatus::Cancelling | JobStatus::Cancelled),
        "got {status}"
    );

    assert!(
        wait_for_status(&engine, job_id, JobStatus::Cancelled, 5).await,
        "The phase should observe the flag at its next checkpoint"
    );
    let snapshot = engine.job_status(job_id).await.unwrap();
    assert_eq!(snapshot.error.as_deref(), Some("Job cancelled"));
    assert!(snapshot.metadata.is_none(), "Analysis never finished");
    assert!(!input_dir.exists());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_cancel_while_extracting_stops_at_checkpoint() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut engine, storage) = build_engine(
        tmp.path(),
        test_config(),
        Arc::new(ScriptedParser::new(8)),
        Arc::new(SlowExporter {
            delay: Duration::from_millis(200),
        }),
    );
    engine.start();

    let job_id = engine.submit(stage_submission(&storage, "level.pak")).await.unwrap();
    assert!(wait_for_status(&engine, job_id, JobStatus::Completed, 5).await);

    engine
        .start_extraction(job_id, (0..8).collect())
        .await
        .unwrap();
    assert!(wait_for_status(&engine, job_id, JobStatus::Extracting, 5).await);

    let status = engine.cancel(job_id).await.unwrap();
    assert!(matches!(
        status,
        JobStatus::Cancelling | JobStatus::Cancelled
    ));

    assert!(
        wait_for_status(&engine, job_id, JobStatus::Cancelled, 5).await,
        "Extraction should stop between items"
    );
    let snapshot = engine.job_status(job_id).await.unwrap();
    assert!(!snapshot.download_ready, "No archive for a cancelled job");
    assert!(
        !storage.work_dir(job_id).exists(),
        "Work area must be cleaned"
    );

    engine.shutdown().await;
}

// ============================================================================
// INTEGRATION TESTS - Idempotence and Terminal Jobs
// ============================================================================

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, storage) = build_engine(
        tmp.path(),
        test_config(),
        Arc::new(ScriptedParser::new(1)),
        Arc::new(QuickExporter),
    );

    let job_id = engine.submit(stage_submission(&storage, "level.pak")).await.unwrap();
    assert_eq!(engine.cancel(job_id).await.unwrap(), JobStatus::Cancelled);
    assert_eq!(engine.cancel(job_id).await.unwrap(), JobStatus::Cancelled);
    assert_eq!(engine.cancel(job_id).await.unwrap(), JobStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_completed_job_is_noop() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut engine, storage) = build_engine(
        tmp.path(),
        test_config(),
        Arc::new(ScriptedParser::new(2)),
        Arc::new(QuickExporter),
    );
    engine.start();

    let job_id = engine.submit(stage_submission(&storage, "level.pak")).await.unwrap();
    assert!(wait_for_status(&engine, job_id, JobStatus::Completed, 5).await);

    let status = engine.cancel(job_id).await.unwrap();
    assert_eq!(status, JobStatus::Completed, "Terminal cancel is a no-op");

    // The no-op must not poison the job: extraction still works.
    engine.start_extraction(job_id, vec![0, 1]).await.unwrap();
    assert!(
        wait_for_download_ready(&engine, job_id, 5).await,
        "Extraction after a no-op cancel should still produce an archive"
    );

    engine.shutdown().await;
}

#[tokio::test]
async fn test_cancel_unknown_job_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, _storage) = build_engine(
        tmp.path(),
        test_config(),
        Arc::new(ScriptedParser::new(1)),
        Arc::new(QuickExporter),
    );
    assert!(matches!(
        engine.cancel(Uuid::new_v4()).await,
        Err(Error::NotFound(_))
    ));
}
