//! Integration tests for the engine facade and worker pool.
//!
//! This test suite validates:
//! - Engine-001: Submission runs the analyze phase to completion
//! - Engine-002: Jobs are processed in submission order
//! - Engine-003: Queue positions are live and shrink as jobs are claimed
//! - Engine-004: Each job is claimed by exactly one worker
//! - Engine-005: Submission validation (extensions, primary artifact, size cap)
//! - Engine-006: Rate limiting rejects the over-limit submission per client
//! - Engine-007: Event broadcasting works correctly
//! - Engine-008: Engine lifecycle (start/shutdown)
//!
//! The engine is exercised against scripted parser/exporter/archiver doubles;
//! end-to-end coverage with the real format stack lives in its own suite.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::sleep;
use uuid::Uuid;

use pakrat_core::{
    ArchiveInfo, Archiver, ArtifactEnvironment, ArtifactParser, AssetData, AssetExporter,
    AssetKind, ContainerInfo, EngineConfig, Error, JobStatus, Result, StagedFile, StorageConfig,
    SubmitRequest, TextData, TypedObject,
};
use pakrat_engine::{EngineEvent, JobEngine};

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

/// Parser double: yields `object_count` text objects after `delay`, and
/// records the file name of every artifact it was asked to load.
struct ScriptedParser {
    object_count: usize,
    delay: Duration,
    loads: Mutex<Vec<String>>,
}

impl ScriptedParser {
    fn new(object_count: usize) -> Self {
        Self {
            object_count,
            delay: Duration::ZERO,
            loads: Mutex::new(Vec::new()),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn loaded(&self) -> Vec<String> {
        self.loads.lock().await.clone()
    }
}

#[async_trait]
impl ArtifactParser for ScriptedParser {
    async fn load(&self, path: &Path) -> Result<Box<dyn ArtifactEnvironment>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.loads.lock().await.push(name);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let objects = (0..self.object_count)
            .map(|i| {
                Arc::new(ScriptedObject {
                    object_id: 100 + i as u64,
                    data: AssetData::Text(TextData {
                        name: format!("entry_{i}"),
                        content: format!("content {i}"),
                    }),
                }) as Arc<dyn TypedObject>
            })
            .collect();
        Ok(Box::new(ScriptedEnvironment { objects }))
    }
}

/// Exporter double: claims success without touching disk.
struct RecordingExporter;

#[async_trait]
impl AssetExporter for RecordingExporter {
    async fn export(&self, _data: &AssetData, _dest: &Path) -> Result<bool> {
        Ok(true)
    }
}

/// Archiver double: writes a placeholder archive file.
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
) -> (JobEngine, StorageConfig) {
    let storage = StorageConfig::under(base);
    let engine = JobEngine::new(
        config,
        storage.clone(),
        parser,
        Arc::new(RecordingExporter),
        Arc::new(StubArchiver),
    )
    .expect("engine construction");
    (engine, storage)
}

/// Stage one uploaded file the way a boundary would, and build its request.
fn stage_submission(
    storage: &StorageConfig,
    client_key: &str,
    file_name: &str,
    bytes: &[u8],
) -> SubmitRequest {
    let input_dir = storage.upload_root.join(Uuid::new_v4().to_string());
    std::fs::create_dir_all(&input_dir).expect("staging dir");
    let path = input_dir.join(file_name);
    std::fs::write(&path, bytes).expect("staged file");
    SubmitRequest {
        client_key: client_key.to_string(),
        input_dir,
        files: vec![StagedFile {
            name: file_name.to_string(),
            path,
        }],
        retain_artifacts: false,
    }
}

/// Poll until the job reaches `expected` or the timeout lapses.
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

// ============================================================================
// INTEGRATION TESTS - Submission and Analysis
// ============================================================================

#[tokio::test]
async fn test_submit_analyzes_to_completed() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut engine, storage) =
        build_engine(tmp.path(), test_config(), Arc::new(ScriptedParser::new(3)));
    engine.start();

    let request = stage_submission(&storage, "client-a", "level.pak", b"PAKBNDL1 payload");
    let job_id = engine.submit(request).await.unwrap();

    assert!(
        wait_for_status(&engine, job_id, JobStatus::Completed, 5).await,
        "Job should complete within timeout"
    );

    let snapshot = engine.job_status(job_id).await.unwrap();
    assert_eq!(snapshot.progress, 100);
    assert!(!snapshot.download_ready, "No archive before extraction");
    assert!(snapshot.queue_position.is_none());

    let metadata = snapshot.metadata.expect("analysis metadata");
    assert_eq!(metadata.object_count, 3);
    assert_eq!(metadata.assets.len(), 3);
    assert_eq!(metadata.counts.get(&AssetKind::Text), Some(&3));
    assert_eq!(metadata.kinds, vec![AssetKind::Text]);
    assert_eq!(metadata.descriptor.file_name, "level.pak");
    // Inventory indices are the container enumeration positions.
    let indices: Vec<usize> = metadata.assets.iter().map(|a| a.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);

    assert_eq!(engine.queue_depth(), 0);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_jobs_run_in_submission_order() {
    let tmp = tempfile::tempdir().unwrap();
    let parser = Arc::new(ScriptedParser::new(1));
    let (mut engine, storage) = build_engine(tmp.path(), test_config(), parser.clone());

    // Queue up everything before the pool starts so the order is fixed.
    let mut job_ids = Vec::new();
    for name in ["first.pak", "second.pak", "third.pak"] {
        let request = stage_submission(&storage, "client-a", name, b"PAKBNDL1");
        job_ids.push(engine.submit(request).await.unwrap());
    }
    assert_eq!(engine.queue_depth(), 3);

    engine.start();
    for job_id in &job_ids {
        assert!(
            wait_for_status(&engine, *job_id, JobStatus::Completed, 5).await,
            "All jobs should complete"
        );
    }

    assert_eq!(
        parser.loaded().await,
        vec!["first.pak", "second.pak", "third.pak"],
        "A single worker must drain the queue front to back"
    );
    engine.shutdown().await;
}

#[tokio::test]
async fn test_queue_positions_are_live() {
    let tmp = tempfile::tempdir().unwrap();
    let parser = Arc::new(ScriptedParser::new(1).with_delay(Duration::from_millis(500)));
    let (mut engine, storage) = build_engine(tmp.path(), test_config(), parser);

    let mut job_ids = Vec::new();
    for name in ["a.pak", "b.pak", "c.pak"] {
        let request = stage_submission(&storage, "client-a", name, b"PAKBNDL1");
        job_ids.push(engine.submit(request).await.unwrap());
    }

    // Before the pool starts: positions 1..=3 of 3.
    for (i, job_id) in job_ids.iter().enumerate() {
        let snapshot = engine.job_status(*job_id).await.unwrap();
        assert_eq!(snapshot.status, JobStatus::Queued);
        assert_eq!(snapshot.queue_position, Some(i + 1));
        assert_eq!(snapshot.queue_total, Some(3));
    }

    engine.start();
    assert!(
        wait_for_status(&engine, job_ids[0], JobStatus::Analyzing, 5).await,
        "First job should be claimed"
    );

    // While the first job runs inside the parser delay, the others moved up.
    let second = engine.job_status(job_ids[1]).await.unwrap();
    assert_eq!(second.queue_position, Some(1));
    assert_eq!(second.queue_total, Some(2));
    let third = engine.job_status(job_ids[2]).await.unwrap();
    assert_eq!(third.queue_position, Some(2));

    for job_id in &job_ids {
        assert!(wait_for_status(&engine, *job_id, JobStatus::Completed, 5).await);
    }
    engine.shutdown().await;
}

#[tokio::test]
async fn test_each_job_claimed_exactly_once() {
    let tmp = tempfile::tempdir().unwrap();
    let parser = Arc::new(ScriptedParser::new(1).with_delay(Duration::from_millis(50)));
    let (mut engine, storage) = build_engine(
        tmp.path(),
        test_config().with_workers(4),
        parser.clone(),
    );

    let mut job_ids = Vec::new();
    for i in 0..6 {
        let request =
            stage_submission(&storage, "client-a", &format!("bundle_{i}.pak"), b"PAKBNDL1");
        job_ids.push(engine.submit(request).await.unwrap());
    }

    engine.start();
    for job_id in &job_ids {
        assert!(
            wait_for_status(&engine, *job_id, JobStatus::Completed, 10).await,
            "All jobs should complete with four workers"
        );
    }

    // Every artifact loaded exactly once: claiming pops the queue, so two
    // workers can never run the same job.
    let mut loads = parser.loaded().await;
    loads.sort();
    let expected: Vec<String> = (0..6).map(|i| format!("bundle_{i}.pak")).collect();
    assert_eq!(loads, expected);
    engine.shutdown().await;
}

// ============================================================================
// INTEGRATION TESTS - Submission Validation
// ============================================================================

#[tokio::test]
async fn test_submit_rejects_disallowed_extension() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, storage) =
        build_engine(tmp.path(), test_config(), Arc::new(ScriptedParser::new(1)));

    let request = stage_submission(&storage, "client-a", "readme.txt", b"hello");
    let input_dir = request.input_dir.clone();

    let err = engine.submit(request).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");
    assert!(
        !input_dir.exists(),
        "Rejected staging directory must be removed"
    );
}

#[tokio::test]
async fn test_submit_rejects_missing_primary_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, storage) =
        build_engine(tmp.path(), test_config(), Arc::new(ScriptedParser::new(1)));

    // `.bin` rides along as a companion; it can never be the artifact.
    let request = stage_submission(&storage, "client-a", "streaming.bin", b"data");
    let err = engine.submit(request).await.unwrap_err();
    match err {
        Error::Validation(message) => assert!(message.contains("primary"), "got: {message}"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_submit_rejects_empty_file_list() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, storage) =
        build_engine(tmp.path(), test_config(), Arc::new(ScriptedParser::new(1)));

    let input_dir = storage.upload_root.join(Uuid::new_v4().to_string());
    std::fs::create_dir_all(&input_dir).unwrap();
    let request = SubmitRequest {
        client_key: "client-a".to_string(),
        input_dir: input_dir.clone(),
        files: Vec::new(),
        retain_artifacts: false,
    };

    assert!(matches!(
        engine.submit(request).await,
        Err(Error::Validation(_))
    ));
    assert!(!input_dir.exists());
}

#[tokio::test]
async fn test_submit_rejects_oversized_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, storage) = build_engine(
        tmp.path(),
        test_config().with_max_artifact_bytes(16),
        Arc::new(ScriptedParser::new(1)),
    );

    let request = stage_submission(&storage, "client-a", "big.pak", &[0u8; 64]);
    match engine.submit(request).await {
        Err(Error::Validation(message)) => {
            assert!(message.contains("64 bytes"), "got: {message}")
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_status_of_unknown_job_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let (engine, _storage) =
        build_engine(tmp.path(), test_config(), Arc::new(ScriptedParser::new(1)));
    assert!(matches!(
        engine.job_status(Uuid::new_v4()).await,
        Err(Error::NotFound(_))
    ));
}

// ============================================================================
// INTEGRATION TESTS - Rate Limiting
// ============================================================================

#[tokio::test]
async fn test_rate_limit_rejects_over_limit_submission() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config()
        .with_rate_limit_enabled(true)
        .with_rate_limit(2, 60);
    let (engine, storage) = build_engine(tmp.path(), config, Arc::new(ScriptedParser::new(1)));

    for i in 0..2 {
        let request =
            stage_submission(&storage, "client-a", &format!("ok_{i}.pak"), b"PAKBNDL1");
        engine.submit(request).await.unwrap();
    }

    let request = stage_submission(&storage, "client-a", "rejected.pak", b"PAKBNDL1");
    let input_dir = request.input_dir.clone();
    match engine.submit(request).await {
        Err(Error::RateLimited { retry_after_secs }) => {
            assert!(retry_after_secs >= 1);
            assert!(retry_after_secs <= 60);
        }
        other => panic!("expected rate limit, got {other:?}"),
    }
    assert!(
        !input_dir.exists(),
        "Rate-limited staging directory must be removed"
    );

    // Another client is unaffected.
    let request = stage_submission(&storage, "client-b", "other.pak", b"PAKBNDL1");
    engine.submit(request).await.unwrap();
}

// ============================================================================
// INTEGRATION TESTS - Events and Lifecycle
// ============================================================================

#[tokio::test]
async fn test_events_broadcast_through_analysis() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut engine, storage) =
        build_engine(tmp.path(), test_config(), Arc::new(ScriptedParser::new(2)));
    let mut events = engine.subscribe();
    engine.start();

    let request = stage_submission(&storage, "client-a", "level.pak", b"PAKBNDL1");
    let job_id = engine.submit(request).await.unwrap();

    let mut received = Vec::new();
    let timeout = Duration::from_secs(5);
    let start = std::time::Instant::now();
    let mut analysis_done = false;
    while start.elapsed() < timeout && !analysis_done {
        tokio::select! {
            event = events.recv() => {
                if let Ok(event) = event {
                    if matches!(&event, EngineEvent::AnalyzeCompleted { job_id: id, .. } if *id == job_id) {
                        analysis_done = true;
                    }
                    received.push(event);
                }
            }
            _ = sleep(Duration::from_millis(50)) => {}
        }
    }

    assert!(
        received
            .iter()
            .any(|e| matches!(e, EngineEvent::JobQueued { job_id: id, position: 1 } if *id == job_id)),
        "Should receive JobQueued at position 1"
    );
    assert!(
        received
            .iter()
            .any(|e| matches!(e, EngineEvent::JobStarted { job_id: id, .. } if *id == job_id)),
        "Should receive JobStarted"
    );
    assert!(
        received.iter().any(|e| matches!(
            e,
            EngineEvent::JobProgress { job_id: id, percent: 100, .. } if *id == job_id
        )),
        "Should receive final progress"
    );
    assert!(
        received
            .iter()
            .any(|e| matches!(e, EngineEvent::AnalyzeCompleted { object_count: 2, .. })),
        "Should receive AnalyzeCompleted with the object count"
    );

    engine.shutdown().await;
}

#[tokio::test]
async fn test_work_log_records_lifecycle_lines() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut engine, storage) =
        build_engine(tmp.path(), test_config(), Arc::new(ScriptedParser::new(1)));
    engine.start();

    let request = stage_submission(&storage, "client-a", "level.pak", b"PAKBNDL1");
    let job_id = engine.submit(request).await.unwrap();
    assert!(wait_for_status(&engine, job_id, JobStatus::Completed, 5).await);

    let log = tokio::fs::read_to_string(storage.log_file(job_id))
        .await
        .expect("work log exists");
    assert!(log.contains("submitted by client-a"), "log: {log}");
    assert!(log.contains("analyze started: level.pak"), "log: {log}");
    assert!(log.contains("analyze completed: 1 of 1"), "log: {log}");

    engine.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_while_job_running() {
    let tmp = tempfile::tempdir().unwrap();
    let parser = Arc::new(ScriptedParser::new(1).with_delay(Duration::from_secs(3)));
    let (mut engine, storage) = build_engine(
        tmp.path(),
        test_config().with_shutdown_grace(100),
        parser,
    );
    engine.start();

    let request = stage_submission(&storage, "client-a", "slow.pak", b"PAKBNDL1");
    let job_id = engine.submit(request).await.unwrap();
    assert!(wait_for_status(&engine, job_id, JobStatus::Analyzing, 5).await);

    // The worker is mid-phase; shutdown must return after the grace period
    // without hanging or panicking.
    engine.shutdown().await;
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let (mut engine, storage) =
        build_engine(tmp.path(), test_config(), Arc::new(ScriptedParser::new(1)));
    engine.start();
    engine.start();

    let request = stage_submission(&storage, "client-a", "level.pak", b"PAKBNDL1");
    let job_id = engine.submit(request).await.unwrap();
    assert!(wait_for_status(&engine, job_id, JobStatus::Completed, 5).await);
    engine.shutdown().await;
}
