//! Shared engine context.
//!
//! One explicit object owns every collaborator the engine's components
//! need; constructors receive it instead of reaching for globals. The
//! format stack comes in as trait objects, so the engine never links a
//! concrete parser or exporter.

use std::sync::Arc;

use tokio::sync::{broadcast, Semaphore};

use pakrat_core::{ArtifactParser, AssetExporter, Archiver, EngineConfig, StorageConfig};

use crate::events::EngineEvent;
use crate::queue::TaskQueue;
use crate::ratelimit::RateLimiter;
use crate::registry::JobRegistry;

pub struct EngineContext {
    pub config: EngineConfig,
    pub storage: StorageConfig,
    pub queue: TaskQueue,
    pub registry: JobRegistry,
    pub limiter: RateLimiter,
    pub parser: Arc<dyn ArtifactParser>,
    pub exporter: Arc<dyn AssetExporter>,
    pub archiver: Arc<dyn Archiver>,
    pub events: broadcast::Sender<EngineEvent>,
    /// Bounds concurrently running extraction tasks.
    pub extraction_permits: Arc<Semaphore>,
}

impl EngineContext {
    pub fn new(
        config: EngineConfig,
        storage: StorageConfig,
        parser: Arc<dyn ArtifactParser>,
        exporter: Arc<dyn AssetExporter>,
        archiver: Arc<dyn Archiver>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(pakrat_core::defaults::EVENT_BUS_CAPACITY);
        let limiter = RateLimiter::new(&config);
        let extraction_permits = Arc::new(Semaphore::new(config.max_concurrent_extractions.max(1)));

        Arc::new(Self {
            config,
            storage,
            queue: TaskQueue::new(),
            registry: JobRegistry::new(),
            limiter,
            parser,
            exporter,
            archiver,
            events,
            extraction_permits,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Fire an event; nobody listening is fine.
    pub(crate) fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}
