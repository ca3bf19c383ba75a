//! # pakrat-engine
//!
//! Job orchestration for the pakrat asset-bundle service.
//!
//! This crate provides:
//! - FIFO job queueing with live position reporting
//! - A fixed pool of async workers driving the analyze phase
//! - Per-job state machine with cooperative cancellation checkpoints
//! - Detached extraction tasks bounded by a concurrency cap
//! - Sliding-window rate limiting keyed by client
//! - Time-based reclamation of expired jobs and orphaned files
//!
//! ## Example
//!
//! ```ignore
//! use pakrat_engine::JobEngine;
//! use pakrat_core::{EngineConfig, StorageConfig, SubmitRequest};
//!
//! let mut engine = JobEngine::new(config, storage, parser, exporter, archiver)?;
//! engine.start();
//!
//! let job_id = engine.submit(request).await?;
//!
//! // Poll until analysis lands
//! let snapshot = engine.job_status(job_id).await?;
//!
//! // Listen for events
//! let mut events = engine.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! // Graceful shutdown
//! engine.shutdown().await;
//! ```

pub mod context;
pub mod events;
pub mod job;
pub mod queue;
pub mod ratelimit;
pub mod registry;
pub mod service;
pub mod sweep;
pub mod worker;

mod analyze;
mod extraction;

// Re-export core types
pub use pakrat_core::*;

// Re-export engine surface
pub use context::EngineContext;
pub use events::EngineEvent;
pub use job::{JobHandle, JobState};
pub use queue::TaskQueue;
pub use ratelimit::RateLimiter;
pub use registry::JobRegistry;
pub use service::JobEngine;
pub use sweep::{sweep_at, sweep_once, ReclamationSweeper, SweeperHandle};
pub use worker::{WorkerHandle, WorkerPool};
