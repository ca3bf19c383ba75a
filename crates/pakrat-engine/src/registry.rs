//! In-memory job registry.
//!
//! Holds every live job behind an `Arc<JobHandle>`. A record leaves the
//! registry in exactly two places: download-complete without retention, and
//! reclamation sweep expiry. Cancelled and failed jobs keep their record so
//! clients can still poll the terminal status.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::job::JobHandle;

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, Arc<JobHandle>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Arc<JobHandle>) {
        self.jobs.write().await.insert(job.id(), job);
    }

    pub async fn get(&self, job_id: Uuid) -> Option<Arc<JobHandle>> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    pub async fn remove(&self, job_id: Uuid) -> Option<Arc<JobHandle>> {
        self.jobs.write().await.remove(&job_id)
    }

    pub async fn contains(&self, job_id: Uuid) -> bool {
        self.jobs.read().await.contains_key(&job_id)
    }

    pub async fn ids(&self) -> Vec<Uuid> {
        self.jobs.read().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
