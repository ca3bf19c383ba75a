//! FIFO task queue of job ids.
//!
//! The queue is the only hand-off between submission and the worker pool:
//! a job id leaves it exactly once, so at most one worker ever runs a job.
//! The mutex is a plain `std::sync` one; no method awaits while holding it.

use std::collections::VecDeque;
use std::sync::Mutex;

use uuid::Uuid;

#[derive(Debug, Default)]
pub struct TaskQueue {
    inner: Mutex<VecDeque<Uuid>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Uuid>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a job to the back of the queue.
    pub fn enqueue(&self, job_id: Uuid) {
        self.lock().push_back(job_id);
    }

    /// Claim the front job, if any.
    pub fn dequeue(&self) -> Option<Uuid> {
        self.lock().pop_front()
    }

    /// Drop a queued job (cancel-while-queued). The relative order of the
    /// remaining jobs is unchanged.
    pub fn remove(&self, job_id: Uuid) -> bool {
        let mut queue = self.lock();
        if let Some(at) = queue.iter().position(|id| *id == job_id) {
            queue.remove(at);
            true
        } else {
            false
        }
    }

    /// 1-based position of a queued job, `None` if absent.
    pub fn position(&self, job_id: Uuid) -> Option<usize> {
        self.lock().iter().position(|id| *id == job_id).map(|p| p + 1)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
