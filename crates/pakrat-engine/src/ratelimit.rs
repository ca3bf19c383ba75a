//! Sliding-window submission rate limiter.
//!
//! Per-client timestamp vectors on `tokio::time::Instant`, so tests under a
//! paused clock can drive the window deterministically.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

use pakrat_core::{EngineConfig, Error, Result};

pub struct RateLimiter {
    enabled: bool,
    max_requests: usize,
    window: Duration,
    clients: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            enabled: config.rate_limit_enabled,
            max_requests: config.rate_limit_max_requests.max(1) as usize,
            window: Duration::from_secs(config.rate_limit_window_secs.max(1)),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject one submission for `client_key`.
    ///
    /// On rejection, `retry_after_secs` is how long until the oldest
    /// in-window stamp ages out, clamped to at least one second.
    pub async fn check(&self, client_key: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let stamps = clients.entry(client_key.to_string()).or_default();
        stamps.retain(|t| now.duration_since(*t) < self.window);

        if stamps.len() >= self.max_requests {
            // Stamps are appended in arrival order, so the front is oldest.
            let age = now.duration_since(stamps[0]).as_secs();
            let retry_after_secs = self.window.as_secs().saturating_sub(age).max(1);
            debug!(
                client_key,
                in_window = stamps.len(),
                retry_after_secs,
                "Submission rate limited"
            );
            return Err(Error::RateLimited { retry_after_secs });
        }

        stamps.push(now);
        Ok(())
    }

    /// Drop clients whose stamps have all aged out. Called from the sweep so
    /// the map does not grow with one entry per client forever.
    pub async fn prune(&self) {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        clients.retain(|_, stamps| {
            stamps.retain(|t| now.duration_since(*t) < self.window);
            !stamps.is_empty()
        });
    }

    pub async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}
