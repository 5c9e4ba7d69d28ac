//! Bounded worker pool for HTML parsing
//!
//! Parsing a page is CPU-bound. Jobs run on tokio's blocking threads so they
//! never stall the tasks driving network I/O, and a semaphore caps how many
//! run at once.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

/// Errors from running a job on the pool
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("parse pool is closed")]
    Closed,

    #[error("parse worker failed: {0}")]
    Worker(String),
}

/// Pool of blocking parse workers
#[derive(Debug, Clone)]
pub struct ParsePool {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl ParsePool {
    /// Creates a pool running at most `workers` jobs at once (minimum 1)
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    /// Number of jobs allowed to run concurrently
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `job` on a blocking worker and waits for its result
    ///
    /// A panicking job is reported as [`PoolError::Worker`].
    pub async fn run<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        tokio::task::spawn_blocking(job)
            .await
            .map_err(|e| PoolError::Worker(e.to_string()))
    }
}
