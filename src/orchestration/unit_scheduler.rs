//! # Unit Scheduler
//!
//! Owns the resources shared by every staging call in a batch: the join budget, the bounded
//! worker pool (a semaphore capping concurrent executor calls), and the root cancellation
//! token. The staging operations themselves live next to this type:
//!
//! - [`UnitScheduler::chunk_every`] in `chunk_scheduler`
//! - [`UnitScheduler::single_multi`] in `serial_composer`
//! - [`UnitScheduler::concurrent_multis`] in `concurrent_composer`

use super::task_group::TaskGroup;
use crate::config::StagingConfig;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct UnitScheduler {
    join_timeout: Duration,
    max_concurrent_units: usize,
    permits: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl UnitScheduler {
    /// Create a scheduler from validated configuration
    pub fn new(config: &StagingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            join_timeout: config.join_timeout(),
            max_concurrent_units: config.max_concurrent_units,
            permits: Arc::new(Semaphore::new(config.max_concurrent_units)),
            shutdown: CancellationToken::new(),
        })
    }

    /// Scheduler with the default 60s budget and pool size
    pub fn with_defaults() -> Self {
        let config = StagingConfig::default();
        Self {
            join_timeout: config.join_timeout(),
            max_concurrent_units: config.max_concurrent_units,
            permits: Arc::new(Semaphore::new(config.max_concurrent_units)),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn join_timeout(&self) -> Duration {
        self.join_timeout
    }

    pub fn max_concurrent_units(&self) -> usize {
        self.max_concurrent_units
    }

    /// Cancel all in-flight staging work; joins waiting on it fail with `Cancelled`.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Fresh task group whose token is a child of the scheduler's root token
    pub(crate) fn task_group<U: Send + 'static>(&self) -> TaskGroup<U> {
        TaskGroup::new(Arc::clone(&self.permits), self.shutdown.child_token())
    }
}

impl Default for UnitScheduler {
    fn default() -> Self {
        Self::with_defaults()
    }
}
