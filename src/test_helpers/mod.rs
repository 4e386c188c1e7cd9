//! # Test Helpers
//!
//! In-memory stand-ins for the external collaborators, for tests of code built on top of the
//! staging layer.

use crate::orchestration::UnitCommitter;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Committer that records every unit it receives, in commit order.
///
/// Optionally rejects the n-th commit (zero-based) to exercise failure paths.
pub struct RecordingCommitter<U> {
    committed: Mutex<Vec<(String, U)>>,
    fail_at: Option<usize>,
    attempts: Mutex<usize>,
}

impl<U> RecordingCommitter<U> {
    pub fn new() -> Self {
        Self {
            committed: Mutex::new(Vec::new()),
            fail_at: None,
            attempts: Mutex::new(0),
        }
    }

    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::new()
        }
    }

    /// Stage names in commit order
    pub fn stages(&self) -> Vec<String> {
        self.committed
            .lock()
            .iter()
            .map(|(stage, _)| stage.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.committed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.lock().is_empty()
    }

    /// Drain everything committed so far
    pub fn take(&self) -> Vec<(String, U)> {
        std::mem::take(&mut *self.committed.lock())
    }
}

impl<U> Default for RecordingCommitter<U> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<U: Send + 'static> UnitCommitter<U> for RecordingCommitter<U> {
    async fn commit(&self, stage: &str, unit: U) -> anyhow::Result<()> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            let attempt = *attempts;
            *attempts += 1;
            attempt
        };

        if self.fail_at == Some(attempt) {
            anyhow::bail!("store rejected unit {attempt}");
        }

        self.committed.lock().push((stage.to_string(), unit));
        Ok(())
    }
}
