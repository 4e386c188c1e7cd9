//! # Staging Error Types
//!
//! Every fallible staging operation returns [`StagingError`]. Runner crashes and timeouts are
//! fatal for the call that produced them: the registry handed to that call and any units it
//! already built are dropped, so callers treat the whole call as not having happened.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Identifies one dispatched unit of work: a whole category, or one chunk of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskLabel {
    pub category: String,
    pub chunk: Option<usize>,
}

impl TaskLabel {
    pub fn category(category: impl fmt::Display) -> Self {
        Self {
            category: category.to_string(),
            chunk: None,
        }
    }

    pub fn chunk(category: impl fmt::Display, index: usize) -> Self {
        Self {
            category: category.to_string(),
            chunk: Some(index),
        }
    }
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chunk {
            Some(index) => write!(f, "{} chunk {index}", self.category),
            None => write!(f, "{}", self.category),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StagingError {
    #[error("Runner crashed while building unit for {task}: {reason}")]
    RunnerCrash { task: TaskLabel, reason: String },

    #[error("Timed out after {}ms with {} task(s) unfinished: {}", .budget.as_millis(), .pending.len(), describe_pending(.pending))]
    Timeout {
        budget: Duration,
        pending: Vec<TaskLabel>,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Staging cancelled while building unit for {task}")]
    Cancelled { task: TaskLabel },

    #[error("Commit failed for stage {stage} (unit {unit_index}): {reason}")]
    Commit {
        stage: String,
        unit_index: usize,
        reason: String,
    },
}

impl StagingError {
    /// Create a runner crash error
    pub fn runner_crash(task: TaskLabel, reason: impl Into<String>) -> Self {
        Self::RunnerCrash {
            task,
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(budget: Duration, mut pending: Vec<TaskLabel>) -> Self {
        pending.sort_by(|a, b| (&a.category, a.chunk).cmp(&(&b.category, b.chunk)));
        Self::Timeout { budget, pending }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a commit error
    pub fn commit(stage: impl Into<String>, unit_index: usize, reason: impl Into<String>) -> Self {
        Self::Commit {
            stage: stage.into(),
            unit_index,
            reason: reason.into(),
        }
    }

    /// True for the failures that abort a scheduling call outright.
    pub fn is_fatal_runner_failure(&self) -> bool {
        matches!(self, Self::RunnerCrash { .. } | Self::Timeout { .. })
    }
}

impl From<::config::ConfigError> for StagingError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

fn describe_pending(pending: &[TaskLabel]) -> String {
    pending
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, StagingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_label_display() {
        assert_eq!(TaskLabel::category("blocks").to_string(), "blocks");
        assert_eq!(TaskLabel::chunk("addresses", 2).to_string(), "addresses chunk 2");
    }

    #[test]
    fn test_timeout_lists_pending_tasks_in_stable_order() {
        let err = StagingError::timeout(
            Duration::from_millis(250),
            vec![
                TaskLabel::chunk("addresses", 3),
                TaskLabel::category("blocks"),
                TaskLabel::chunk("addresses", 1),
            ],
        );

        assert_eq!(
            err.to_string(),
            "Timed out after 250ms with 3 task(s) unfinished: addresses chunk 1, addresses chunk 3, blocks"
        );
        assert!(err.is_fatal_runner_failure());
    }

    #[test]
    fn test_configuration_error_is_not_a_runner_failure() {
        let err = StagingError::configuration("stage has no active categories");
        assert!(!err.is_fatal_runner_failure());
        assert_eq!(
            err.to_string(),
            "Configuration error: stage has no active categories"
        );
    }
}
