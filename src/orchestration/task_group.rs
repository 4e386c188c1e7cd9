//! # Task Group
//!
//! Structured fan-out/join used by every concurrent staging path. Each spawned task waits
//! for a pool permit, runs one executor call, and reports only its terminal outcome. The
//! join collects units in completion order and fails the whole group on the first crash,
//! on cancellation, or when the budget runs out. Whenever the join gives up, the group's
//! cancellation token fires and every remaining task is aborted.

use crate::error::{Result, StagingError, TaskLabel};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

enum TaskOutcome<U> {
    Finished(anyhow::Result<U>),
    Cancelled,
}

pub(crate) struct TaskGroup<U> {
    tasks: JoinSet<(Id, TaskOutcome<U>)>,
    pending: HashMap<Id, TaskLabel>,
    cancel: CancellationToken,
    permits: Arc<Semaphore>,
}

impl<U: Send + 'static> TaskGroup<U> {
    pub(crate) fn new(permits: Arc<Semaphore>, cancel: CancellationToken) -> Self {
        Self {
            tasks: JoinSet::new(),
            pending: HashMap::new(),
            cancel,
            permits,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Dispatch `work` as an independent task identified by `label`.
    pub(crate) fn spawn<F>(&mut self, label: TaskLabel, work: F)
    where
        F: Future<Output = anyhow::Result<U>> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let permits = Arc::clone(&self.permits);

        let handle = self.tasks.spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => TaskOutcome::Cancelled,
                result = async move {
                    let _permit = permits.acquire_owned().await?;
                    work.await
                } => TaskOutcome::Finished(result),
            };
            (tokio::task::id(), outcome)
        });

        self.pending.insert(handle.id(), label);
    }

    /// Wait for every task, or fail once `budget` has elapsed.
    pub(crate) async fn join(self, budget: Duration) -> Result<Vec<U>> {
        self.collect(Some(budget)).await
    }

    /// Wait for every task with no time limit; crashes and cancellation still fail the join.
    pub(crate) async fn join_unbounded(self) -> Result<Vec<U>> {
        self.collect(None).await
    }

    async fn collect(mut self, budget: Option<Duration>) -> Result<Vec<U>> {
        let deadline = budget.map(|budget| Instant::now() + budget);
        let mut units = Vec::with_capacity(self.pending.len());

        loop {
            let joined = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, self.tasks.join_next()).await,
                None => Ok(self.tasks.join_next().await),
            };

            let next = match joined {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(_elapsed) => {
                    let budget = budget.unwrap_or_default();
                    let pending: Vec<TaskLabel> = self.pending.drain().map(|(_, l)| l).collect();
                    error!(
                        budget_ms = budget.as_millis(),
                        pending = pending.len(),
                        "Join budget elapsed before all staging tasks finished"
                    );
                    self.shutdown();
                    return Err(StagingError::timeout(budget, pending));
                }
            };

            match next {
                Ok((id, TaskOutcome::Finished(Ok(unit)))) => {
                    if let Some(label) = self.pending.remove(&id) {
                        debug!(task = %label, "Staging task completed");
                    }
                    units.push(unit);
                }
                Ok((id, TaskOutcome::Finished(Err(e)))) => {
                    let label = self.take_label(id);
                    error!(task = %label, error = %format!("{e:#}"), "Staging task failed");
                    self.shutdown();
                    return Err(StagingError::runner_crash(label, format!("{e:#}")));
                }
                Ok((id, TaskOutcome::Cancelled)) => {
                    let label = self.take_label(id);
                    warn!(task = %label, "Staging task cancelled");
                    self.shutdown();
                    return Err(StagingError::Cancelled { task: label });
                }
                Err(join_error) => {
                    let label = self.take_label(join_error.id());
                    let reason = describe_join_error(join_error);
                    error!(task = %label, reason = %reason, "Staging task crashed");
                    self.shutdown();
                    return Err(StagingError::runner_crash(label, reason));
                }
            }
        }

        Ok(units)
    }

    fn take_label(&mut self, id: Id) -> TaskLabel {
        self.pending
            .remove(&id)
            .unwrap_or_else(|| TaskLabel::category("<unknown>"))
    }

    fn shutdown(&mut self) {
        self.cancel.cancel();
        self.tasks.abort_all();
    }
}

fn describe_join_error(join_error: JoinError) -> String {
    if join_error.is_panic() {
        format!("task panicked: {}", panic_message(join_error.into_panic()))
    } else {
        format!("task aborted: {join_error}")
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn reject() -> anyhow::Result<u8> {
        Err(anyhow::anyhow!("constraint violated"))
    }

    async fn explode() -> anyhow::Result<u8> {
        panic!("boom")
    }

    fn group<U: Send + 'static>(permits: usize) -> TaskGroup<U> {
        TaskGroup::new(Arc::new(Semaphore::new(permits)), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_empty_group_joins_immediately() {
        let units = group::<u8>(1).join(Duration::from_millis(10)).await.unwrap();
        assert!(units.is_empty());
    }

    #[tokio::test]
    async fn test_units_arrive_in_completion_order() {
        let mut tasks = group::<u8>(4);
        tasks.spawn(TaskLabel::chunk("blocks", 0), async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            Ok::<_, anyhow::Error>(0)
        });
        tasks.spawn(TaskLabel::chunk("blocks", 1), async { Ok::<_, anyhow::Error>(1) });

        let units = tasks.join(Duration::from_secs(5)).await.unwrap();
        assert_eq!(units, vec![1, 0]);
    }

    #[tokio::test]
    async fn test_failure_names_the_task() {
        let mut tasks = group::<u8>(2);
        tasks.spawn(TaskLabel::chunk("logs", 3), reject());

        let err = tasks.join(Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(
            err,
            StagingError::runner_crash(TaskLabel::chunk("logs", 3), "constraint violated")
        );
    }

    #[tokio::test]
    async fn test_panic_is_reported_as_runner_crash() {
        let mut tasks = group::<u8>(2);
        tasks.spawn(TaskLabel::category("tokens"), explode());

        match tasks.join(Duration::from_secs(5)).await {
            Err(StagingError::RunnerCrash { task, reason }) => {
                assert_eq!(task, TaskLabel::category("tokens"));
                assert!(reason.contains("boom"), "unexpected reason: {reason}");
            }
            other => panic!("expected runner crash, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_cancels_remaining_work() {
        let cancel = CancellationToken::new();
        let mut tasks = TaskGroup::new(Arc::new(Semaphore::new(2)), cancel.clone());
        tasks.spawn(TaskLabel::category("blocks"), async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, anyhow::Error>(())
        });

        let err = tasks.join(Duration::from_millis(20)).await.unwrap_err();
        assert_eq!(
            err,
            StagingError::timeout(Duration::from_millis(20), vec![TaskLabel::category("blocks")])
        );
        assert!(cancel.is_cancelled());
    }

    async fn sleep_then_count(delay: Duration, counter: Arc<AtomicUsize>) -> anyhow::Result<u8> {
        tokio::time::sleep(delay).await;
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }

    #[tokio::test]
    async fn test_timed_out_task_never_finishes_its_work() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut tasks = group::<u8>(2);
        tasks.spawn(
            TaskLabel::chunk("blocks", 0),
            sleep_then_count(Duration::from_millis(150), Arc::clone(&counter)),
        );

        let err = tasks.join(Duration::from_millis(30)).await.unwrap_err();
        assert!(matches!(err, StagingError::Timeout { .. }));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_crash_stops_sibling_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut tasks = group::<u8>(4);
        tasks.spawn(
            TaskLabel::chunk("logs", 0),
            sleep_then_count(Duration::from_millis(100), Arc::clone(&counter)),
        );
        tasks.spawn(TaskLabel::chunk("logs", 1), reject());

        let err = tasks.join(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, StagingError::RunnerCrash { .. }));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unbounded_join_waits_for_slow_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut tasks = group::<u8>(1);
        tasks.spawn(
            TaskLabel::category("blocks"),
            sleep_then_count(Duration::from_millis(80), Arc::clone(&counter)),
        );

        let units = tasks.join_unbounded().await.unwrap();
        assert_eq!(units, vec![0]);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_token_fails_the_join() {
        let cancel = CancellationToken::new();
        let mut tasks = TaskGroup::new(Arc::new(Semaphore::new(1)), cancel.clone());
        tasks.spawn(TaskLabel::category("blocks"), async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, anyhow::Error>(())
        });
        cancel.cancel();

        let err = tasks.join(Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(
            err,
            StagingError::Cancelled {
                task: TaskLabel::category("blocks")
            }
        );
    }
}
