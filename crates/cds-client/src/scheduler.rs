//! Dependency scheduler for discovery batch tasks
//!
//! A protocol run is a small DAG: N sibling batch tasks feeding one
//! coordinator. The scheduler executes the siblings under a bounded
//! concurrency lane, then the coordinator (the `run_protocol` caller's
//! await) observes every sibling's terminal state before aggregating.
//!
//! Fail-fast semantics: the first sibling to fail sets the group's cancel
//! flag and records its error; siblings that have not started report
//! cancelled without running their bodies, already-running siblings finish
//! their current unit of work and observe the flag at their next checkpoint,
//! and the coordinator reports the originating failure exactly once.
//!
//! The scheduler is an explicitly constructed value, not a process-wide
//! queue: concurrency bounds and the retry limit are parameters.

use async_trait::async_trait;
use cds_core::{DiscoveryResult, Error};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Semaphore};

/// Observable lifecycle of one batch task.
///
/// `Attesting` and `Requesting` are sub-phases of `Running` reported by the
/// enclave task; the legacy task only uses `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Attesting,
    Requesting,
    Succeeded,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Cancelled
        )
    }
}

/// Cooperative cancellation flag shared by one protocol run.
///
/// Tasks check it at entry and after every suspension point; nothing is
/// preempted mid-computation.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Execution lane with a fixed concurrency bound.
///
/// Legacy batches share a parallel lane; the enclave shadow run and feedback
/// reporting use a dedicated lane with concurrency 1, which is the only
/// mutual exclusion the comparison path needs.
#[derive(Clone)]
pub struct Lane {
    permits: Arc<Semaphore>,
}

impl Lane {
    pub fn new(concurrency: usize) -> Self {
        assert!(concurrency > 0, "lane concurrency must be positive");
        Self {
            permits: Arc::new(Semaphore::new(concurrency)),
        }
    }

    /// Serialized lane (concurrency 1)
    pub fn serialized() -> Self {
        Self::new(1)
    }
}

/// Handed to a task body: cancellation checks plus phase reporting
pub struct TaskContext {
    cancel: CancelFlag,
    state: watch::Sender<TaskState>,
}

impl TaskContext {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Report a sub-phase (`Attesting`, `Requesting`). Terminal states are
    /// owned by the scheduler, not the task body.
    pub fn enter(&self, state: TaskState) {
        debug_assert!(!state.is_terminal());
        self.state.send_replace(state);
    }
}

/// One batch task body. Errors marked retryable may be re-run up to the
/// scheduler's attempt limit; everything else is terminal.
#[async_trait]
pub trait BatchTask: Send + Sync + 'static {
    async fn run(&self, ctx: &TaskContext) -> Result<DiscoveryResult, Error>;
}

/// Observer for one scheduled task's lifecycle
pub struct TaskHandle {
    state: watch::Receiver<TaskState>,
}

impl TaskHandle {
    /// Current state snapshot
    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// Wait until the task reaches a terminal state
    pub async fn terminal(&mut self) -> TaskState {
        loop {
            let current = *self.state.borrow_and_update();
            if current.is_terminal() {
                return current;
            }
            if self.state.changed().await.is_err() {
                return *self.state.borrow();
            }
        }
    }
}

/// Bounded-retry DAG runner for one protocol's batch set
#[derive(Clone)]
pub struct Scheduler {
    max_attempts: u32,
}

impl Scheduler {
    pub fn new(max_attempts: u32) -> Self {
        assert!(max_attempts > 0, "max_attempts must be positive");
        Self { max_attempts }
    }

    /// Run sibling batch tasks to completion and aggregate as a coordinator.
    ///
    /// Returns the union of all partial results, or the first observed
    /// failure after cancelling the remaining siblings. Handles reflect
    /// every task's terminal state once this returns.
    pub async fn run_protocol(
        &self,
        lane: &Lane,
        tasks: Vec<Arc<dyn BatchTask>>,
        cancel: CancelFlag,
    ) -> (Result<DiscoveryResult, Error>, Vec<TaskHandle>) {
        let first_failure: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));
        let mut joins = Vec::with_capacity(tasks.len());
        let mut handles = Vec::with_capacity(tasks.len());

        for (index, task) in tasks.into_iter().enumerate() {
            let (tx, rx) = watch::channel(TaskState::Pending);
            handles.push(TaskHandle { state: rx });

            let permits = lane.permits.clone();
            let cancel = cancel.clone();
            let first_failure = first_failure.clone();
            let max_attempts = self.max_attempts;

            joins.push(tokio::spawn(async move {
                // Semaphore is never closed while tasks hold a clone
                let _permit = permits
                    .acquire_owned()
                    .await
                    .expect("lane semaphore closed");

                if cancel.is_cancelled() {
                    tracing::debug!(task = index, "batch task cancelled before start");
                    tx.send_replace(TaskState::Cancelled);
                    return None;
                }

                tx.send_replace(TaskState::Running);
                let ctx = TaskContext {
                    cancel: cancel.clone(),
                    state: tx.clone(),
                };

                let mut attempt = 1;
                let outcome = loop {
                    match task.run(&ctx).await {
                        Ok(result) => break Ok(result),
                        Err(err) if err.is_retryable() && attempt < max_attempts => {
                            tracing::debug!(
                                task = index,
                                attempt,
                                error = %err,
                                "retrying batch task"
                            );
                            attempt += 1;
                        }
                        Err(err) => break Err(err),
                    }
                };

                match outcome {
                    Ok(result) => {
                        tx.send_replace(TaskState::Succeeded);
                        Some(result)
                    }
                    Err(Error::Cancelled) => {
                        tx.send_replace(TaskState::Cancelled);
                        None
                    }
                    Err(err) => {
                        tracing::debug!(task = index, error = %err, "batch task failed, cancelling siblings");
                        {
                            let mut slot = first_failure.lock().expect("failure slot poisoned");
                            if slot.is_none() {
                                *slot = Some(err);
                            }
                        }
                        cancel.cancel();
                        tx.send_replace(TaskState::Failed);
                        None
                    }
                }
            }));
        }

        // Coordinator: observe every terminal state before aggregating
        let mut union = DiscoveryResult::default();
        let mut complete = true;
        for join in joins {
            match join.await {
                Ok(Some(partial)) => union.extend(partial),
                Ok(None) => complete = false,
                Err(join_err) => {
                    complete = false;
                    let mut slot = first_failure.lock().expect("failure slot poisoned");
                    if slot.is_none() {
                        *slot = Some(Error::Internal(format!("batch task panicked: {join_err}")));
                    }
                }
            }
        }

        let result = if complete {
            Ok(union)
        } else {
            let recorded = first_failure.lock().expect("failure slot poisoned").take();
            Err(recorded.unwrap_or(Error::Cancelled))
        };

        (result, handles)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(3)
    }
}
