//! Deferred task queue
//!
//! Work registered with [`TaskScheduler::defer`] never runs synchronously.
//! It waits in a FIFO queue and is only drained by [`TaskScheduler::tick`]
//! once the call stack is empty, so even a zero-delay timer is ordered after
//! all synchronous work already in progress.
//!
//! Tasks receive the execution context `C` mutably and may push and pop
//! frames through it. A failing task has its frames unwound, is reported to
//! the error observer, and does not prevent later tasks from running.
//!
//! Only one task runs at a time: while a task is executing, the scheduler
//! hands out nothing else, even if that task asks for another tick.

use crate::error::{RuntimeError, TaskError};
use crate::stack::StackSimulator;
use stacksim_config::{Config, TickMode};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Anything that exposes the call stack a scheduler has to wait on
pub trait ExecutionContext {
    fn stack(&self) -> &StackSimulator;

    /// Mutable access, used to unwind after a failed task
    fn stack_mut(&mut self) -> &mut StackSimulator;
}

impl ExecutionContext for StackSimulator {
    fn stack(&self) -> &StackSimulator {
        self
    }

    fn stack_mut(&mut self) -> &mut StackSimulator {
        self
    }
}

/// Identifier of a deferred task
///
/// Ids are handed out in arrival order and double as the FIFO sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Boxed unit of deferred work
pub type TaskFn<C> = Box<dyn FnOnce(&mut C) -> Result<(), RuntimeError>>;

/// Callback receiving every task failure
pub type ErrorObserver = Box<dyn FnMut(&TaskError)>;

/// A queued unit of work plus its bookkeeping
pub struct DeferredTask<C> {
    id: TaskId,
    delay: Duration,
    label: Option<String>,
    work: TaskFn<C>,
}

impl<C> DeferredTask<C> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Requested delay; informational only, it never reorders the queue
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Execute the task, tagging any failure with the task's identity
    pub fn run(self, cx: &mut C) -> Result<(), TaskError> {
        let DeferredTask {
            id, label, work, ..
        } = self;
        tracing::debug!(task = %id, "running deferred task");
        work(cx).map_err(|source| TaskError { id, label, source })
    }
}

impl<C> fmt::Debug for DeferredTask<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredTask")
            .field("id", &self.id)
            .field("delay", &self.delay)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Outcome of one [`TaskScheduler::tick`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks executed (successful or not)
    pub ran: usize,
    /// Tasks that returned an error
    pub failed: usize,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.ran == 0
    }

    pub(crate) fn record(&mut self, outcome: &Result<(), TaskError>) {
        self.ran += 1;
        if outcome.is_err() {
            self.failed += 1;
        }
    }
}

/// FIFO queue of deferred tasks, drained only when the stack is empty
pub struct TaskScheduler<C = StackSimulator> {
    queue: VecDeque<DeferredTask<C>>,
    next_id: u64,
    mode: TickMode,
    running: Option<TaskId>,
    observer: ErrorObserver,
}

impl<C> TaskScheduler<C> {
    /// Create a scheduler that runs one task per tick
    pub fn new() -> Self {
        Self::with_mode(TickMode::Single)
    }

    pub fn with_mode(mode: TickMode) -> Self {
        Self {
            queue: VecDeque::new(),
            next_id: 1,
            mode,
            running: None,
            observer: Box::new(log_task_failure),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_mode(config.tick_mode())
    }

    pub fn mode(&self) -> TickMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TickMode) {
        self.mode = mode;
    }

    /// Replace the observer that receives task failures
    pub fn set_error_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&TaskError) + 'static,
    {
        self.observer = Box::new(observer);
    }

    /// Queue `work` to run after all current synchronous work
    pub fn defer<F>(&mut self, work: F) -> TaskId
    where
        F: FnOnce(&mut C) -> Result<(), RuntimeError> + 'static,
    {
        self.enqueue(None, Duration::ZERO, Box::new(work))
    }

    /// Queue `work` with a requested delay (the `setTimeout` form)
    pub fn defer_after<F>(&mut self, delay: Duration, work: F) -> TaskId
    where
        F: FnOnce(&mut C) -> Result<(), RuntimeError> + 'static,
    {
        self.enqueue(None, delay, Box::new(work))
    }

    /// Queue `work` under a label used when its failure is reported
    pub fn defer_labeled<F>(&mut self, label: impl Into<String>, delay: Duration, work: F) -> TaskId
    where
        F: FnOnce(&mut C) -> Result<(), RuntimeError> + 'static,
    {
        self.enqueue(Some(label.into()), delay, Box::new(work))
    }

    fn enqueue(&mut self, label: Option<String>, delay: Duration, work: TaskFn<C>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        tracing::debug!(task = %id, ?delay, "deferred task queued");
        self.queue.push_back(DeferredTask {
            id,
            delay,
            label,
            work,
        });
        id
    }

    /// Remove a task that has not started yet
    ///
    /// Returns `false` if the task already ran or was never queued.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.queue.iter().position(|task| task.id == id) {
            Some(index) => {
                self.queue.remove(index);
                tracing::debug!(task = %id, "deferred task cancelled");
                true
            }
            None => false,
        }
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Task handed out by [`next_ready`](Self::next_ready) and not yet completed
    pub fn running(&self) -> Option<TaskId> {
        self.running
    }

    /// Ids of queued tasks in execution order
    pub fn queued_ids(&self) -> Vec<TaskId> {
        self.queue.iter().map(|task| task.id).collect()
    }

    /// Last task id the next tick may run under the current mode
    ///
    /// Ids only grow, so anything deferred after this call lies beyond the
    /// horizon and waits for a later tick.
    pub fn tick_horizon(&self) -> Option<TaskId> {
        match self.mode {
            TickMode::Single => self.queue.front().map(|task| task.id),
            TickMode::Batch => self.queue.back().map(|task| task.id),
        }
    }

    /// Dequeue the oldest task if `stack` is empty and it lies within `horizon`
    ///
    /// The task counts as running until [`complete`](Self::complete) is
    /// called; until then this returns `None`, so tasks never interleave.
    pub fn next_ready(&mut self, stack: &StackSimulator, horizon: TaskId) -> Option<DeferredTask<C>> {
        if self.running.is_some() || !stack.is_empty() {
            return None;
        }
        let task = match self.queue.front() {
            Some(task) if task.id <= horizon => self.queue.pop_front()?,
            _ => return None,
        };
        self.running = Some(task.id);
        Some(task)
    }

    /// Mark the running task finished and report its failure, if any
    pub fn complete(&mut self, outcome: Result<(), TaskError>) {
        self.running = None;
        if let Err(error) = outcome {
            self.report_failure(error);
        }
    }

    /// Hand a task failure to the error observer
    pub fn report_failure(&mut self, error: TaskError) {
        (self.observer)(&error);
    }
}

impl<C: ExecutionContext> TaskScheduler<C> {
    /// Run queued tasks if the stack is empty, honouring the tick mode
    pub fn tick(&mut self, cx: &mut C) -> TickReport {
        let horizon = self.tick_horizon();
        self.drain_through(cx, horizon)
    }

    /// Run every task queued at call time, whatever the tick mode
    pub fn tick_batch(&mut self, cx: &mut C) -> TickReport {
        let horizon = self.queue.back().map(|task| task.id);
        self.drain_through(cx, horizon)
    }

    fn drain_through(&mut self, cx: &mut C, horizon: Option<TaskId>) -> TickReport {
        let mut report = TickReport::default();
        let Some(horizon) = horizon else {
            return report;
        };
        // A task that succeeds but leaves frames behind blocks the rest of
        // the batch; a failed one is unwound first.
        while let Some(task) = self.next_ready(cx.stack(), horizon) {
            let outcome = task.run(cx);
            report.record(&outcome);
            if outcome.is_err() {
                cx.stack_mut().clear();
            }
            self.complete(outcome);
        }
        report
    }
}

impl<C> Default for TaskScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for TaskScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("queue", &self.queue)
            .field("next_id", &self.next_id)
            .field("mode", &self.mode)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

fn log_task_failure(error: &TaskError) {
    tracing::error!(task = %error.id, label = ?error.label, error = %error.source, "deferred task failed");
}
