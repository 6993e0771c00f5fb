//! Runtime facade
//!
//! Ties a [`StackSimulator`], a [`TaskScheduler`] and an injected [`Console`]
//! together. Tasks queued here receive the whole `Runtime`, so they can log,
//! call, throw and defer further work exactly like top-level code.

use crate::console::{Console, TracingConsole};
use crate::error::{RuntimeError, ThrownKind};
use crate::scheduler::{ExecutionContext, TaskId, TaskScheduler, TickReport};
use crate::stack::{Frame, StackSimulator};
use stacksim_config::{Config, TickMode};
use std::fmt;
use std::time::Duration;

/// Name of the frame wrapping top-level script code
pub const MAIN_FRAME: &str = "<main>";

/// Global handler for errors nothing else caught
pub type UncaughtHandler = Box<dyn FnMut(&RuntimeError, &mut dyn Console)>;

/// Outcome of [`Runtime::run_script`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptReport {
    /// Error that escaped the synchronous part of the script
    pub error: Option<RuntimeError>,
    /// Deferred tasks run while draining the queue afterwards
    pub tasks: TickReport,
}

/// Single-threaded execution model: one stack, one task queue, one console
pub struct Runtime {
    stack: StackSimulator,
    scheduler: TaskScheduler<Runtime>,
    console: Box<dyn Console>,
    uncaught: UncaughtHandler,
}

impl Runtime {
    /// Create a runtime logging through `tracing`
    pub fn new() -> Self {
        Self::with_console(TracingConsole)
    }

    pub fn with_console(console: impl Console + 'static) -> Self {
        Self {
            stack: StackSimulator::new(),
            scheduler: TaskScheduler::new(),
            console: Box::new(console),
            uncaught: Box::new(print_uncaught),
        }
    }

    /// Create a runtime honouring the configured depth and tick mode
    pub fn from_config(config: &Config, console: impl Console + 'static) -> Self {
        let mut runtime = Self::with_console(console);
        runtime.stack = StackSimulator::from_config(config);
        runtime.scheduler.set_mode(config.tick_mode());
        runtime
    }

    /// Replace the stack with an empty one limited to `max_depth`
    ///
    /// This is a builder step: any frames already active are discarded.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        if !self.stack.is_empty() {
            tracing::warn!(
                depth = self.stack.depth(),
                "replacing stack limit discards active frames"
            );
        }
        self.stack = StackSimulator::with_max_depth(max_depth);
        self
    }

    pub fn with_tick_mode(mut self, mode: TickMode) -> Self {
        self.scheduler.set_mode(mode);
        self
    }

    // ── Synchronous calls ────────────────────────────────────────────────────

    /// Push a frame named `name`
    ///
    /// An overflow comes back with the trace as it stood when the push failed.
    pub fn enter(&mut self, name: &str) -> Result<(), RuntimeError> {
        self.stack
            .push(name)
            .map_err(|source| RuntimeError::stack(source, self.stack.snapshot()))
    }

    /// Pop the current frame
    pub fn leave(&mut self) -> Result<Frame, RuntimeError> {
        self.stack
            .pop()
            .map_err(|source| RuntimeError::stack(source, self.stack.snapshot()))
    }

    /// Pop frames until only `depth` remain
    pub fn unwind_to(&mut self, depth: usize) {
        while self.stack.depth() > depth {
            let _ = self.stack.pop();
        }
    }

    /// Run `body` inside a frame named `name`
    ///
    /// The frame is popped whether `body` succeeds or fails, so errors unwind
    /// the stack on their way up.
    pub fn call<T, F>(&mut self, name: &str, body: F) -> Result<T, RuntimeError>
    where
        F: FnOnce(&mut Runtime) -> Result<T, RuntimeError>,
    {
        let base = self.stack.depth();
        self.enter(name)?;
        let result = body(self);
        self.unwind_to(base);
        result
    }

    /// Build a thrown error carrying the current trace
    pub fn throw(&self, kind: ThrownKind, message: impl Into<String>) -> RuntimeError {
        RuntimeError::Thrown {
            kind,
            message: message.into(),
            trace: self.stack.snapshot(),
        }
    }

    // ── Console ──────────────────────────────────────────────────────────────

    pub fn log(&mut self, message: &str) {
        self.console.log(message);
    }

    pub fn error(&mut self, message: &str) {
        self.console.error(message);
    }

    // ── Deferred work ────────────────────────────────────────────────────────

    /// Queue `work` to run once the stack is empty
    pub fn defer<F>(&mut self, work: F) -> TaskId
    where
        F: FnOnce(&mut Runtime) -> Result<(), RuntimeError> + 'static,
    {
        self.scheduler.defer(work)
    }

    /// Queue `work` after `delay`; the delay never lets it preempt
    /// synchronous code or overtake earlier tasks
    pub fn set_timeout<F>(&mut self, delay: Duration, work: F) -> TaskId
    where
        F: FnOnce(&mut Runtime) -> Result<(), RuntimeError> + 'static,
    {
        self.scheduler.defer_labeled("setTimeout", delay, work)
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.scheduler.cancel(id)
    }

    /// One scheduler turn with this runtime as the task context
    ///
    /// A failing task is treated as uncaught: its frames are discarded, the
    /// global handler sees it, and the scheduler's observer is notified.
    ///
    /// Called from inside a running task this does nothing; the rest of the
    /// queue waits until that task has returned.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let Some(horizon) = self.scheduler.tick_horizon() else {
            return report;
        };
        while let Some(task) = self.scheduler.next_ready(&self.stack, horizon) {
            let outcome = task.run(self);
            report.record(&outcome);
            if let Err(error) = &outcome {
                self.stack.clear();
                self.dispatch_uncaught(&error.source);
            }
            self.scheduler.complete(outcome);
        }
        report
    }

    /// Tick until the queue is empty
    ///
    /// Stops early when frames are still active or a task is already
    /// running, since nothing could run.
    pub fn run_until_idle(&mut self) -> TickReport {
        let mut total = TickReport::default();
        while !self.scheduler.is_idle() {
            if !self.stack.is_empty() {
                tracing::warn!(
                    depth = self.stack.depth(),
                    pending = self.scheduler.pending(),
                    "call stack not empty; deferred tasks cannot run"
                );
                break;
            }
            let report = self.tick();
            if report.is_empty() {
                tracing::debug!(
                    running = ?self.scheduler.running(),
                    pending = self.scheduler.pending(),
                    "task in progress; leaving queue for later"
                );
                break;
            }
            total.ran += report.ran;
            total.failed += report.failed;
        }
        total
    }

    /// Run top-level synchronous code, then drain the task queue
    ///
    /// An error escaping `body` goes to the global handler; queued tasks
    /// still run afterwards.
    pub fn run_script<F>(&mut self, body: F) -> ScriptReport
    where
        F: FnOnce(&mut Runtime) -> Result<(), RuntimeError>,
    {
        let error = self.call(MAIN_FRAME, body).err();
        if let Some(error) = &error {
            self.dispatch_uncaught(error);
        }
        ScriptReport {
            error,
            tasks: self.run_until_idle(),
        }
    }

    /// Install the global handler for uncaught errors
    pub fn on_uncaught<F>(&mut self, handler: F)
    where
        F: FnMut(&RuntimeError, &mut dyn Console) + 'static,
    {
        self.uncaught = Box::new(handler);
    }

    fn dispatch_uncaught(&mut self, error: &RuntimeError) {
        (self.uncaught)(error, self.console.as_mut());
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn stack(&self) -> &StackSimulator {
        &self.stack
    }

    pub fn scheduler(&self) -> &TaskScheduler<Runtime> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut TaskScheduler<Runtime> {
        &mut self.scheduler
    }

    pub fn console_mut(&mut self) -> &mut dyn Console {
        self.console.as_mut()
    }
}

impl ExecutionContext for Runtime {
    fn stack(&self) -> &StackSimulator {
        &self.stack
    }

    fn stack_mut(&mut self) -> &mut StackSimulator {
        &mut self.stack
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("stack", &self.stack)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

fn print_uncaught(error: &RuntimeError, console: &mut dyn Console) {
    console.error(&format!("Uncaught {}", error.report()));
}
