//! Error types for the call-stack simulator

use crate::scheduler::TaskId;
use crate::stack::StackTrace;
use std::fmt;
use thiserror::Error;

/// Failures raised directly by [`StackSimulator`](crate::stack::StackSimulator)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// Pushing would exceed the configured maximum depth
    #[error("Maximum call stack size exceeded (calling {name} at limit of {max_depth} frames)")]
    Overflow { name: String, max_depth: usize },
    /// Pop on an empty stack; always a caller bug
    #[error("Cannot pop from an empty call stack")]
    Empty,
}

/// Kind of a thrown error, mirroring the constructor name a console prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrownKind {
    Error,
    TypeError,
}

impl fmt::Display for ThrownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThrownKind::Error => write!(f, "Error"),
            ThrownKind::TypeError => write!(f, "TypeError"),
        }
    }
}

/// An error travelling up the simulated call chain
///
/// Every variant carries the trace captured at the moment of failure, so the
/// frames are still reportable after the chain has unwound.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// A stack failure (overflow or underflow)
    #[error("RangeError: {source}")]
    Stack {
        #[source]
        source: StackError,
        trace: StackTrace,
    },
    /// An error thrown by simulated user code
    #[error("{kind}: {message}")]
    Thrown {
        kind: ThrownKind,
        message: String,
        trace: StackTrace,
    },
}

impl RuntimeError {
    /// Wrap a stack failure together with the trace at failure time
    pub fn stack(source: StackError, trace: StackTrace) -> Self {
        RuntimeError::Stack { source, trace }
    }

    /// The trace captured when the error was raised
    pub fn trace(&self) -> &StackTrace {
        match self {
            RuntimeError::Stack { trace, .. } | RuntimeError::Thrown { trace, .. } => trace,
        }
    }

    /// The underlying stack failure, if this is one
    pub fn stack_error(&self) -> Option<&StackError> {
        match self {
            RuntimeError::Stack { source, .. } => Some(source),
            RuntimeError::Thrown { .. } => None,
        }
    }

    /// Check for [`StackError::Overflow`]
    pub fn is_overflow(&self) -> bool {
        matches!(self.stack_error(), Some(StackError::Overflow { .. }))
    }

    /// Render the error the way a console prints an uncaught error
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        for name in self.trace().iter() {
            out.push_str("\n    at ");
            out.push_str(name);
        }
        out
    }
}

impl From<StackError> for RuntimeError {
    /// Conversion for bare-stack callers; the trace is left empty
    fn from(source: StackError) -> Self {
        RuntimeError::Stack {
            source,
            trace: StackTrace::default(),
        }
    }
}

/// A deferred task that failed while the scheduler was draining
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} failed: {source}", describe(.id, .label.as_deref()))]
pub struct TaskError {
    pub id: TaskId,
    pub label: Option<String>,
    #[source]
    pub source: RuntimeError,
}

fn describe(id: &TaskId, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{} \"{}\"", id, label),
        None => id.to_string(),
    }
}
