//! Bounded LIFO call stack
//!
//! Each logical call pushes a [`Frame`] and pops it when the call completes.
//! Frames live in a flat arena rather than on the host stack, so exceeding the
//! limit is an ordinary [`StackError::Overflow`] instead of a host crash.
//!
//! ## Layout Example
//!
//! ```text
//! handleClick -> fetchUserData -> formatData
//!
//! index:  0             1               2
//!        [handleClick] [fetchUserData] [formatData]
//! depth:  1             2               3   <- top
//!
//! trace(): formatData, fetchUserData, handleClick
//! ```

use crate::error::StackError;
use serde::{Deserialize, Serialize};
use stacksim_config::Config;
use std::fmt;
use std::iter::{FusedIterator, Rev};
use std::slice;

pub use stacksim_config::DEFAULT_MAX_DEPTH;

/// One active, not-yet-completed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Function name (for traces and error messages)
    pub name: String,
    /// 1-based position from the bottom of the stack
    pub depth: usize,
}

/// LIFO sequence of frames with an enforced maximum size
#[derive(Debug, Clone)]
pub struct StackSimulator {
    frames: Vec<Frame>,
    max_depth: usize,
}

impl StackSimulator {
    /// Create an empty stack limited to [`DEFAULT_MAX_DEPTH`] frames
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Create an empty stack with a custom limit
    ///
    /// A limit of zero is clamped to one; a stack that can hold nothing
    /// cannot run any call at all.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Create an empty stack using the configured limit
    pub fn from_config(config: &Config) -> Self {
        Self::with_max_depth(config.max_depth())
    }

    /// Push a new frame on top
    ///
    /// Fails with [`StackError::Overflow`] when the stack is already full;
    /// the stack is left untouched in that case.
    pub fn push(&mut self, name: impl Into<String>) -> Result<(), StackError> {
        let name = name.into();
        if self.frames.len() >= self.max_depth {
            tracing::warn!(
                frame = %name,
                max_depth = self.max_depth,
                "call stack overflow"
            );
            return Err(StackError::Overflow {
                name,
                max_depth: self.max_depth,
            });
        }

        let depth = self.frames.len() + 1;
        tracing::trace!(frame = %name, depth, "push");
        self.frames.push(Frame { name, depth });
        Ok(())
    }

    /// Remove and return the top frame
    pub fn pop(&mut self) -> Result<Frame, StackError> {
        let frame = self.frames.pop().ok_or(StackError::Empty)?;
        tracing::trace!(frame = %frame.name, depth = frame.depth, "pop");
        Ok(frame)
    }

    /// Top frame, if any
    pub fn peek(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of active frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether the next push would overflow
    pub fn is_full(&self) -> bool {
        self.frames.len() >= self.max_depth
    }

    /// Get a frame by index (0 = innermost / most recent)
    pub fn frame_at(&self, index: usize) -> Option<&Frame> {
        let len = self.frames.len();
        if index < len {
            self.frames.get(len - 1 - index)
        } else {
            None
        }
    }

    /// Lazily list active frame names from top to bottom
    ///
    /// The iterator borrows the stack, so it always reflects a single
    /// consistent state. Clone it (or call `trace()` again) to restart.
    pub fn trace(&self) -> Trace<'_> {
        Trace {
            inner: self.frames.iter().rev(),
        }
    }

    /// Owned copy of [`trace`](Self::trace), for reporting after unwinding
    pub fn snapshot(&self) -> StackTrace {
        StackTrace {
            frames: self.trace().map(str::to_owned).collect(),
        }
    }

    /// Drop every active frame
    pub fn clear(&mut self) {
        if !self.frames.is_empty() {
            tracing::debug!(discarded = self.frames.len(), "unwinding call stack");
        }
        self.frames.clear();
    }
}

impl Default for StackSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-to-bottom iterator over active frame names
#[derive(Debug, Clone)]
pub struct Trace<'a> {
    inner: Rev<slice::Iter<'a, Frame>>,
}

impl<'a> Iterator for Trace<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|frame| frame.name.as_str())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Trace<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|frame| frame.name.as_str())
    }
}

impl ExactSizeIterator for Trace<'_> {}

impl FusedIterator for Trace<'_> {}

/// Owned stack trace, innermost frame first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackTrace {
    frames: Vec<String>,
}

impl StackTrace {
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.frames.iter().map(String::as_str)
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Innermost frame name
    pub fn top(&self) -> Option<&str> {
        self.frames.first().map(String::as_str)
    }
}

impl From<Vec<String>> for StackTrace {
    fn from(frames: Vec<String>) -> Self {
        Self { frames }
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.frames.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "    at {}", name)?;
        }
        Ok(())
    }
}
