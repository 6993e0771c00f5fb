//! Console sinks
//!
//! Simulated code never prints directly; it writes through a [`Console`]
//! supplied by the host.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Destination for `console.log` / `console.error` style output
pub trait Console {
    fn log(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Severity of a console line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Error,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleLevel::Log => write!(f, "log"),
            ConsoleLevel::Error => write!(f, "error"),
        }
    }
}

/// One recorded console line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub level: ConsoleLevel,
    pub message: String,
}

/// Console that records every line in memory
///
/// Clones share the same buffer, so a host can keep a handle while the
/// runtime owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsole {
    entries: Rc<RefCell<Vec<ConsoleEntry>>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ConsoleEntry> {
        self.entries.borrow().clone()
    }

    /// Messages in output order, without levels
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// All lines rendered as `level: message`, one per line
    pub fn transcript(&self) -> String {
        self.entries
            .borrow()
            .iter()
            .map(|entry| format!("{}: {}", entry.level, entry.message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn push(&self, level: ConsoleLevel, message: &str) {
        self.entries.borrow_mut().push(ConsoleEntry {
            level,
            message: message.to_string(),
        });
    }
}

impl Console for MemoryConsole {
    fn log(&mut self, message: &str) {
        self.push(ConsoleLevel::Log, message);
    }

    fn error(&mut self, message: &str) {
        self.push(ConsoleLevel::Error, message);
    }
}

/// Console that forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsole;

impl Console for TracingConsole {
    fn log(&mut self, message: &str) {
        tracing::info!(target: "stacksim::console", "{}", message);
    }

    fn error(&mut self, message: &str) {
        tracing::error!(target: "stacksim::console", "{}", message);
    }
}
